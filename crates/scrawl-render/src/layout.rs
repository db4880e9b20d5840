//! Greedy paragraph-aware line wrapping against measured advances

use scrawl_core::FontFace;

/// Width of one character in pixels at `size`, with an estimate for
/// characters the font lacks.
pub fn char_width(face: &dyn FontFace, ch: char, size: f32) -> f32 {
    match face.glyph_id(ch) {
        Some(gid) => face.advance_width(gid, size),
        None => size * 0.5,
    }
}

pub fn text_width(face: &dyn FontFace, text: &str, size: f32) -> f32 {
    text.chars().map(|ch| char_width(face, ch, size)).sum()
}

/// Wrap `text` into lines no wider than `max_width` pixels.
///
/// Paragraph breaks (`\n`) are honored and blank lines survive as empty
/// entries. Words never break mid-word; a word wider than the line gets a
/// line of its own and overflows to the right.
pub fn wrap_text(text: &str, face: &dyn FontFace, size: f32, max_width: f32) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let space_width = char_width(face, ' ', size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0f32;
        for word in paragraph.split_whitespace() {
            let word_width = text_width(face, word, size);
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + space_width + word_width
            };
            if !current.is_empty() && needed > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            if current.is_empty() {
                current.push_str(word);
                current_width = word_width;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_width + word_width;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-advance face for predictable wrapping
    struct MonoFace;

    impl FontFace for MonoFace {
        fn family(&self) -> &str {
            "mono-test"
        }

        fn data(&self) -> &[u8] {
            &[]
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, ch: char) -> Option<u32> {
            Some(ch as u32)
        }

        fn advance_width(&self, _glyph_id: u32, size: f32) -> f32 {
            size * 0.5
        }
    }

    #[test]
    fn wraps_at_word_boundaries() {
        // 10px per char at size 20; 65px fits six characters
        let lines = wrap_text("one two three", &MonoFace, 20.0, 65.0);
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn fills_lines_greedily() {
        let lines = wrap_text("a b c d", &MonoFace, 20.0, 70.0);
        assert_eq!(lines, vec!["a b c d"]);
    }

    #[test]
    fn paragraph_breaks_survive() {
        let lines = wrap_text("alpha\n\nbeta", &MonoFace, 20.0, 1000.0);
        assert_eq!(lines, vec!["alpha", "", "beta"]);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap_text("hi incomprehensibilities no", &MonoFace, 20.0, 80.0);
        assert_eq!(
            lines,
            vec!["hi", "incomprehensibilities", "no"]
        );
    }

    #[test]
    fn empty_text_yields_no_lines() {
        assert!(wrap_text("", &MonoFace, 20.0, 100.0).is_empty());
    }
}
