//! Splitting raw text into bounded pages
//!
//! Pages are cut on word boundaries only, and whitespace is carried
//! verbatim: concatenating the resulting pages reproduces the original
//! text exactly, up to the truncation point. The splitter never trims,
//! merges, or normalizes anything.

/// Options for [`split_into_pages`]
#[derive(Debug, Clone, Copy)]
pub struct PageSplitOptions {
    pub words_per_page: usize,
    pub max_pages: usize,
    /// Stop at `max_pages` and report what was dropped
    pub truncate: bool,
}

impl Default for PageSplitOptions {
    fn default() -> Self {
        Self {
            words_per_page: 250,
            max_pages: 10,
            truncate: true,
        }
    }
}

/// The result of splitting a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSplit {
    pub pages: Vec<String>,
    pub total_pages: usize,
    /// The effective limit after sanitizing the requested one
    pub words_per_page: usize,
    pub max_pages_reached: bool,
    pub truncated: bool,
    /// Count of actual words (not tokens) dropped by truncation
    pub remaining_words: Option<usize>,
}

/// Alternating word / whitespace-run tokens, each a verbatim slice.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace = None;
    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match in_whitespace {
            None => in_whitespace = Some(ws),
            Some(prev) if prev != ws => {
                tokens.push(&text[start..i]);
                start = i;
                in_whitespace = Some(ws);
            },
            _ => {},
        }
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn is_word(token: &str) -> bool {
    !token.chars().next().is_some_and(char::is_whitespace)
}

/// Split `text` into pages of at most `words_per_page` words.
///
/// The word counter only advances on non-whitespace tokens; a page is
/// flushed the moment the counter hits the limit. With `truncate` set,
/// splitting stops once `max_pages` pages exist and the number of dropped
/// words is reported.
pub fn split_into_pages(text: &str, opts: &PageSplitOptions) -> PageSplit {
    let words_per_page = opts.words_per_page.max(1);
    let max_pages = opts.max_pages.max(1);

    let tokens = tokenize(text);
    let mut pages: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut words_in_page = 0usize;
    let mut truncated = false;
    let mut remaining_words = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let token = tokens[idx];
        buffer.push_str(token);
        if is_word(token) {
            words_in_page += 1;
            if words_in_page >= words_per_page && !buffer.is_empty() {
                pages.push(std::mem::take(&mut buffer));
                words_in_page = 0;
                if opts.truncate && pages.len() >= max_pages {
                    let dropped = tokens[idx + 1..].iter().filter(|t| is_word(t)).count();
                    if idx + 1 < tokens.len() {
                        truncated = true;
                        remaining_words = Some(dropped);
                        log::debug!("page limit hit, {dropped} words truncated");
                    }
                    break;
                }
            }
        }
        idx += 1;
    }

    if !truncated && !buffer.is_empty() {
        pages.push(buffer);
    }

    let total_pages = pages.len();
    PageSplit {
        max_pages_reached: total_pages >= max_pages,
        pages,
        total_pages,
        words_per_page,
        truncated,
        remaining_words,
    }
}

/// How many pages `text` would need, without building them.
pub fn estimate_page_count(text: &str, words_per_page: usize) -> usize {
    let words_per_page = words_per_page.max(1);
    let words = text.split_whitespace().count();
    words.div_ceil(words_per_page)
}
