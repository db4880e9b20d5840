//! Chunked rendering with cooperative cancellation
//!
//! Long documents render in sentence-aligned chunks so a caller can bail
//! out between them. The token is only consulted at chunk boundaries: an
//! in-flight chunk always finishes, no further chunk starts.

use crate::renderer::PageRenderer;
use scrawl_core::error::{RenderError, Result};
use scrawl_core::traits::PageRender;
use scrawl_core::types::BitmapData;
use scrawl_core::RenderConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Target characters per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Texts shorter than this render in a single pass
pub const DEFAULT_PRIORITY_THRESHOLD: usize = 1000;
/// Pause between chunks, letting other work interleave
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(25);

/// Shared cancellation flag, cloneable across threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Arm the token for a fresh render.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Split `text` into chunks of roughly `chunk_size` characters.
///
/// Boundaries prefer sentence ends; a sentence longer than a chunk splits
/// at word boundaries instead. Words never split, so a chunk can exceed
/// the target by one word. Concatenating the chunks restores the text.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    fn push_piece(
        chunk_size: usize,
        piece: &str,
        chunks: &mut Vec<String>,
        current: &mut String,
        current_len: &mut usize,
    ) {
        let piece_len = piece.chars().count();
        if *current_len > 0 && *current_len + piece_len > chunk_size {
            chunks.push(std::mem::take(current));
            *current_len = 0;
        }
        current.push_str(piece);
        *current_len += piece_len;
    }

    for sentence in sentences(text) {
        if sentence.chars().count() <= chunk_size {
            push_piece(chunk_size, sentence, &mut chunks, &mut current, &mut current_len);
        } else {
            // Oversized sentence: fall back to word boundaries, keeping
            // the whitespace between words verbatim
            for word_run in word_runs(sentence) {
                push_piece(chunk_size, word_run, &mut chunks, &mut current, &mut current_len);
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split at sentence terminators, keeping the terminator and trailing
/// whitespace with the sentence.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        if matches!(chars[i].1, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            let end = chars.get(j).map_or(text.len(), |&(idx, _)| idx);
            out.push(&text[start..end]);
            start = end;
            i = j;
        } else {
            i += 1;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// A word plus its trailing whitespace, preserved verbatim.
fn word_runs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < chars.len() {
        // Advance through the word, then through its trailing whitespace
        while i < chars.len() && !chars[i].1.is_whitespace() {
            i += 1;
        }
        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }
        let end = chars.get(i).map_or(text.len(), |&(idx, _)| idx);
        out.push(&text[start..end]);
        start = end;
    }
    out
}

/// Draws a page chunk by chunk, checking for cancellation in between
pub struct ProgressiveRenderer<'a> {
    inner: PageRenderer<'a>,
    chunk_size: usize,
    priority_threshold: usize,
    chunk_delay: Duration,
    token: CancelToken,
    chunks_rendered: usize,
}

impl<'a> ProgressiveRenderer<'a> {
    pub fn new(inner: PageRenderer<'a>) -> Self {
        Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
            priority_threshold: DEFAULT_PRIORITY_THRESHOLD,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            token: CancelToken::new(),
            chunks_rendered: 0,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_priority_threshold(mut self, threshold: usize) -> Self {
        self.priority_threshold = threshold;
        self
    }

    /// Zero disables the pause entirely.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// A handle the caller can keep to cancel this renderer from
    /// anywhere, including another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// How many chunks the last render completed. Zero after a
    /// single-pass render.
    pub fn chunks_rendered(&self) -> usize {
        self.chunks_rendered
    }
}

impl PageRender for ProgressiveRenderer<'_> {
    fn name(&self) -> &'static str {
        "progressive"
    }

    fn render(&mut self, config: &RenderConfig) -> Result<BitmapData> {
        let config = config.sanitized();
        self.chunks_rendered = 0;

        if self.token.is_cancelled() {
            return Err(RenderError::Cancelled { chunks_done: 0 }.into());
        }

        // Short texts skip the chunk machinery entirely
        if config.text.chars().count() < self.priority_threshold {
            return self.inner.render(&config);
        }

        let mut canvas = self.inner.begin(&config, None)?;
        let chunks = chunk_text(&config.text, self.chunk_size);
        let total = chunks.len();
        for chunk in chunks {
            if self.token.is_cancelled() {
                log::info!(
                    "render cancelled after {}/{} chunks, returning partial page",
                    self.chunks_rendered,
                    total
                );
                break;
            }
            self.inner.draw_block(&mut canvas, &chunk);
            self.chunks_rendered += 1;
            if !self.chunk_delay.is_zero() && self.chunks_rendered < total {
                std::thread::sleep(self.chunk_delay);
            }
        }
        let (bitmap, _) = self.inner.finish(canvas);
        Ok(bitmap)
    }
}
