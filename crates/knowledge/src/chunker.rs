//! Text chunking with configurable size and overlap.
//!
//! Lengths are counted in Unicode scalar values, never bytes. Each cut is
//! placed at the strongest boundary found in the second half of the window:
//! paragraph break, then line break, then sentence boundary, then word
//! boundary, then a hard cut at the window edge. The next chunk starts
//! exactly `overlap` characters before the cut, so dropping the first
//! `overlap` characters of every chunk after the first and concatenating
//! gives back the input.

use crate::types::{Chunk, Document};
use dossier_core::config::RagSettings;
use dossier_core::{AppError, AppResult};
use unicode_segmentation::UnicodeSegmentation;

/// Chunk size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    max_chars: usize,
    overlap: usize,
}

impl ChunkConfig {
    /// Requires `max_chars > 0` and `overlap < max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> AppResult<Self> {
        if max_chars == 0 {
            return Err(AppError::Config("Chunk size must be positive".to_string()));
        }
        if overlap >= max_chars {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, max_chars
            )));
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn from_settings(settings: &RagSettings) -> AppResult<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// Split `text` into overlapping chunks. Empty input yields no chunks.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every char index, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        if total - start <= config.max_chars {
            chunks.push(text[offsets[start]..].to_string());
            break;
        }

        let upper = start + config.max_chars;
        // Cuts at or below `lower` would stall progress or leave a short chunk.
        let lower = start + (config.max_chars / 2).max(config.overlap);
        let end = find_cut(text, &chars, &offsets, start, lower, upper);

        chunks.push(text[offsets[start]..offsets[end]].to_string());
        start = end - config.overlap;
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        total,
        chunks.len(),
        config.max_chars,
        config.overlap
    );

    chunks
}

/// Best cut position in `(lower, upper]`, as a char index.
fn find_cut(
    text: &str,
    chars: &[char],
    offsets: &[usize],
    start: usize,
    lower: usize,
    upper: usize,
) -> usize {
    let candidates = || (lower + 1..=upper).rev();

    if let Some(p) = candidates().find(|&p| p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n') {
        return p;
    }

    if let Some(p) = candidates().find(|&p| chars[p - 1] == '\n') {
        return p;
    }

    let base = offsets[start];
    let window = &text[base..offsets[upper]];
    let to_char_index = |byte: usize| offsets.binary_search(&(base + byte)).ok();
    let in_range = |p: &usize| *p > lower && *p <= upper;

    let sentence = window
        .split_sentence_bound_indices()
        .filter_map(|(byte, _)| to_char_index(byte))
        .filter(in_range)
        .max();
    if let Some(p) = sentence {
        return p;
    }

    let word = window
        .split_word_bound_indices()
        .filter_map(|(byte, _)| to_char_index(byte))
        .filter(in_range)
        .max();

    word.unwrap_or(upper)
}

/// Chunk every document, tagging each chunk with its document's source.
///
/// Whitespace-only chunks are dropped.
pub fn chunk_documents(documents: &[Document], config: &ChunkConfig) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| {
            split_text(&doc.content, config)
                .into_iter()
                .filter(|piece| !piece.trim().is_empty())
                .map(move |content| Chunk {
                    content,
                    source: doc.source.clone(),
                })
        })
        .collect()
}
