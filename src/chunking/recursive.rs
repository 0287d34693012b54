//! Recursive character splitting.
//!
//! Splits text into bounded, overlapping segments, preferring paragraph
//! boundaries, then lines, then words, before falling back to raw character
//! cuts.

use super::Chunk;
use crate::error::{Result, SvarError};
use crate::source::FaqEntry;
use std::collections::VecDeque;

/// Separators tried in order of preference.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Recursive character splitter.
///
/// Deterministic and pure. Every produced segment is at most `chunk_size`
/// characters (absent nothing-to-split degenerate input), and consecutive
/// segments of one source text share roughly `chunk_overlap` characters of
/// trailing/leading context. Lengths and cuts are measured in `char`s, so
/// multibyte text never splits inside a codepoint.
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// Create a splitter with the given chunk size and overlap.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(SvarError::Config("chunk_size must be positive".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(SvarError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split each entry's `question + "\n" + answer` text into chunks.
    ///
    /// Each chunk carries its source question; `order` is the global
    /// insertion order used downstream for deterministic tie-breaking.
    pub fn split_entries(&self, entries: &[FaqEntry]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for entry in entries {
            for text in self.split_text(&entry.indexable_text()) {
                chunks.push(Chunk::new(text, entry.question.clone(), chunks.len()));
            }
        }
        chunks
    }

    /// Split a single text into overlapping segments.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        match separators.iter().position(|sep| text.contains(sep)) {
            Some(i) => {
                let pieces = split_keeping_separator(text, separators[i]);
                self.merge_pieces(pieces, &separators[i + 1..])
            }
            None => self.split_chars(text),
        }
    }

    /// Greedily pack pieces into chunks up to `chunk_size`, retaining a tail
    /// of whole pieces totalling at most `chunk_overlap` characters as the
    /// start of the next chunk. Pieces longer than `chunk_size` are split
    /// recursively with the remaining separators.
    fn merge_pieces(&self, pieces: Vec<&str>, rest: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut window_len = 0;

        for piece in pieces {
            let piece_len = char_len(piece);

            if piece_len > self.chunk_size {
                if !window.is_empty() {
                    chunks.push(join(&window));
                    window.clear();
                    window_len = 0;
                }
                chunks.extend(self.split_with(piece, rest));
                continue;
            }

            if window_len + piece_len > self.chunk_size && !window.is_empty() {
                chunks.push(join(&window));

                while window_len > self.chunk_overlap
                    || (window_len + piece_len > self.chunk_size && window_len > 0)
                {
                    if let Some(front) = window.pop_front() {
                        window_len -= char_len(front);
                    }
                }
            }

            window.push_back(piece);
            window_len += piece_len;
        }

        if !window.is_empty() {
            chunks.push(join(&window));
        }

        chunks
    }

    /// Raw character windows, the fallback when no separator applies.
    fn split_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut out = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        out
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(window: &VecDeque<&str>) -> String {
    window.iter().copied().collect()
}

/// Split on a separator, keeping the separator attached to the preceding
/// piece so that concatenating the pieces reproduces the input exactly.
fn split_keeping_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (idx, m) in text.match_indices(sep) {
        let end = idx + m.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> RecursiveSplitter {
        RecursiveSplitter::new(100, 20).unwrap()
    }

    /// Undo the overlap: drop each chunk's longest prefix that is a suffix of
    /// the previous chunk, then concatenate.
    fn reconstruct(chunks: &[String]) -> String {
        let mut out = String::new();
        for chunk in chunks {
            let chunk_chars: Vec<char> = chunk.chars().collect();
            let mut trim = 0;
            for j in (1..=chunk_chars.len()).rev() {
                let prefix: String = chunk_chars[..j].iter().collect();
                if out.ends_with(&prefix) {
                    trim = j;
                    break;
                }
            }
            out.extend(chunk_chars[trim..].iter());
        }
        out
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = splitter().split_text("What is Strapi?\nA headless CMS.");
        assert_eq!(chunks, vec!["What is Strapi?\nA headless CMS.".to_string()]);
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        assert!(RecursiveSplitter::new(100, 100).is_err());
        assert!(RecursiveSplitter::new(0, 0).is_err());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = "word ".repeat(100);
        let chunks = splitter().split_text(text.trim_end());
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "oversized chunk: {:?}", chunk);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        // Distinct 5-char words, so the retained tail is exactly 20 chars
        // and reconstruction is unambiguous.
        let text: String = (0..100).map(|i| format!("w{:03} ", i)).collect();
        let chunks = splitter().split_text(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let head: String = pair[1].chars().take(20).collect();
            assert!(pair[0].ends_with(&head), "no shared overlap: {:?} / {:?}", pair[0], pair[1]);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_reconstruction_across_separator_levels() {
        let lines: Vec<String> = (0..12)
            .map(|i| format!("line number {:02} with a few extra words", i))
            .collect();
        let text = format!(
            "{}\n\n{}",
            "First paragraph with a fair amount of text that runs past the chunk size limit and keeps going on.",
            lines.join("\n")
        );
        let chunks = splitter().split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_unsplittable_token_falls_back_to_chars() {
        // One 250-char token with no separators anywhere.
        let text: String = (0..125).map(|i| format!("{:02}", i % 100)).collect();
        let chunks = splitter().split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_multibyte_text_never_splits_codepoints() {
        let text: String = (0..20).map(|i| format!("blåbær{:02}syltetøy ", i)).collect();
        let chunks = splitter().split_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_split_entries_at_least_one_chunk_each() {
        let entries = vec![
            FaqEntry::new("What is Strapi?", "A headless CMS."),
            FaqEntry::new(
                "How do I deploy?",
                "You can deploy Strapi on any platform that runs Node, including most cloud \
                 providers, container platforms, and plain virtual machines with a process manager.",
            ),
        ];
        let chunks = splitter().split_entries(&entries);
        assert!(chunks.len() >= entries.len());
        assert_eq!(chunks[0].question, "What is Strapi?");
        // Order is the global insertion order.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
    }
}
