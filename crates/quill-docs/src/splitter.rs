//! Fixed-window text splitter with overlap.

use quill_core::error::QuillError;

/// Cuts text into windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
///
/// Windows are measured in `char`s, so multi-byte text is never split inside
/// a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, QuillError> {
        if chunk_size == 0 {
            return Err(QuillError::Config("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(QuillError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into `(start_offset, window)` pairs.
    ///
    /// The last window is the first one that reaches the end of the text and
    /// may be shorter than `chunk_size`. Empty text yields nothing.
    pub fn split(&self, text: &str) -> Vec<(usize, String)> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let stride = self.chunk_size - self.chunk_overlap;

        let mut segments = Vec::with_capacity(len / stride + 1);
        let mut start = 0;
        while start < len {
            let end = (start + self.chunk_size).min(len);
            segments.push((start, chars[start..end].iter().collect()));
            if end == len {
                break;
            }
            start += stride;
        }
        segments
    }
}
