//! Line-preserving text chunker.
//!
//! Splits text into segments of at most `max_size` characters without ever
//! breaking a line. A single line longer than `max_size` becomes its own
//! oversized chunk.

/// Default chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// A bounded slice of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk text, trimmed at its boundaries.
    pub text: String,
    /// 0-based position of this chunk.
    pub index: usize,
    /// Total number of chunks in the sequence.
    pub total: usize,
}

impl Chunk {
    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into chunks of at most `max_size` characters.
pub fn chunk(text: &str, max_size: usize) -> Vec<Chunk> {
    let max_size = max_size.max(1);
    let mut pieces: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for line in text.lines() {
        let line_chars = line.chars().count();
        let joined = if buffer.is_empty() {
            line_chars
        } else {
            buffer_chars + 1 + line_chars
        };

        if joined > max_size && !buffer.is_empty() {
            flush(&mut pieces, &mut buffer);
            buffer.push_str(line);
            buffer_chars = line_chars;
            continue;
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(line);
        buffer_chars = joined;
    }
    flush(&mut pieces, &mut buffer);

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk { text, index, total })
        .collect()
}

fn flush(pieces: &mut Vec<String>, buffer: &mut String) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
    buffer.clear();
}
