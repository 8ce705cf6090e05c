use serde::Serialize;

/// Breakpoints tried in order when a chunk has to end before the text does.
/// A chunk ends right after the separator it was cut at.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChunkConfigError {
    #[error("chunk size must be positive")]
    ZeroSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// Maximum chunk length and overlap, both counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    size: usize,
    overlap: usize,
}

impl ChunkConfig {
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkConfigError> {
        if size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if overlap >= size {
            return Err(ChunkConfigError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub text: String,
    /// Character offset of the chunk's first character in the source text.
    pub source_index: usize,
}

/// Split `text` into chunks of at most `config.size()` characters.
///
/// Consecutive chunks share exactly `config.overlap()` characters of source
/// text and together cover all of it. Each non-final chunk ends at the last
/// paragraph break in its window, falling back to a line break, a sentence
/// end, whitespace and finally a hard cut.
///
/// Text no longer than the chunk size, including the empty string, comes back
/// as a single chunk.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Vec<DocumentChunk> {
    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        if char_len - start <= config.size {
            chunks.push(DocumentChunk {
                text: text[bounds[start]..].to_string(),
                source_index: start,
            });
            break;
        }

        let end = find_break(text, &bounds, start, config);
        chunks.push(DocumentChunk {
            text: text[bounds[start]..bounds[end]].to_string(),
            source_index: start,
        });
        start = end - config.overlap;
    }

    chunks
}

/// Pick the end (exclusive, in chars) of the chunk starting at `start`.
///
/// The end must leave the next chunk starting strictly after `start`, so any
/// breakpoint at or before `start + overlap` is ignored.
fn find_break(text: &str, bounds: &[usize], start: usize, config: &ChunkConfig) -> usize {
    let window_end = start + config.size;
    let min_end = start + config.overlap + 1;
    let window = &text[bounds[start]..bounds[window_end]];

    for sep in SEPARATORS {
        let Some(pos) = window.rfind(sep) else {
            continue;
        };
        let byte_end = bounds[start] + pos + sep.len();
        // Separators are ASCII, so the cut always lands on a char boundary.
        if let Ok(end) = bounds.binary_search(&byte_end) {
            if end >= min_end {
                return end;
            }
        }
    }

    window_end
}
