use crate::error::IngestError;
use crate::models::{Chunk, IngestionOptions};

/// Boundary separators tried in priority order when a window would cut
/// mid-document: paragraph break, line break, then sentence-ending
/// punctuation followed by a space.
const BOUNDARIES: [&[char]; 5] = [
    &['\n', '\n'],
    &['\n'],
    &['.', ' '],
    &['?', ' '],
    &['!', ' '],
];

/// Validated chunking parameters. `overlap` must be strictly smaller than
/// `chunk_size`, which must be positive.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let options = IngestionOptions::default();
        Self {
            chunk_size: options.chunk_size,
            overlap: options.overlap,
        }
    }
}

impl TryFrom<IngestionOptions> for ChunkingConfig {
    type Error = IngestError;

    fn try_from(value: IngestionOptions) -> Result<Self, IngestError> {
        Self::new(value.chunk_size, value.overlap)
    }
}

/// Raw pre-strip window offsets over `chars`, half-open `[start, end)` in
/// char-offset space.
///
/// Each window is at most `chunk_size` chars. When the naive cut falls
/// before the end of the document, the end moves back to the nearest
/// acceptable boundary, but only if that boundary sits past the midpoint
/// of `chunk_size`; otherwise the raw cut stands. The next window starts
/// `overlap` chars before the previous end, clamped so the start offset
/// strictly increases, which makes termination immediate: every iteration
/// consumes at least one char, and the loop stops when a window reaches
/// the end of the document.
pub fn chunk_spans(chars: &[char], config: &ChunkingConfig) -> Vec<(usize, usize)> {
    let total = chars.len();
    let mut spans = Vec::new();
    let mut start = 0usize;

    while start < total {
        let naive_end = (start + config.chunk_size).min(total);
        let end = if naive_end < total {
            match boundary_cut(&chars[start..naive_end], config.chunk_size) {
                Some(adjusted) => start + adjusted,
                None => naive_end,
            }
        } else {
            naive_end
        };

        spans.push((start, end));

        if end == total {
            break;
        }
        start = end.saturating_sub(config.overlap).max(start + 1);
    }

    spans
}

/// Position just past the best boundary inside `window`, or `None` when no
/// separator lands at or after the window midpoint.
fn boundary_cut(window: &[char], chunk_size: usize) -> Option<usize> {
    let midpoint = chunk_size / 2;
    for separator in BOUNDARIES {
        if let Some(position) = rfind_chars(window, separator) {
            if position > midpoint {
                return Some(position + separator.len());
            }
        }
    }
    None
}

fn rfind_chars(window: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > window.len() {
        return None;
    }
    (0..=window.len() - needle.len())
        .rev()
        .find(|&index| &window[index..index + needle.len()] == needle)
}

/// Split `text` into overlapping, boundary-aware chunks. Each chunk is
/// stripped of surrounding whitespace; chunks that strip to nothing are
/// dropped. Empty or whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chunk_spans(&chars, config)
        .into_iter()
        .filter_map(|(start, end)| {
            let piece: String = chars[start..end].iter().collect();
            let stripped = piece.trim();
            if stripped.is_empty() {
                None
            } else {
                Some(stripped.to_string())
            }
        })
        .collect()
}

/// Chunk one document and assign contiguous zero-based indices in
/// document order.
pub fn chunk_document(source_id: &str, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    chunk_text(text, config)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            source_id: source_id.to_string(),
            index,
            text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig::new(chunk_size, overlap).expect("valid config")
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 150).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 99).is_ok());
    }

    #[test]
    fn empty_and_whitespace_input_yield_no_chunks() {
        let config = config(20, 5);
        assert!(chunk_text("", &config).is_empty());
        assert!(chunk_text("   \n\n  \t ", &config).is_empty());
    }

    #[test]
    fn short_text_is_a_single_stripped_chunk() {
        let config = config(500, 100);
        let chunks = chunk_text("  hello world \n", &config);
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn paragraph_example_respects_size_and_order() {
        let text = "Paragraph one.\n\nParagraph two.\n\nParagraph three.";
        let chunks = chunk_text(text, &config(20, 5));

        assert_eq!(
            chunks,
            vec![
                "Paragraph one.".to_string(),
                "ne.\n\nParagraph two.".to_string(),
                "two.\n\nParagraph thre".to_string(),
                "three.".to_string(),
            ]
        );
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
            assert_eq!(chunk, chunk.trim());
        }
    }

    #[test]
    fn spans_cover_the_input_with_no_gaps() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. \
                    How vexingly quick daft zebras jump! \
                    Sphinx of black quartz, judge my vow.";
        let chars: Vec<char> = text.chars().collect();
        let config = config(40, 10);
        let spans = chunk_spans(&chars, &config);

        assert_eq!(spans.first().map(|span| span.0), Some(0));
        assert_eq!(spans.last().map(|span| span.1), Some(chars.len()));
        for pair in spans.windows(2) {
            // next window starts at or before the previous end and after
            // the previous start
            assert!(pair[1].0 <= pair[0].1);
            assert!(pair[1].0 > pair[0].0);
        }
        for (start, end) in spans {
            assert!(end > start);
            assert!(end - start <= 40);
        }
    }

    #[test]
    fn boundary_before_midpoint_keeps_the_raw_cut() {
        // the only line break sits at offset 2, well before the midpoint,
        // so the window must cut at chunk_size exactly
        let text = "ab\ncdefghijklmnopqrstuvwxyz0123456789";
        let chars: Vec<char> = text.chars().collect();
        let spans = chunk_spans(&chars, &config(20, 5));
        assert_eq!(spans[0], (0, 20));
    }

    #[test]
    fn sentence_boundary_is_preferred_past_the_midpoint() {
        let text = "One sentence here. Another sentence that keeps going on.";
        let chars: Vec<char> = text.chars().collect();
        let spans = chunk_spans(&chars, &config(30, 5));
        // ". " ends at offset 19, past the midpoint of 15
        assert_eq!(spans[0], (0, 19));
    }

    #[test]
    fn multibyte_text_never_splits_a_code_point() {
        let text = "héllo wörld çafé ".repeat(40);
        let chunks = chunk_text(&text, &config(50, 10));
        assert!(!chunks.is_empty());
        for chunk in chunks {
            assert!(chunk.chars().count() <= 50);
        }
    }

    #[test]
    fn document_chunks_have_contiguous_indices() {
        let text = "First paragraph of the handbook.\n\n\
                    Second paragraph with more detail.\n\n\
                    Third paragraph wrapping things up.";
        let chunks = chunk_document("handbook.txt", text, &config(40, 10));

        assert!(!chunks.is_empty());
        for (position, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, position);
            assert_eq!(chunk.source_id, "handbook.txt");
            assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn trailing_remainder_becomes_the_final_chunk() {
        let text = "a".repeat(500) + " tail";
        let chunks = chunk_text(&text, &config(500, 100));
        assert_eq!(chunks.len(), 2);
        // the final window re-covers the overlap region plus the remainder
        assert_eq!(chunks[1].chars().count(), 105);
        assert!(chunks[1].ends_with(" tail"));
    }
}
