use crate::keywords::KeywordExtractor;
use crate::options::ChunkingOptions;
use crate::strategy::{ChunkDraft, Chunker};
use hybridrag_core::{ChunkMetadata, ChunkType, Document, Metadata, RagResult};
use std::ops::Range;
use std::sync::Arc;

/// Size-based splitter with boundary-aware cuts and fixed overlap.
///
/// Every chunk is at most `chunk_size` characters. When a cut would land
/// inside a word, the splitter moves it back to the nearest sentence or
/// whitespace boundary within `boundary_window` characters, and only cuts hard
/// if there is none. Each chunk after the first starts exactly `chunk_overlap` characters
/// before the previous chunk's end, so dropping the first `chunk_overlap`
/// characters of every chunk but the first and concatenating reconstructs the
/// input.
#[derive(Debug, Clone)]
pub struct GenericSplitter {
    options: ChunkingOptions,
    keywords: Arc<KeywordExtractor>,
}

impl GenericSplitter {
    /// Create a splitter. Degenerate options are rejected.
    pub fn new(options: ChunkingOptions, keywords: Arc<KeywordExtractor>) -> RagResult<Self> {
        options.validate()?;
        Ok(Self { options, keywords })
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    /// Byte ranges of the chunks `text` splits into.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        if n == 0 {
            return Vec::new();
        }
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let size = self.options.chunk_size.max(1);
        // Clamped again here so that forward progress never depends on validation.
        let overlap = self.options.chunk_overlap.min(size - 1);

        let mut spans = Vec::new();
        let mut start = 0;
        loop {
            let mut end = (start + size).min(n);
            if end < n {
                end = self.boundary_before(&chars, start + overlap, end);
            }
            spans.push(offsets[start]..offsets[end]);
            if end >= n {
                break;
            }
            // end > start + overlap, so the next start moves forward.
            start = end - overlap;
        }
        spans
    }

    /// The pieces of `text`, in order.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text)
            .into_iter()
            .map(|span| &text[span])
            .collect()
    }

    /// Pick the cut position for a chunk ending at `end`.
    ///
    /// Candidates must stay above `floor` so the following chunk still starts
    /// after the current one.
    fn boundary_before(&self, chars: &[char], floor: usize, end: usize) -> usize {
        if !splits_word(chars, end) {
            return end;
        }
        let lowest = end
            .saturating_sub(self.options.boundary_window)
            .max(floor + 1);
        if lowest >= end {
            return end;
        }

        // Sentence ends are followed by whitespace or a newline, so the first
        // non-splitting position from the right is the nearest boundary.
        (lowest..end)
            .rev()
            .find(|&p| !splits_word(chars, p))
            .unwrap_or(end)
    }
}

impl Chunker for GenericSplitter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn segment(&self, document: &Document, _metadata: &Metadata) -> RagResult<Vec<ChunkDraft>> {
        Ok(self
            .split_text(&document.content)
            .into_iter()
            .map(|piece| {
                let mut meta = ChunkMetadata::new(ChunkType::Text);
                meta.keywords = self.keywords.extract(piece);
                ChunkDraft::new(piece, meta)
            })
            .collect())
    }
}

/// Cutting before `chars[pos]` would separate two non-whitespace characters.
fn splits_word(chars: &[char], pos: usize) -> bool {
    pos > 0 && pos < chars.len() && !chars[pos - 1].is_whitespace() && !chars[pos].is_whitespace()
}
