use crate::generic::GenericSplitter;
use crate::keywords::KeywordExtractor;
use crate::options::{ChunkingOptions, StructureRules};
use crate::patterns::{AtomicUnit, StructurePatterns};
use crate::strategy::{ChunkDraft, Chunker};
use hybridrag_core::{ChunkMetadata, ChunkType, Document, Metadata, RagResult};
use std::ops::Range;
use std::sync::Arc;
use tracing::debug;

/// Title used for priority lookup of text preceding the first header.
const INTRODUCTION: &str = "introduction";

/// Header-aware splitter that keeps Q&A pairs and timeline entries whole.
///
/// The document is cut into sections at header lines; text before the first
/// header forms the introduction. Inside every section, atomic units are
/// emitted as single chunks no matter how long they are, and the text around
/// them is emitted as section chunks, split by the generic splitter when it
/// exceeds `chunk_size`. Header-only fragments are dropped.
pub struct StructuredSplitter {
    rules: Arc<StructureRules>,
    patterns: StructurePatterns,
    splitter: GenericSplitter,
    keywords: Arc<KeywordExtractor>,
}

struct Section {
    title: Option<String>,
    range: Range<usize>,
    /// Where the text after the header line begins.
    body_start: usize,
}

impl StructuredSplitter {
    pub fn new(
        options: ChunkingOptions,
        rules: Arc<StructureRules>,
        keywords: Arc<KeywordExtractor>,
    ) -> RagResult<Self> {
        Ok(Self {
            rules,
            patterns: StructurePatterns::new()?,
            splitter: GenericSplitter::new(options, Arc::clone(&keywords))?,
            keywords,
        })
    }

    fn sections(&self, text: &str) -> Vec<Section> {
        let headers = self.patterns.headers(text);
        let mut sections = Vec::with_capacity(headers.len() + 1);

        let first_header = headers.first().map_or(text.len(), |h| h.line.start);
        if first_header > 0 {
            sections.push(Section {
                title: None,
                range: 0..first_header,
                body_start: 0,
            });
        }
        for (i, header) in headers.iter().enumerate() {
            let end = headers.get(i + 1).map_or(text.len(), |next| next.line.start);
            sections.push(Section {
                title: Some(header.title.clone()),
                range: header.line.start..end,
                body_start: header.line.end.min(end),
            });
        }
        sections
    }

    fn metadata(&self, chunk_type: ChunkType, section: &Section, content: &str) -> ChunkMetadata {
        let priority = match &section.title {
            Some(title) => self.rules.priority_for(title),
            None => self.rules.priority_for(INTRODUCTION),
        };
        ChunkMetadata {
            chunk_type,
            source_section: section.title.clone(),
            priority,
            keywords: self.keywords.extract(content),
        }
    }

    /// Emit the text of `range` as one or more section chunks.
    fn push_fragment(
        &self,
        text: &str,
        section: &Section,
        range: Range<usize>,
        chunk_type: ChunkType,
        drafts: &mut Vec<ChunkDraft>,
    ) {
        if range.start >= range.end {
            return;
        }
        // Only the header line (or nothing) left in this fragment.
        let body_from = range.start.max(section.body_start);
        if body_from >= range.end || text[body_from..range.end].trim().is_empty() {
            return;
        }

        let fragment = text[range].trim();
        for piece in self.splitter.split_text(fragment) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            let meta = self.metadata(chunk_type, section, piece);
            drafts.push(ChunkDraft::new(piece, meta));
        }
    }
}

impl Chunker for StructuredSplitter {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn segment(&self, document: &Document, _metadata: &Metadata) -> RagResult<Vec<ChunkDraft>> {
        let text = document.content.as_str();
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sections = self.sections(text);
        let units: Vec<AtomicUnit> = self.patterns.atomic_units(text);
        let has_headers = sections.iter().any(|s| s.title.is_some());
        let unstructured = !has_headers && units.is_empty();

        let mut drafts = Vec::new();
        for section in &sections {
            let fragment_type = match (&section.title, unstructured) {
                (Some(_), _) => ChunkType::Section,
                (None, true) => ChunkType::Text,
                (None, false) => ChunkType::Introduction,
            };

            let mut cursor = section.range.start;
            for unit in units.iter().filter(|u| section.range.contains(&u.span.start)) {
                if unit.span.start < cursor {
                    continue;
                }
                self.push_fragment(text, section, cursor..unit.span.start, fragment_type, &mut drafts);

                let content = text[unit.span.clone()].trim();
                if !content.is_empty() {
                    let meta = self.metadata(unit.kind, section, content);
                    drafts.push(ChunkDraft::new(content, meta));
                }
                cursor = unit.span.end.min(section.range.end);
            }
            self.push_fragment(text, section, cursor..section.range.end, fragment_type, &mut drafts);
        }

        debug!(
            document = %document.id,
            sections = sections.len(),
            atomic_units = units.len(),
            chunks = drafts.len(),
            "Structured segmentation finished"
        );
        Ok(drafts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn splitter(size: usize) -> StructuredSplitter {
        StructuredSplitter::new(
            ChunkingOptions::new(size, size / 10),
            Arc::new(StructureRules::default()),
            Arc::new(KeywordExtractor::new(["Rust", "Kafka"]).unwrap()),
        )
        .unwrap()
    }

    fn segment(s: &StructuredSplitter, text: &str) -> Vec<ChunkDraft> {
        s.segment(&Document::new(text, "test"), &Metadata::new()).unwrap()
    }

    #[test]
    fn test_sections_get_titles_and_priorities() {
        let text = "Hello there.\n\n# Summary\nRust engineer.\n\n# Hobbies\nHiking.";
        let drafts = segment(&splitter(500), text);
        assert_eq!(drafts.len(), 3);

        assert_eq!(drafts[0].metadata.chunk_type, ChunkType::Introduction);
        assert_eq!(drafts[0].metadata.priority, 2);

        assert_eq!(drafts[1].metadata.chunk_type, ChunkType::Section);
        assert_eq!(drafts[1].metadata.source_section.as_deref(), Some("Summary"));
        assert_eq!(drafts[1].metadata.priority, 1);
        assert!(drafts[1].content.starts_with("# Summary"));
        assert!(drafts[1].metadata.keywords.contains("Rust"));

        assert_eq!(drafts[2].metadata.priority, 5);
    }

    #[test]
    fn test_header_only_sections_dropped() {
        let text = "# Empty\n\n# Filled\nSomething here.";
        let drafts = segment(&splitter(500), text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].metadata.source_section.as_deref(), Some("Filled"));
    }

    #[test]
    fn test_oversized_section_split() {
        let body = "Streaming pipelines move events through Kafka topics. ".repeat(10);
        let text = format!("# Projects\n{body}");
        let drafts = segment(&splitter(120), &text);
        assert!(drafts.len() > 1);
        for d in &drafts {
            assert!(d.content.chars().count() <= 120);
            assert_eq!(d.metadata.chunk_type, ChunkType::Section);
            assert_eq!(d.metadata.priority, 3);
        }
    }

    #[test]
    fn test_long_qa_pair_kept_whole() {
        let answer = "It depends on the workload and the data layout. ".repeat(8);
        let text = format!("# FAQ\nQ: How fast is it?\nA: {answer}\n\nQ: Is it safe?\nA: Yes.");
        let drafts = segment(&splitter(100), &text);
        let pairs: Vec<&ChunkDraft> = drafts
            .iter()
            .filter(|d| d.metadata.chunk_type == ChunkType::QaPair)
            .collect();
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].content.chars().count() > 100);
        assert_eq!(pairs[0].metadata.source_section.as_deref(), Some("FAQ"));
        assert_eq!(drafts.len(), 2, "the header-only remainder must not be emitted");
    }

    #[test]
    fn test_timeline_entries_between_text() {
        let text = "# Experience\nCareer so far:\n- 2018 - 2020: Engineer at Acme\n  Wrote Rust services\n- 2020 - present: Lead\nOutside the timeline.";
        let drafts = segment(&splitter(500), text);
        let kinds: Vec<ChunkType> = drafts.iter().map(|d| d.metadata.chunk_type).collect();
        assert_eq!(
            kinds,
            vec![
                ChunkType::Section,
                ChunkType::TimelineEntry,
                ChunkType::TimelineEntry,
                ChunkType::Section
            ]
        );
        assert!(drafts[1].content.contains("Wrote Rust services"));
        assert!(drafts[1].metadata.keywords.contains("Rust"));
    }

    #[test]
    fn test_plain_text_is_text_type() {
        let drafts = segment(&splitter(500), "Just a paragraph without structure.");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].metadata.chunk_type, ChunkType::Text);
    }

    #[test]
    fn test_blank_document() {
        assert!(segment(&splitter(500), "  \n\t ").is_empty());
    }
}
