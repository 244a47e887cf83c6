#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the hybridrag-chunking crate.
//!
//! Covers detector -> registry routing, the generic splitter's size and
//! overlap guarantees, atomic Q&A units, metadata promotion and registry
//! extension.

use std::sync::Arc;

use serde_json::json;

use hybridrag_chunking::{
    ChunkDraft, Chunker, ChunkerFactory, ChunkerRegistry, ChunkingOptions, DocumentType,
    DocumentTypeDetector, KeywordExtractor,
};
use hybridrag_core::{ChunkMetadata, ChunkType, ChunkingConfig, Document, Metadata, RagResult};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> ChunkerRegistry {
    let keywords = Arc::new(KeywordExtractor::new(["Rust", "BM25", "Qdrant"]).unwrap());
    ChunkerRegistry::with_builtin_strategies(&ChunkingConfig::default(), keywords).unwrap()
}

fn chunker_for(registry: &ChunkerRegistry, doc: &Document) -> Box<dyn Chunker> {
    let tag = DocumentTypeDetector::new().detect(Some(&doc.metadata), &doc.content);
    registry.create(&tag, &ChunkingOptions::default()).unwrap()
}

fn prose(len: usize) -> String {
    "Retrieval systems balance precision against recall in many subtle ways. "
        .repeat(len / 50 + 1)
        .chars()
        .take(len)
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Generic splitter
// ---------------------------------------------------------------------------

#[test]
fn short_document_is_one_identical_chunk() {
    let registry = registry();
    let doc = Document::new("  A short note, kept verbatim.\n", "note.txt");
    let chunks = chunker_for(&registry, &doc).chunk(&doc, None).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, doc.content);
    assert_eq!(chunks[0].document_id, doc.id);
    assert_eq!(chunks[0].index, 0);
}

#[test]
fn prose_of_1200_chars_gives_three_overlapping_chunks() {
    let registry = registry();
    let doc = Document::new(prose(1200), "essay.txt");
    assert_eq!(doc.content.chars().count(), 1200);

    let chunks = chunker_for(&registry, &doc).chunk(&doc, None).unwrap();
    assert_eq!(chunks.len(), 3);
    for chunk in &chunks {
        assert!(chunk.content.chars().count() <= 500);
        assert_eq!(chunk.metadata.chunk_type, ChunkType::Text);
    }
    for pair in chunks.windows(2) {
        let tail: String = {
            let chars: Vec<char> = pair[0].content.chars().collect();
            chars[chars.len() - 75..].iter().collect()
        };
        let head: String = pair[1].content.chars().take(75).collect();
        assert_eq!(tail, head);
    }
}

#[test]
fn long_document_reconstructs_without_overlap() {
    let registry = registry();
    let doc = Document::new(prose(4321), "long.txt");
    let chunks = chunker_for(&registry, &doc).chunk(&doc, None).unwrap();

    let mut rebuilt = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i);
        if i == 0 {
            rebuilt.push_str(&chunk.content);
        } else {
            rebuilt.extend(chunk.content.chars().skip(75));
        }
    }
    assert_eq!(rebuilt, doc.content);
}

// ---------------------------------------------------------------------------
// 2. Structured strategies
// ---------------------------------------------------------------------------

#[test]
fn four_qa_pairs_become_four_atomic_chunks() {
    let long_answer = "Scores are blended from cosine similarity and BM25. ".repeat(14);
    let content = format!(
        "Frequently asked questions about the engine.\n\n\
         Q: What is hybrid search?\nA: Dense and lexical ranking combined.\n\n\
         Q: How are scores blended?\nA: {long_answer}\n\n\
         Q: Is Rust required?\nA: The engine is written in Rust.\n\n\
         Q: Can I use Qdrant?\nA: Not in this version."
    );
    let doc = Document::new(content, "faq.md").with_field("document_type", "faq");
    let chunks = chunker_for(&registry(), &doc).chunk(&doc, None).unwrap();

    let pairs: Vec<_> = chunks
        .iter()
        .filter(|c| c.metadata.chunk_type == ChunkType::QaPair)
        .collect();
    let intros = chunks
        .iter()
        .filter(|c| c.metadata.chunk_type == ChunkType::Introduction)
        .count();
    assert_eq!(pairs.len(), 4);
    assert!(intros <= 1);
    assert_eq!(chunks.len(), pairs.len() + intros);
    assert!(pairs[1].content.chars().count() > 500, "long pair must stay whole");
    assert!(pairs[1].content.starts_with("Q: How are scores blended?"));
    assert!(pairs[1].metadata.keywords.contains("BM25"));
}

#[test]
fn project_documents_promote_metadata_first() {
    let doc = Document::new(
        "# Overview\nA search service.\n\n# Details\nWritten in Rust.",
        "project.md",
    )
    .with_field("type", "project")
    .with_field("description", "Hybrid retrieval over local files.")
    .with_field("technologies", json!(["Rust", "BM25"]));

    let chunks = chunker_for(&registry(), &doc).chunk(&doc, None).unwrap();
    let kinds: Vec<ChunkType> = chunks.iter().map(|c| c.metadata.chunk_type).collect();
    assert_eq!(
        kinds,
        vec![
            ChunkType::Summary,
            ChunkType::Tags,
            ChunkType::Section,
            ChunkType::Section
        ]
    );
    assert_eq!(chunks[1].content, "Technologies: Rust, BM25");
    assert_eq!(chunks[2].metadata.priority, 1);
    assert_eq!(chunks[3].metadata.priority, 5);
}

#[test]
fn preserve_structure_off_routes_everything_to_default() {
    let doc = Document::new("# Title\nQ: a?\nA: b.", "x.md").with_field("document_type", "qa");
    let options = ChunkingOptions {
        preserve_structure: false,
        ..ChunkingOptions::default()
    };
    let chunker = registry().create(&DocumentType::Qa, &options).unwrap();
    let chunks = chunker.chunk(&doc, None).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, doc.content);
}

// ---------------------------------------------------------------------------
// 3. Registry extension
// ---------------------------------------------------------------------------

struct LineChunker;

impl Chunker for LineChunker {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn segment(&self, document: &Document, _metadata: &Metadata) -> RagResult<Vec<ChunkDraft>> {
        Ok(document
            .content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| ChunkDraft::new(l, ChunkMetadata::default()))
            .collect())
    }
}

#[test]
fn runtime_registration_leaves_existing_bindings() {
    let mut registry = registry();
    let before = registry.tags();

    let factory: ChunkerFactory = Arc::new(|_opts: &ChunkingOptions| {
        Ok(Box::new(LineChunker) as Box<dyn Chunker>)
    });
    registry
        .register(DocumentType::from_tag("lines"), factory.clone())
        .unwrap();
    assert!(registry.register(DocumentType::Qa, factory).is_err());

    let after = registry.tags();
    assert_eq!(after.len(), before.len() + 1);
    assert!(after.contains(&"LINES".to_string()));

    let doc = Document::new("one\n\ntwo\nthree", "l.txt").with_field("document_type", "Lines");
    let chunks = chunker_for(&registry, &doc).chunk(&doc, None).unwrap();
    let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three"]);

    let qa = registry
        .create(&DocumentType::Qa, &ChunkingOptions::default())
        .unwrap();
    assert_eq!(qa.name(), "structured");
}
