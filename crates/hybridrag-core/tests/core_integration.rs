#![allow(clippy::unwrap_used, clippy::expect_used)]

use hybridrag_core::*;
use std::io::Write;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// 1. Config file loading
// ---------------------------------------------------------------------------

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[chunking]
chunk_size = 300
chunk_overlap = 30

[chunking.section_priorities]
experience = 1

[keywords]
terms = ["Rust", "Tokio"]
"#
    )
    .unwrap();

    let config = RagConfig::load(file.path()).unwrap();
    assert_eq!(config.chunking.chunk_size, 300);
    assert_eq!(config.chunking.section_priorities.get("experience"), Some(&1));
    assert_eq!(config.keywords.terms, vec!["Rust".to_string(), "Tokio".to_string()]);
    assert_eq!(config.search.top_k, 5);
}

#[test]
fn config_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RagConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RagError::Config(_)));
}

#[test]
fn config_zero_priority_rejected() {
    let raw = "[chunking.section_priorities]\nskills = 0\n";
    assert!(RagConfig::from_toml_str(raw).is_err());
}

// ---------------------------------------------------------------------------
// 2. Data model serialization
// ---------------------------------------------------------------------------

#[test]
fn chunk_serialization_roundtrip() {
    let doc = Document::new("Q: What? A: That.", "faq.md");
    let mut meta = ChunkMetadata::new(ChunkType::QaPair);
    meta.source_section = Some("FAQ".to_string());
    meta.priority = 2;
    meta.keywords.insert("Rust".to_string());
    let chunk = Chunk::new(doc.content.clone(), doc.id, 0, meta).unwrap();

    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json["metadata"]["chunk_type"], "qa_pair");
    assert_eq!(json["metadata"]["keywords"][0], "Rust");

    let back: Chunk = serde_json::from_value(json).unwrap();
    assert_eq!(back, chunk);
}

#[test]
fn embedding_reports_dimension() {
    let emb = Embedding::new(Uuid::new_v4(), vec![0.0; 12], "test-model");
    assert_eq!(emb.dimension(), 12);
    assert_eq!(emb.model, "test-model");
}

// ---------------------------------------------------------------------------
// 3. Error display
// ---------------------------------------------------------------------------

#[test]
fn error_messages_name_their_kind() {
    let err = RagError::validation("2 chunks but 3 embeddings");
    assert_eq!(err.to_string(), "Validation error: 2 chunks but 3 embeddings");
    let err = RagError::BackendUnavailable("model not loaded".to_string());
    assert!(err.is_backend_unavailable());
    assert!(err.to_string().contains("model not loaded"));
}
