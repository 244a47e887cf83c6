use crate::error::{RagError, RagResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Free-form key/value metadata attached to a document.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Priority given to chunks whose section title matches no configured keyword.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Highest priority a chunk can carry.
pub const HIGHEST_PRIORITY: u8 = 1;

/// A source document handed to the chunking pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for this document.
    pub id: Uuid,
    /// The raw text content.
    pub content: String,
    /// Where the document came from (file path, URL, collection name).
    pub source: String,
    /// Arbitrary key-value metadata (document type, summary, tags, ...).
    #[serde(default)]
    pub metadata: Metadata,
    /// UTC timestamp of when the document was created.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Creates a new document with a fresh id and no metadata.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source: source.into(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Replaces the document metadata. Chainable builder method.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Adds a single metadata field. Chainable builder method.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// What kind of span a chunk covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// A size-based slice of unstructured text.
    Text,
    /// Body text of a titled section.
    Section,
    /// Text preceding the first header of a structured document.
    Introduction,
    /// A labeled question together with its answer.
    QaPair,
    /// A dated timeline bullet and its continuation lines.
    TimelineEntry,
    /// A summary promoted from document metadata.
    Summary,
    /// A tag or skill list promoted from document metadata.
    Tags,
}

impl ChunkType {
    /// Stable snake_case name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Text => "text",
            ChunkType::Section => "section",
            ChunkType::Introduction => "introduction",
            ChunkType::QaPair => "qa_pair",
            ChunkType::TimelineEntry => "timeline_entry",
            ChunkType::Summary => "summary",
            ChunkType::Tags => "tags",
        }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieval metadata carried by every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_type: ChunkType,
    /// Title of the section the chunk was cut from, if any.
    #[serde(default)]
    pub source_section: Option<String>,
    /// 1 is the highest priority.
    pub priority: u8,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

impl ChunkMetadata {
    /// Metadata for a plain text chunk with default priority and no keywords.
    pub fn new(chunk_type: ChunkType) -> Self {
        Self {
            chunk_type,
            source_section: None,
            priority: DEFAULT_PRIORITY,
            keywords: BTreeSet::new(),
        }
    }
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self::new(ChunkType::Text)
    }
}

/// A contiguous, independently retrievable span of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub content: String,
    pub document_id: Uuid,
    /// Position of this chunk within its document, starting at 0.
    pub index: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Creates a chunk with a fresh id. Empty content is rejected.
    pub fn new(
        content: impl Into<String>,
        document_id: Uuid,
        index: usize,
        metadata: ChunkMetadata,
    ) -> RagResult<Self> {
        let content = content.into();
        if content.is_empty() {
            return Err(RagError::validation(format!(
                "chunk {index} of document {document_id} has empty content"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            content,
            document_id,
            index,
            metadata,
        })
    }
}

/// Dense vector computed for one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub chunk_id: Uuid,
    pub vector: Vec<f32>,
    /// Name of the model that produced the vector.
    pub model: String,
}

impl Embedding {
    /// Creates an embedding for the given chunk.
    pub fn new(chunk_id: Uuid, vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            chunk_id,
            vector,
            model: model.into(),
        }
    }

    /// Number of components in the vector.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_rejects_empty_content() {
        let err = Chunk::new("", Uuid::new_v4(), 0, ChunkMetadata::default()).unwrap_err();
        assert!(matches!(err, RagError::Validation(_)));
    }

    #[test]
    fn test_chunk_type_serializes_snake_case() {
        let json = serde_json::to_string(&ChunkType::QaPair).unwrap();
        assert_eq!(json, "\"qa_pair\"");
        assert_eq!(ChunkType::TimelineEntry.to_string(), "timeline_entry");
    }

    #[test]
    fn test_document_builder_fields() {
        let doc = Document::new("body", "notes.md").with_field("document_type", "qa");
        assert_eq!(doc.source, "notes.md");
        assert_eq!(
            doc.metadata.get("document_type"),
            Some(&serde_json::Value::String("qa".to_string()))
        );
    }

    #[test]
    fn test_default_metadata_priority() {
        let meta = ChunkMetadata::default();
        assert_eq!(meta.priority, DEFAULT_PRIORITY);
        assert_eq!(meta.chunk_type, ChunkType::Text);
        assert!(meta.keywords.is_empty());
    }
}
