use hybridrag_core::Metadata;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Metadata keys consulted, in order, for an explicit document type.
const TYPE_KEYS: [&str; 2] = ["document_type", "type"];

/// Canonical chunking-strategy tag of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Project write-ups with summary/technology metadata.
    Project,
    /// Question and answer collections.
    Qa,
    /// Plain prose.
    Text,
    /// Dated career or history timelines.
    Experience,
    /// No type declared; routed to the default strategy.
    Unknown,
    /// Any other declared type, stored uppercased.
    Custom(String),
}

impl DocumentType {
    /// Parse a declared type, normalising case and known aliases.
    pub fn from_tag(raw: &str) -> Self {
        let tag = raw.trim().to_lowercase();
        match tag.as_str() {
            "" | "unknown" => DocumentType::Unknown,
            "project" | "projects" => DocumentType::Project,
            "qa" | "q&a" | "q/a" | "faq" | "faqs" => DocumentType::Qa,
            "text" | "txt" | "plain" | "prose" => DocumentType::Text,
            "experience" | "timeline" | "resume" | "cv" => DocumentType::Experience,
            _ => DocumentType::Custom(tag.to_uppercase()),
        }
    }

    /// Uppercase tag as used in configuration and logs.
    pub fn as_tag(&self) -> &str {
        match self {
            DocumentType::Project => "PROJECT",
            DocumentType::Qa => "QA",
            DocumentType::Text => "TEXT",
            DocumentType::Experience => "EXPERIENCE",
            DocumentType::Unknown => "UNKNOWN",
            DocumentType::Custom(tag) => tag,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Resolves the strategy tag of a document from its metadata.
///
/// An explicit `document_type` (or `type`) field always wins. Without one the
/// result is [`DocumentType::Unknown`], which routes to the default strategy.
/// Detection never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTypeDetector;

impl DocumentTypeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detect the strategy tag. The text is accepted for interface symmetry
    /// with content-sniffing detectors but is not inspected.
    pub fn detect(&self, metadata: Option<&Metadata>, _text: &str) -> DocumentType {
        let Some(metadata) = metadata else {
            return DocumentType::Unknown;
        };

        for key in TYPE_KEYS {
            match metadata.get(key) {
                Some(serde_json::Value::String(raw)) => return DocumentType::from_tag(raw),
                Some(other) => {
                    debug!(key, value = %other, "Ignoring non-string document type");
                    return DocumentType::Unknown;
                }
                None => {}
            }
        }
        DocumentType::Unknown
    }
}
