use crate::keywords::KeywordExtractor;
use crate::options::StructureRules;
use crate::strategy::{ChunkDraft, Chunker};
use hybridrag_core::{ChunkMetadata, ChunkType, Document, Metadata, RagResult, HIGHEST_PRIORITY};
use std::sync::Arc;
use tracing::debug;

/// Wraps a body chunker and emits selected metadata fields as their own
/// priority-1 chunks ahead of the body.
///
/// String fields listed in `summary_fields` become `summary` chunks. Fields
/// listed in `list_fields` (a JSON array of strings or a comma-separated
/// string) become one `tags` chunk each. Missing or malformed fields are
/// skipped.
pub struct MetadataPromoter {
    inner: Box<dyn Chunker>,
    rules: Arc<StructureRules>,
    keywords: Arc<KeywordExtractor>,
}

impl MetadataPromoter {
    pub fn new(
        inner: Box<dyn Chunker>,
        rules: Arc<StructureRules>,
        keywords: Arc<KeywordExtractor>,
    ) -> Self {
        Self {
            inner,
            rules,
            keywords,
        }
    }

    /// Drafts for the promoted fields only.
    pub fn promote(&self, metadata: &Metadata) -> Vec<ChunkDraft> {
        let mut drafts = Vec::new();

        for field in &self.rules.summary_fields {
            match metadata.get(field) {
                Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
                    drafts.push(self.draft(ChunkType::Summary, field, text.trim().to_string()));
                }
                Some(other) => debug!(field = %field, value = %other, "Skipping malformed summary field"),
                None => {}
            }
        }

        for field in &self.rules.list_fields {
            let Some(value) = metadata.get(field) else {
                continue;
            };
            let items = list_items(value);
            if items.is_empty() {
                debug!(field = %field, value = %value, "Skipping empty or malformed list field");
                continue;
            }
            let content = format!("{}: {}", field_label(field), items.join(", "));
            drafts.push(self.draft(ChunkType::Tags, field, content));
        }

        drafts
    }

    fn draft(&self, chunk_type: ChunkType, field: &str, content: String) -> ChunkDraft {
        let meta = ChunkMetadata {
            chunk_type,
            source_section: Some(field.to_string()),
            priority: HIGHEST_PRIORITY,
            keywords: self.keywords.extract(&content),
        };
        ChunkDraft::new(content, meta)
    }
}

impl Chunker for MetadataPromoter {
    fn name(&self) -> &'static str {
        "metadata_promoted"
    }

    fn segment(&self, document: &Document, metadata: &Metadata) -> RagResult<Vec<ChunkDraft>> {
        let mut drafts = self.promote(metadata);
        drafts.extend(self.inner.segment(document, metadata)?);
        Ok(drafts)
    }
}

/// Trimmed, de-duplicated, non-empty entries of a list-valued field.
fn list_items(value: &serde_json::Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        serde_json::Value::Array(values) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        serde_json::Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };

    let mut items: Vec<String> = Vec::with_capacity(raw.len());
    for item in raw {
        let item = item.trim();
        if !item.is_empty() && !items.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            items.push(item.to_string());
        }
    }
    items
}

/// `technologies` -> `Technologies`.
fn field_label(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}
