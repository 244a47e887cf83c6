use crate::error::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level engine configuration, usually read from `hybridrag.toml`.
///
/// Every section is optional; missing sections and fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub lexical: LexicalConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
}

impl RagConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(raw: &str) -> RagResult<Self> {
        let config: RagConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> RagResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> RagResult<()> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(RagError::Config("chunking.chunk_size must be > 0".to_string()));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(RagError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.section_priorities.values().any(|p| *p == 0) {
            return Err(RagError::Config(
                "chunking.section_priorities values start at 1".to_string(),
            ));
        }
        let s = &self.search;
        if !(0.0..=1.0).contains(&s.hybrid_weight) {
            return Err(RagError::Config(format!(
                "search.hybrid_weight must be within [0, 1], got {}",
                s.hybrid_weight
            )));
        }
        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 {
            return Err(RagError::Config(
                "embedding.dimension and embedding.batch_size must be > 0".to_string(),
            ));
        }
        if self.lexical.k1 < 0.0 || !(0.0..=1.0).contains(&self.lexical.b) {
            return Err(RagError::Config(
                "lexical.k1 must be >= 0 and lexical.b within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Chunking behaviour shared by all strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive size-based chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// When false, every document goes through the size-based splitter.
    #[serde(default = "default_true")]
    pub preserve_structure: bool,
    /// How far back (in characters) to look for a clean split point.
    #[serde(default = "default_boundary_window")]
    pub boundary_window: usize,
    /// Section title keyword -> priority (1 is highest).
    #[serde(default = "default_section_priorities")]
    pub section_priorities: BTreeMap<String, u8>,
    /// Metadata fields promoted to a `summary` chunk.
    #[serde(default = "default_summary_fields")]
    pub summary_fields: Vec<String>,
    /// Metadata fields promoted to a `tags` chunk.
    #[serde(default = "default_list_fields")]
    pub list_fields: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            preserve_structure: true,
            boundary_window: default_boundary_window(),
            section_priorities: default_section_priorities(),
            summary_fields: default_summary_fields(),
            list_fields: default_list_fields(),
        }
    }
}

/// What to do when the embedding backend is unavailable at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedMode {
    /// Return `RagError::BackendUnavailable`.
    #[default]
    Fail,
    /// Rank on lexical scores only and flag the search as degraded.
    LexicalOnly,
}

/// Default search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub similarity_threshold: f32,
    #[serde(default = "default_hybrid_weight")]
    pub hybrid_weight: f32,
    #[serde(default)]
    pub degraded_mode: DegradedMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: 0.0,
            hybrid_weight: default_hybrid_weight(),
            degraded_mode: DegradedMode::Fail,
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Texts sent to the backend per request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            model: default_model(),
        }
    }
}

/// BM25 parameters and tokenizer switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    #[serde(default = "default_k1")]
    pub k1: f32,
    #[serde(default = "default_b")]
    pub b: f32,
    #[serde(default)]
    pub remove_stopwords: bool,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
            remove_stopwords: false,
        }
    }
}

/// Terms recognised by keyword extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            terms: default_terms(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    75
}
fn default_true() -> bool {
    true
}
fn default_boundary_window() -> usize {
    100
}
fn default_top_k() -> usize {
    5
}
fn default_hybrid_weight() -> f32 {
    0.7
}
fn default_dimension() -> usize {
    256
}
fn default_batch_size() -> usize {
    32
}
fn default_model() -> String {
    "local-hash".to_string()
}
fn default_k1() -> f32 {
    1.2
}
fn default_b() -> f32 {
    0.75
}

fn default_section_priorities() -> BTreeMap<String, u8> {
    [
        ("summary", 1),
        ("overview", 1),
        ("about", 1),
        ("introduction", 2),
        ("skills", 2),
        ("experience", 2),
        ("faq", 2),
        ("projects", 3),
        ("education", 3),
        ("certifications", 4),
        ("contact", 4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_summary_fields() -> Vec<String> {
    vec!["summary".to_string(), "description".to_string()]
}

fn default_list_fields() -> Vec<String> {
    vec![
        "skills".to_string(),
        "tags".to_string(),
        "technologies".to_string(),
    ]
}

fn default_terms() -> Vec<String> {
    [
        "Rust", "Python", "Java", "JavaScript", "TypeScript", "C++", "C#", "SQL",
        "PostgreSQL", "Redis", "Qdrant", "Docker", "Kubernetes", "AWS", "GCP", "Azure",
        "React", "Node.js", "FastAPI", "Django", "GraphQL", "gRPC", "Kafka", "Terraform",
        "PyTorch", "TensorFlow", "LLM", "RAG", "embeddings", "machine learning",
        "deep learning", "NLP", "microservices", "CI/CD", "BM25",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = RagConfig::from_toml_str("").unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 75);
        assert_eq!(config.search.degraded_mode, DegradedMode::Fail);
    }

    #[test]
    fn test_partial_sections_override() {
        let raw = r#"
            [chunking]
            chunk_size = 800
            chunk_overlap = 100

            [search]
            hybrid_weight = 0.5
            degraded_mode = "lexical_only"
        "#;
        let config = RagConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.boundary_window, 100);
        assert_eq!(config.search.degraded_mode, DegradedMode::LexicalOnly);
        assert!((config.search.hybrid_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_rejected() {
        let raw = "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n";
        let err = RagConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn test_weight_out_of_range_rejected() {
        let err = RagConfig::from_toml_str("[search]\nhybrid_weight = 1.2\n").unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_toml_error() {
        let err = RagConfig::from_toml_str("[chunking\nchunk_size = ").unwrap_err();
        assert!(matches!(err, RagError::Toml(_)));
    }
}
