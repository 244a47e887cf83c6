use hybridrag_core::{ChunkingConfig, RagError, RagResult, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size knobs handed to a chunker when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive size-based chunks.
    pub chunk_overlap: usize,
    /// When false the registry hands out the default size-based splitter.
    pub preserve_structure: bool,
    /// How far back to look for a sentence or whitespace boundary.
    pub boundary_window: usize,
}

impl ChunkingOptions {
    /// Options with the default boundary window.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    /// Reject configurations that cannot make forward progress.
    pub fn validate(&self) -> RagResult<()> {
        if self.chunk_size == 0 {
            return Err(RagError::validation("chunk_size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for ChunkingOptions {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            preserve_structure: config.preserve_structure,
            boundary_window: config.boundary_window,
        }
    }
}

/// Section priorities and promoted metadata fields used by the structured strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRules {
    /// Title keyword -> priority (1 is highest).
    pub section_priorities: BTreeMap<String, u8>,
    pub summary_fields: Vec<String>,
    pub list_fields: Vec<String>,
}

impl StructureRules {
    /// Best (lowest) priority among the keywords contained in `title`, or
    /// [`DEFAULT_PRIORITY`] when none matches.
    pub fn priority_for(&self, title: &str) -> u8 {
        let title = title.to_lowercase();
        self.section_priorities
            .iter()
            .filter(|(keyword, _)| title.contains(keyword.to_lowercase().as_str()))
            .map(|(_, priority)| *priority)
            .min()
            .unwrap_or(DEFAULT_PRIORITY)
    }
}

impl Default for StructureRules {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for StructureRules {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            section_priorities: config.section_priorities.clone(),
            summary_fields: config.summary_fields.clone(),
            list_fields: config.list_fields.clone(),
        }
    }
}
