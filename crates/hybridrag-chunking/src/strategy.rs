use hybridrag_core::{Chunk, ChunkMetadata, Document, Metadata, RagResult};

/// Content and metadata of a chunk before it is bound to a document position.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl ChunkDraft {
    /// Creates a draft.
    pub fn new(content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A chunking strategy.
///
/// Implementations only decide how a document is segmented
/// ([`Chunker::segment`]); numbering and identity assignment are shared
/// through the provided [`Chunker::chunk`].
pub trait Chunker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Split the document into ordered drafts.
    ///
    /// `metadata` is the document metadata merged with any metadata passed
    /// explicitly by the caller.
    fn segment(&self, document: &Document, metadata: &Metadata) -> RagResult<Vec<ChunkDraft>>;

    /// Split the document into ordered chunks with indices `0..n`.
    fn chunk(&self, document: &Document, metadata: Option<&Metadata>) -> RagResult<Vec<Chunk>> {
        let merged = merge_metadata(document, metadata);
        let drafts = self.segment(document, &merged)?;
        assemble(document, drafts)
    }
}

/// Document metadata overlaid with explicitly supplied metadata.
pub fn merge_metadata(document: &Document, explicit: Option<&Metadata>) -> Metadata {
    let mut merged = document.metadata.clone();
    if let Some(explicit) = explicit {
        for (key, value) in explicit {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Turn drafts into chunks owned by `document`, numbered in order.
pub fn assemble(document: &Document, drafts: Vec<ChunkDraft>) -> RagResult<Vec<Chunk>> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| Chunk::new(draft.content, document.id, index, draft.metadata))
        .collect()
}
