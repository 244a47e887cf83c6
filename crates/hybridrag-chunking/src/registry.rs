use crate::detector::DocumentType;
use crate::generic::GenericSplitter;
use crate::keywords::KeywordExtractor;
use crate::options::{ChunkingOptions, StructureRules};
use crate::promoted::MetadataPromoter;
use crate::strategy::Chunker;
use crate::structured::StructuredSplitter;
use hybridrag_core::{ChunkingConfig, RagError, RagResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Constructor bound to a strategy tag.
pub type ChunkerFactory =
    Arc<dyn Fn(&ChunkingOptions) -> RagResult<Box<dyn Chunker>> + Send + Sync>;

/// Maps document types to chunker constructors.
///
/// The registry always holds a binding for [`DocumentType::Unknown`], the
/// default strategy. New tags can be added at runtime; existing bindings are
/// never replaced.
pub struct ChunkerRegistry {
    factories: HashMap<DocumentType, ChunkerFactory>,
}

impl ChunkerRegistry {
    /// A registry with only the default binding (`UNKNOWN` -> generic splitter).
    pub fn new(keywords: Arc<KeywordExtractor>) -> Self {
        let mut factories: HashMap<DocumentType, ChunkerFactory> = HashMap::new();
        factories.insert(DocumentType::Unknown, generic_factory(keywords));
        Self { factories }
    }

    /// The default binding plus the built-in structured strategies.
    pub fn with_builtin_strategies(
        config: &ChunkingConfig,
        keywords: Arc<KeywordExtractor>,
    ) -> RagResult<Self> {
        let rules = Arc::new(StructureRules::from(config));
        let mut registry = Self::new(Arc::clone(&keywords));

        registry.register(DocumentType::Text, generic_factory(Arc::clone(&keywords)))?;
        registry.register(
            DocumentType::Qa,
            structured_factory(Arc::clone(&rules), Arc::clone(&keywords)),
        )?;
        registry.register(
            DocumentType::Experience,
            structured_factory(Arc::clone(&rules), Arc::clone(&keywords)),
        )?;

        let project: ChunkerFactory = Arc::new(move |options: &ChunkingOptions| {
            let body =
                StructuredSplitter::new(*options, Arc::clone(&rules), Arc::clone(&keywords))?;
            Ok(Box::new(MetadataPromoter::new(
                Box::new(body),
                Arc::clone(&rules),
                Arc::clone(&keywords),
            )) as Box<dyn Chunker>)
        });
        registry.register(DocumentType::Project, project)?;

        Ok(registry)
    }

    /// Bind a new tag. Fails if the tag already has a constructor.
    pub fn register(&mut self, tag: DocumentType, factory: ChunkerFactory) -> RagResult<()> {
        if self.factories.contains_key(&tag) {
            return Err(RagError::validation(format!(
                "Chunking strategy already registered for {tag}"
            )));
        }
        info!(tag = %tag, "Registered chunking strategy");
        self.factories.insert(tag, factory);
        Ok(())
    }

    pub fn is_registered(&self, tag: &DocumentType) -> bool {
        self.factories.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.factories.keys().map(|t| t.as_tag().to_string()).collect();
        tags.sort();
        tags
    }

    /// Build the chunker for `tag`.
    ///
    /// Unbound tags, and any tag when `preserve_structure` is off, get the
    /// default splitter.
    pub fn create(&self, tag: &DocumentType, options: &ChunkingOptions) -> RagResult<Box<dyn Chunker>> {
        options.validate()?;

        let resolved = if !options.preserve_structure {
            &DocumentType::Unknown
        } else if self.factories.contains_key(tag) {
            tag
        } else {
            debug!(tag = %tag, "No strategy bound, using default");
            &DocumentType::Unknown
        };

        let factory = self.factories.get(resolved).ok_or_else(|| {
            RagError::Chunking("Default chunking strategy is not registered".to_string())
        })?;
        let chunker = factory(options)?;
        debug!(tag = %tag, strategy = chunker.name(), "Created chunker");
        Ok(chunker)
    }

    /// Build the default chunker.
    pub fn create_default(&self, options: &ChunkingOptions) -> RagResult<Box<dyn Chunker>> {
        self.create(&DocumentType::Unknown, options)
    }
}

fn generic_factory(keywords: Arc<KeywordExtractor>) -> ChunkerFactory {
    Arc::new(move |options: &ChunkingOptions| {
        Ok(Box::new(GenericSplitter::new(*options, Arc::clone(&keywords))?) as Box<dyn Chunker>)
    })
}

fn structured_factory(
    rules: Arc<StructureRules>,
    keywords: Arc<KeywordExtractor>,
) -> ChunkerFactory {
    Arc::new(move |options: &ChunkingOptions| {
        Ok(Box::new(StructuredSplitter::new(
            *options,
            Arc::clone(&rules),
            Arc::clone(&keywords),
        )?) as Box<dyn Chunker>)
    })
}
