use std::collections::HashSet;

/// English function words dropped when stopword removal is enabled.
const STOPWORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he", "her",
    "his", "if", "in", "into", "is", "it", "its", "of", "on", "or", "she", "so", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "to", "was", "we", "were",
    "what", "when", "which", "who", "will", "with", "you", "your",
];

/// Splits text into terms. The same tokenizer must be used for indexing and
/// for queries.
pub trait Tokenizer: Send + Sync {
    /// Ordered tokens of `text`.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Lowercases, splits on non-alphanumeric characters and drops single-character tokens.
#[derive(Debug, Clone, Default)]
pub struct SimpleTokenizer {
    stopwords: Option<HashSet<&'static str>>,
}

impl SimpleTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also drop common English stopwords.
    pub fn with_stopwords(mut self) -> Self {
        self.stopwords = Some(STOPWORDS.iter().copied().collect());
        self
    }

    /// A tokenizer configured from the `remove_stopwords` flag.
    pub fn from_flag(remove_stopwords: bool) -> Self {
        if remove_stopwords {
            Self::new().with_stopwords()
        } else {
            Self::new()
        }
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > 1)
            .filter(|w| {
                self.stopwords
                    .as_ref()
                    .map_or(true, |stop| !stop.contains(w.as_str()))
            })
            .collect()
    }
}
