use hybridrag_core::{RagError, RagResult};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Best-effort keyword tagging against a configured term list.
///
/// Matching is case-insensitive and respects word boundaries on the
/// alphanumeric ends of each term, so `Rust` does not match `Rustacean` while
/// `C++` and `Node.js` still match. Matches are reported in the spelling the
/// term list uses.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    pattern: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl KeywordExtractor {
    /// Build an extractor for the given terms. Blank terms are ignored.
    pub fn new<I, S>(terms: I) -> RagResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = HashMap::new();
        let mut ordered: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() {
                continue;
            }
            if let std::collections::hash_map::Entry::Vacant(slot) =
                canonical.entry(term.to_lowercase())
            {
                slot.insert(term.to_string());
                ordered.push(term.to_string());
            }
        }

        if ordered.is_empty() {
            return Ok(Self::empty());
        }

        // Longest first so "machine learning" beats a shorter overlapping term.
        ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        let alternatives: Vec<String> = ordered.iter().map(|t| term_pattern(t)).collect();
        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))
            .map_err(|e| RagError::Config(format!("Invalid keyword term list: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
            canonical,
        })
    }

    /// An extractor that never matches.
    pub fn empty() -> Self {
        Self {
            pattern: None,
            canonical: HashMap::new(),
        }
    }

    /// Number of distinct terms recognised.
    pub fn term_count(&self) -> usize {
        self.canonical.len()
    }

    /// Terms found in `text`. No matches yields an empty set.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let Some(pattern) = &self.pattern else {
            return BTreeSet::new();
        };
        pattern
            .find_iter(text)
            .filter_map(|m| self.canonical.get(&m.as_str().to_lowercase()).cloned())
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::empty()
    }
}

fn term_pattern(term: &str) -> String {
    let escaped = regex::escape(term);
    let starts_word = term.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = term.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::new(["Rust", "C++", "Node.js", "machine learning", "Kubernetes"]).unwrap()
    }

    #[test]
    fn test_case_insensitive_canonical_spelling() {
        let found = extractor().extract("Built in RUST and deployed on kubernetes.");
        let expected: BTreeSet<String> = ["Rust", "Kubernetes"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_word_boundaries() {
        let found = extractor().extract("A friendly Rustacean trusted the process");
        assert!(found.is_empty(), "partial words must not match: {found:?}");
    }

    #[test]
    fn test_symbol_terms_and_phrases() {
        let found = extractor().extract("C++ services, a Node.js gateway and Machine Learning models");
        assert!(found.contains("C++"));
        assert!(found.contains("Node.js"));
        assert!(found.contains("machine learning"));
    }

    #[test]
    fn test_no_matches_is_empty() {
        assert!(extractor().extract("cooking dinner").is_empty());
        assert!(KeywordExtractor::empty().extract("Rust").is_empty());
        assert!(KeywordExtractor::new(Vec::<String>::new()).unwrap().extract("Rust").is_empty());
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let ex = KeywordExtractor::new(["Rust", "rust", " "]).unwrap();
        assert_eq!(ex.term_count(), 1);
    }
}
