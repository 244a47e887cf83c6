use hybridrag_core::LexicalConfig;
use std::collections::HashMap;

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Document-length normalization.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

impl From<&LexicalConfig> for Bm25Params {
    fn from(config: &LexicalConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
        }
    }
}

/// BM25 index over an ordered sequence of token lists.
///
/// Documents are addressed by their position in the sequence the index was
/// built from, so scores line up with the store's chunk order. The index is
/// immutable; a changed corpus means a fresh [`Bm25Index::build`], since
/// document frequencies and the average length shift with every change.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    /// term -> (position, term_frequency)
    postings: HashMap<String, Vec<(usize, f32)>>,
    doc_lengths: Vec<f32>,
    avg_doc_length: f32,
}

impl Bm25Index {
    /// Build the index for `documents`, one token list per position.
    pub fn build<'a, I>(params: Bm25Params, documents: I) -> Self
    where
        I: IntoIterator<Item = &'a [String]>,
    {
        let mut postings: HashMap<String, Vec<(usize, f32)>> = HashMap::new();
        let mut doc_lengths = Vec::new();

        for (position, tokens) in documents.into_iter().enumerate() {
            let mut term_freq: HashMap<&str, f32> = HashMap::new();
            for token in tokens {
                *term_freq.entry(token.as_str()).or_insert(0.0) += 1.0;
            }
            for (term, freq) in term_freq {
                postings
                    .entry(term.to_string())
                    .or_default()
                    .push((position, freq));
            }
            doc_lengths.push(tokens.len() as f32);
        }

        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<f32>() / doc_lengths.len() as f32
        };

        Self {
            params,
            postings,
            doc_lengths,
            avg_doc_length,
        }
    }

    /// Raw BM25 score of every document for the query, by position.
    ///
    /// ```text
    /// score = sum over query terms of:
    ///   IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl / avgdl))
    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1.0)
    /// ```
    /// Documents without any query term score 0.
    pub fn scores(&self, query_tokens: &[String]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.doc_lengths.len()];
        if scores.is_empty() {
            return scores;
        }

        let n = self.doc_lengths.len() as f32;
        let avgdl = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };
        let Bm25Params { k1, b } = self.params;

        for token in query_tokens {
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let df = postings.len() as f32;
            // Robertson's IDF, never negative.
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(position, tf) in postings {
                let dl = self.doc_lengths[position];
                let numerator = tf * (k1 + 1.0);
                let denominator = tf + k1 * (1.0 - b + b * dl / avgdl);
                scores[position] += idf * numerator / denominator;
            }
        }

        scores
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Rough heap footprint of the postings and length table.
    pub fn estimated_bytes(&self) -> usize {
        let posting_bytes: usize = self
            .postings
            .iter()
            .map(|(term, list)| term.len() + list.len() * std::mem::size_of::<(usize, f32)>())
            .sum();
        posting_bytes + self.doc_lengths.len() * std::mem::size_of::<f32>()
    }
}

/// Divide every score by the maximum. All-zero input stays all zero.
pub fn normalize_by_max(scores: &mut [f32]) {
    let max = scores.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for score in scores.iter_mut() {
            *score /= max;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::tokenizer::{SimpleTokenizer, Tokenizer};

    fn index(texts: &[&str]) -> Bm25Index {
        let tokenizer = SimpleTokenizer::new();
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenizer.tokenize(t)).collect();
        Bm25Index::build(Bm25Params::default(), docs.iter().map(Vec::as_slice))
    }

    fn query(text: &str) -> Vec<String> {
        SimpleTokenizer::new().tokenize(text)
    }

    #[test]
    fn test_scores_align_with_positions() {
        let idx = index(&[
            "rust is a systems programming language rust is fast rust is safe",
            "python is a scripting programming language used for data science",
            "cooking recipes for a delicious dinner meal",
        ]);
        let scores = idx.scores(&query("rust programming"));
        assert_eq!(scores.len(), 3);
        assert!(scores[0] > scores[1], "{scores:?}");
        assert!(scores[1] > 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_no_matches_all_zero() {
        let idx = index(&["rust programming language"]);
        assert_eq!(idx.scores(&query("cooking dinner")), vec![0.0]);
    }

    #[test]
    fn test_empty_index() {
        let idx = index(&[]);
        assert!(idx.is_empty());
        assert_eq!(idx.doc_count(), 0);
        assert!(idx.scores(&query("anything")).is_empty());
        assert_eq!(idx.estimated_bytes(), 0);
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let idx = index(&["common rare", "common", "common"]);
        let rare = idx.scores(&query("rare"))[0];
        let common = idx.scores(&query("common"))[0];
        assert!(rare > common);
    }

    #[test]
    fn test_normalize_by_max() {
        let mut scores = vec![2.0, 1.0, 0.0];
        normalize_by_max(&mut scores);
        assert_eq!(scores, vec![1.0, 0.5, 0.0]);

        let mut zeros = vec![0.0, 0.0];
        normalize_by_max(&mut zeros);
        assert_eq!(zeros, vec![0.0, 0.0]);
    }

    #[test]
    fn test_params_from_config() {
        let params = Bm25Params::from(&LexicalConfig::default());
        assert_eq!(params, Bm25Params::default());
    }
}
