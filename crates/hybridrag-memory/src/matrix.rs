/// Row-major dense matrix of embeddings with cached row norms.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    dimension: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl DenseMatrix {
    /// Stack `rows`, each of length `dimension`.
    pub fn from_rows<'a, I>(dimension: usize, rows: I) -> Self
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut data = Vec::new();
        let mut norms = Vec::new();
        for row in rows {
            debug_assert_eq!(row.len(), dimension);
            data.extend_from_slice(row);
            norms.push(l2_norm(row));
        }
        Self {
            dimension,
            data,
            norms,
        }
    }

    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Cosine similarity between `query` and every row, in row order.
    /// Zero-norm rows (or a zero query) score 0.
    pub fn cosine_scores(&self, query: &[f32]) -> Vec<f32> {
        let query_norm = l2_norm(query);
        if self.dimension == 0 {
            return vec![0.0; self.rows()];
        }
        self.data
            .chunks_exact(self.dimension)
            .zip(&self.norms)
            .map(|(row, &norm)| {
                if norm == 0.0 || query_norm == 0.0 {
                    0.0
                } else {
                    dot(row, query) / (norm * query_norm)
                }
            })
            .collect()
    }

    pub fn estimated_bytes(&self) -> usize {
        (self.data.len() + self.norms.len()) * std::mem::size_of::<f32>()
    }
}

/// Cosine similarity of two vectors; 0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot(a, b) / (na * nb)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_scores_match_pairwise() {
        let rows: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![-2.0, 0.0]];
        let m = DenseMatrix::from_rows(2, rows.iter().map(Vec::as_slice));
        assert_eq!(m.rows(), 3);
        let q = [3.0, 0.0];
        let scores = m.cosine_scores(&q);
        for (i, row) in rows.iter().enumerate() {
            assert!((scores[i] - cosine_similarity(row, &q)).abs() < 1e-6);
        }
        assert!((scores[0] - 1.0).abs() < 1e-6);
        assert!((scores[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vectors_score_zero() {
        let rows = [vec![0.0, 0.0], vec![1.0, 0.0]];
        let m = DenseMatrix::from_rows(2, rows.iter().map(Vec::as_slice));
        assert_eq!(m.cosine_scores(&[1.0, 0.0])[0], 0.0);
        assert_eq!(m.cosine_scores(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_shape_and_size() {
        let rows = [vec![1.0, 2.0], vec![3.0, 4.0]];
        let m = DenseMatrix::from_rows(2, rows.iter().map(Vec::as_slice));
        assert_eq!(m.rows(), 2);
        assert_eq!(m.dimension(), 2);
        assert_eq!(m.estimated_bytes(), 6 * 4);
    }
}
