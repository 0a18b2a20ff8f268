//! Symmetric item x item similarity matrix.
//!
//! Only the upper triangle (diagonal included) is stored, row by row, so
//! `get(i, j) == get(j, i)` holds exactly and memory is N(N+1)/2 cells.

use crate::text::SparseVector;

#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    cells: Vec<f32>,
}

impl SimilarityMatrix {
    /// Pairwise cosine similarity of L2-normalized vectors, clamped to [0, 1].
    ///
    /// A zero vector is dissimilar to everything, itself included.
    pub fn from_normalized(vectors: &[SparseVector]) -> Self {
        let size = vectors.len();
        let mut cells = Vec::with_capacity(size * (size + 1) / 2);

        for (i, a) in vectors.iter().enumerate() {
            for b in &vectors[i..] {
                cells.push(a.dot(b).clamp(0.0, 1.0));
            }
        }

        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Similarity of the items at dense indices `i` and `j`.
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        assert!(i < self.size && j < self.size, "index out of bounds");
        let (row, col) = if i <= j { (i, j) } else { (j, i) };
        // Rows before `row` hold size, size - 1, ... cells
        let row_start = row * self.size - row * row.saturating_sub(1) / 2;
        self.cells[row_start + (col - row)]
    }

    /// Every similarity of row `i`, as (index, similarity).
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        (0..self.size).map(move |j| (j, self.get(i, j)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TfidfVectorizer;

    fn matrix_for(docs: &[&str]) -> SimilarityMatrix {
        let mut vectorizer = TfidfVectorizer::new();
        SimilarityMatrix::from_normalized(&vectorizer.fit_transform(docs))
    }

    #[test]
    fn test_packed_layout() {
        let matrix = matrix_for(&["Action", "Action|Drama", "Drama", "Comedy"]);
        assert_eq!(matrix.size(), 4);
        assert_eq!(matrix.cells.len(), 10);

        for i in 0..4 {
            assert!((matrix.get(i, i) - 1.0).abs() < 1e-6);
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert!(matrix.get(0, 1) > 0.0);
        assert_eq!(matrix.get(0, 2), 0.0);
        assert_eq!(matrix.get(3, 0), 0.0);
        assert!(matrix.get(2, 1) > 0.0);
    }

    #[test]
    fn test_zero_vector_row() {
        let matrix = matrix_for(&["", "Action"]);
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.row(1).count(), 2);
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = SimilarityMatrix::from_normalized(&[]);
        assert_eq!(matrix.size(), 0);
        assert_eq!(matrix.row(0).count(), 0);
    }
}
