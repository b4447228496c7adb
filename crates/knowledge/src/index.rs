//! Exact in-memory L2 index.

use crate::vector_index::{Neighbor, VectorIndex};
use dossier_core::{AppError, AppResult};

/// Brute-force index over squared Euclidean distance.
///
/// Vectors are stored row-major in one buffer. Search scores every row, so
/// results are the true k nearest; ties keep build order.
#[derive(Debug, Clone, Default)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build from `vectors`, which must all share one width.
    pub fn build(vectors: Vec<Vec<f32>>) -> AppResult<Self> {
        let Some(first) = vectors.first() else {
            return Ok(Self::default());
        };

        let dimensions = first.len();
        if dimensions == 0 {
            return Err(AppError::Knowledge(
                "Cannot index zero-dimensional vectors".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for (i, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Knowledge(format!(
                    "Vector {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            data.extend(vector);
        }

        Ok(Self { dimensions, data })
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // `chunks_exact(0)` panics, and an empty index has no rows anyway.
        self.data.chunks_exact(self.dimensions.max(1))
    }
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl VectorIndex for FlatL2Index {
    fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>> {
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut hits: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(index, row)| Neighbor {
                index,
                distance: squared_l2(row, query),
            })
            .collect();

        // Stable: equal distances stay in build order.
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        Ok(hits)
    }
}
