//! Vector index abstraction.
//!
//! An index is built once from a fixed set of vectors and then only read.
//! Positions returned by `search` refer to the order vectors were supplied
//! at build time.

use dossier_core::AppResult;

/// One search hit: the vector's build-time position and its squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Trait for nearest-neighbour backends.
pub trait VectorIndex: Send + Sync {
    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of every indexed vector.
    fn dimensions(&self) -> usize;

    /// The `k` nearest vectors to `query`, ascending by distance.
    ///
    /// `k` larger than the index is clamped; an empty index yields no hits.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<Neighbor>>;
}
