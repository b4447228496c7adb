//! Evidence selection for report sections.
//!
//! Splits fetched web documents into overlapping passages, embeds them,
//! retrieves the nearest candidates for a query and reranks those with a
//! joint query/passage scorer. Nothing is persisted: every call works over
//! the documents it is given.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod rag;
pub mod rerank;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::{chunk_documents, split_text, ChunkConfig};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use index::FlatL2Index;
pub use rag::RagPipeline;
pub use rerank::{create_reranker, rank_by_score, Reranker};
pub use types::{Chunk, Document, Evidence};
pub use vector_index::{Neighbor, VectorIndex};
