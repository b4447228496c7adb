//! Retrieval-augmented evidence selection.

pub mod pipeline;

pub use pipeline::RagPipeline;
