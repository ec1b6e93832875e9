//! Index core: lexical model, vector matrix, manifest, fusion and the
//! store that ties them together

pub mod bm25;
pub mod fusion;
pub mod manifest;
pub mod matrix;
pub mod store;

pub use bm25::Bm25;
pub use fusion::{rrf_fuse, RRF_K};
pub use manifest::{FileDiff, Manifest, ManifestEntry};
pub use matrix::EmbeddingMatrix;
pub use store::{HybridIndex, IndexOptions, SearchHit};
