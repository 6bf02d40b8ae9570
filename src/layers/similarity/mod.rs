pub mod corpus;
pub mod engine;
pub mod provider;

pub use corpus::AttackCorpus;
pub use engine::SimilarityEngine;
pub use provider::{EmbeddingProvider, HttpEmbeddingProvider};
