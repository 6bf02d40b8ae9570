// warden: real-time prompt-injection detection cascade for LLM applications.
//
// Three layers run in ascending cost order — a synchronous pattern scanner,
// an embedding-similarity matcher, and a generative-model adjudicator — with
// each layer short-circuiting the next on a positive verdict.

pub mod cache;
pub mod cascade;
pub mod config;
pub mod error;
pub mod layers;
pub mod model;

pub use cascade::{DetectOptions, Detector};
pub use error::DetectorError;
pub use model::{AttackCategory, CascadeResult, Layer, LayerResult};
