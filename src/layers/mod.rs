// The three cascade layers share one trait so Cascade can drive them
// uniformly (spec §4.4 execution rules). Layer 1 never suspends; layers 2
// and 3 implement `run` as genuinely async (outbound network calls).

pub mod judge;
pub mod pattern;
pub mod similarity;

use async_trait::async_trait;
use std::time::Duration;

use crate::model::{Layer, LayerResult};

#[async_trait]
pub trait DetectionLayer: Send + Sync {
    fn layer(&self) -> Layer;

    /// Availability probe consulted before the cascade attempts this layer
    /// (spec §9: "has_credentials ∧ has_artifacts ∧ backend_reachable").
    /// Unavailable layers are skipped, never attempted.
    async fn is_available(&self) -> bool;

    /// Run the layer's detection. `deadline`, if set, bounds any outbound
    /// call the layer makes; exceeding it is reported as a failed-open
    /// result rather than propagated.
    async fn run(&self, text: &str, deadline: Option<Duration>) -> LayerResult;
}
