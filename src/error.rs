// Public error boundary for the detection library.
//
// Every other error kind in the spec's taxonomy (layer_fail_open,
// backend_unavailable, cache_fault, cancelled) is realized as data on
// LayerResult/CascadeResult rather than as a Rust Err — see model.rs and
// cascade.rs. InvalidInput is the only variant a caller can receive from
// Detector::detect.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
