// ResultCache — content-addressed cache of cascade verdicts (spec §4.5).
//
// Backend errors never reach the cascade: both implementations swallow their
// own failures and log at `warn!`, returning a plain miss/no-op. The trait
// mirrors db::traits::Database's backend-agnostic shape from the scoring
// pipeline this crate is adapted from, trimmed to the two operations the
// cascade needs.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::model::{CascadeResult, Layer};

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn lookup(&self, key: &str) -> Option<CascadeResult>;
    async fn store(&self, key: &str, result: &CascadeResult, ttl: Duration);
}

/// `prefix:detect:sha256(text + "|" + sorted(layers).join(","))` (spec §4.5).
/// Layers are sorted first so `[1,2]` and `[2,1]` hash identically.
pub fn cache_key(prefix: &str, text: &str, layers: &[Layer]) -> String {
    let mut sorted: Vec<u8> = layers.iter().map(|l| l.as_u8()).collect();
    sorted.sort_unstable();
    let layer_list = sorted
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(layer_list.as_bytes());
    let digest = hasher.finalize();

    format!("{prefix}:detect:{}", hex::encode(digest))
}
