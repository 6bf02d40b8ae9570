// SimilarityEngine — Layer 2 (spec §4.2).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::layers::DetectionLayer;
use crate::model::{Layer, LayerResult};

use super::corpus::AttackCorpus;
use super::provider::EmbeddingProvider;

pub struct SimilarityEngine {
    corpus: Option<AttackCorpus>,
    provider: Box<dyn EmbeddingProvider>,
    threshold: f64,
    timeout: Duration,
}

impl SimilarityEngine {
    pub fn new(
        corpus: Option<AttackCorpus>,
        provider: Box<dyn EmbeddingProvider>,
        threshold: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            corpus,
            provider,
            threshold,
            timeout,
        }
    }

    pub async fn match_text(&self, text: &str, deadline: Option<Duration>) -> LayerResult {
        let start = Instant::now();

        let Some(corpus) = &self.corpus else {
            return LayerResult::fail_open(
                Layer::Two,
                elapsed_ms(start),
                "attack-embedding corpus not loaded",
            );
        };

        // The caller's deadline bounds the call alongside the configured
        // timeout, never loosening it (spec §5: "Layer 2's embedding request
        // SHOULD use a similar bounded timeout"; SPEC_FULL §5 models
        // cancellation as this deadline).
        let cancelled_by_caller = matches!(deadline, Some(d) if d < self.timeout);
        let bound = deadline.map(|d| d.min(self.timeout)).unwrap_or(self.timeout);

        let embedding = match tokio::time::timeout(bound, self.provider.embed(text)).await {
            Ok(Ok(e)) => e,
            Ok(Err(e)) => {
                warn!(error = %e, "embedding provider call failed");
                return LayerResult::fail_open(Layer::Two, elapsed_ms(start), e.to_string());
            }
            Err(_) if cancelled_by_caller => {
                return LayerResult::fail_open(
                    Layer::Two,
                    elapsed_ms(start),
                    "embedding request cancelled: caller deadline exceeded",
                );
            }
            Err(_) => {
                return LayerResult::fail_open(
                    Layer::Two,
                    elapsed_ms(start),
                    "embedding request timed out",
                );
            }
        };

        let query_norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if query_norm <= f32::EPSILON {
            return LayerResult::benign(Layer::Two, elapsed_ms(start));
        }

        let scores = similarity_scores(corpus, &embedding, query_norm);
        let above_threshold = scores.iter().filter(|s| **s >= self.threshold).count();

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((index, &score)) if score >= self.threshold => {
                let meta = &corpus.metadata[index];
                LayerResult::detected(
                    Layer::Two,
                    score,
                    Some(meta.category),
                    elapsed_ms(start),
                    Some(json!({
                        "matched_index": index,
                        "subcategory": meta.subcategory,
                        "label": meta.label,
                        "threshold": self.threshold,
                        "matches_above_threshold": above_threshold,
                    })),
                )
            }
            _ => LayerResult::benign(Layer::Two, elapsed_ms(start)),
        }
    }

    /// Debug path exposing the top-k matches; not part of the cascade
    /// contract (spec §4.2 notes), grounded in original_source's
    /// `get_top_matches`.
    pub async fn top_matches(&self, text: &str, k: usize) -> Result<Vec<(usize, f64, String)>, String> {
        let corpus = self.corpus.as_ref().ok_or("attack-embedding corpus not loaded")?;
        let embedding = self
            .provider
            .embed(text)
            .await
            .map_err(|e| e.to_string())?;
        let query_norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if query_norm <= f32::EPSILON {
            return Ok(Vec::new());
        }

        let mut scores: Vec<(usize, f64)> = similarity_scores(corpus, &embedding, query_norm)
            .into_iter()
            .enumerate()
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scores
            .into_iter()
            .take(k)
            .map(|(index, score)| (index, score, corpus.metadata[index].label.clone()))
            .collect())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// `similarity[i] = (E[i] · e) / (||E[i]|| * ||e||)`, clamped to [0,1]
/// (spec §4.2 step 2/4). Corpus rows are already L2-normalized at load time
/// so this reduces to a dot product scaled by the query norm.
fn similarity_scores(corpus: &AttackCorpus, query: &[f32], query_norm: f32) -> Vec<f64> {
    (0..corpus.rows)
        .map(|row| {
            let start = row * corpus.cols;
            let end = start + corpus.cols;
            let row_slice = &corpus.matrix[start..end];
            let dot: f32 = row_slice
                .iter()
                .zip(query.iter())
                .map(|(a, b)| a * b)
                .sum();
            ((dot / query_norm) as f64).clamp(0.0, 1.0)
        })
        .collect()
}

#[async_trait]
impl DetectionLayer for SimilarityEngine {
    fn layer(&self) -> Layer {
        Layer::Two
    }

    async fn is_available(&self) -> bool {
        self.corpus.is_some()
    }

    async fn run(&self, text: &str, deadline: Option<Duration>) -> LayerResult {
        self.match_text(text, deadline).await
    }
}
