// JudgeAdjudicator — Layer 3 (spec §4.3).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::layers::DetectionLayer;
use crate::model::{Layer, LayerResult};

use super::provider::GenerativeProvider;
use super::sanitize::{characteristics, sanitize_snippet, HARDENED_SYSTEM_PROMPT};
use super::parse::parse_verdict;

pub struct JudgeAdjudicator {
    provider: Box<dyn GenerativeProvider>,
    confidence_cutoff: f64,
    timeout: Duration,
}

impl JudgeAdjudicator {
    pub fn new(
        provider: Box<dyn GenerativeProvider>,
        confidence_cutoff: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            confidence_cutoff,
            timeout,
        }
    }

    pub async fn adjudicate(&self, text: &str, deadline: Option<Duration>) -> LayerResult {
        let start = Instant::now();

        let snippet = sanitize_snippet(text);
        let facts = characteristics(text);
        let user_message = json!({
            "sanitized_snippet": snippet,
            "characteristics": facts,
        })
        .to_string();

        // Layer 3 MUST honor its own timeout even absent caller cancellation
        // (spec §5); when the caller also supplies a deadline, the tighter of
        // the two bounds the call.
        let cancelled_by_caller = matches!(deadline, Some(d) if d < self.timeout);
        let bound = deadline.map(|d| d.min(self.timeout)).unwrap_or(self.timeout);

        let raw_response = match tokio::time::timeout(
            bound,
            self.provider.complete(HARDENED_SYSTEM_PROMPT, &user_message),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(error = %e, "judge provider call failed");
                return LayerResult::fail_open(Layer::Three, elapsed_ms(start), e.to_string());
            }
            Err(_) if cancelled_by_caller => {
                return LayerResult::fail_open(
                    Layer::Three,
                    elapsed_ms(start),
                    "judge request cancelled: caller deadline exceeded",
                );
            }
            Err(_) => {
                return LayerResult::fail_open(
                    Layer::Three,
                    elapsed_ms(start),
                    "judge request timed out",
                );
            }
        };

        let verdict = match parse_verdict(&raw_response) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "failed to parse judge response");
                return LayerResult::fail_open(Layer::Three, elapsed_ms(start), e);
            }
        };

        let passes_cutoff = verdict.is_injection && verdict.confidence >= self.confidence_cutoff;

        if passes_cutoff {
            LayerResult::detected(
                Layer::Three,
                verdict.confidence,
                verdict.attack_type,
                elapsed_ms(start),
                Some(json!({
                    "reasoning": verdict.reasoning,
                    "raw_is_injection": verdict.is_injection,
                    "confidence_cutoff": self.confidence_cutoff,
                })),
            )
        } else {
            let mut result = LayerResult::benign(Layer::Three, elapsed_ms(start));
            result.details = Some(json!({
                "reasoning": verdict.reasoning,
                "raw_is_injection": verdict.is_injection,
                "raw_confidence": verdict.confidence,
                "confidence_cutoff": self.confidence_cutoff,
            }));
            result
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl DetectionLayer for JudgeAdjudicator {
    fn layer(&self) -> Layer {
        Layer::Three
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn run(&self, text: &str, deadline: Option<Duration>) -> LayerResult {
        self.adjudicate(text, deadline).await
    }
}
