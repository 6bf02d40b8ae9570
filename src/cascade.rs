// Detector/Cascade orchestrator (spec §4.4). Layers run sequentially and in
// ascending order; the first positive verdict stops the cascade.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::cache::{self, ResultCache};
use crate::config::DetectorConfig;
use crate::error::DetectorError;
use crate::layers::judge::JudgeAdjudicator;
use crate::layers::pattern::PatternScanner;
use crate::layers::similarity::SimilarityEngine;
use crate::layers::DetectionLayer;
use crate::model::{CascadeResult, Layer};

/// Per-call overrides to `Detector::detect`. `layers` defaults to all three
/// when absent; the `Layer` type itself rejects out-of-range values, so a
/// caller building `DetectOptions` from raw integers (e.g. the CLI) gets
/// `DetectorError::InvalidInput` from `Layer::try_from` before a
/// `DetectOptions` carrying a bad value can even be constructed.
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub layers: Option<Vec<Layer>>,
    pub deadline: Option<Duration>,
}

impl DetectOptions {
    pub fn with_layers(layers: Vec<Layer>) -> Self {
        Self {
            layers: Some(layers),
            deadline: None,
        }
    }
}

pub struct Detector {
    config: DetectorConfig,
    layers: Vec<Box<dyn DetectionLayer>>,
    cache: Option<Box<dyn ResultCache>>,
}

impl Detector {
    /// Production constructor wiring the three concrete layers in ascending
    /// order. Tests that need to exercise orchestration rules in isolation
    /// use `from_layers` with hand-written `DetectionLayer` mocks instead.
    pub fn new(
        pattern: PatternScanner,
        similarity: SimilarityEngine,
        judge: JudgeAdjudicator,
        cache: Option<Box<dyn ResultCache>>,
        config: DetectorConfig,
    ) -> Self {
        Self::from_layers(
            vec![Box::new(pattern), Box::new(similarity), Box::new(judge)],
            cache,
            config,
        )
    }

    pub fn from_layers(
        layers: Vec<Box<dyn DetectionLayer>>,
        cache: Option<Box<dyn ResultCache>>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            config,
            layers,
            cache,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub async fn detect(
        &self,
        text: &str,
        opts: DetectOptions,
    ) -> Result<CascadeResult, DetectorError> {
        let requested = Self::resolve_requested_layers(opts.layers)?;

        let length = text.chars().count();
        if length > self.config.max_input_length {
            return Err(DetectorError::InvalidInput(format!(
                "input length {} exceeds max_input_length {}",
                length, self.config.max_input_length
            )));
        }

        if text.trim().is_empty() {
            return Ok(CascadeResult::empty());
        }

        let mut sorted_layers: Vec<Layer> = requested.iter().copied().collect();
        sorted_layers.sort();
        let key = self
            .cache
            .as_ref()
            .map(|_| cache::cache_key(&self.config.cache_prefix, text, &sorted_layers));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.lookup(key).await {
                return Ok(hit);
            }
        }

        let result = self.run_layers(text, &requested, opts.deadline).await;

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            cache.store(key, &result, self.config.cache_ttl).await;
        }

        Ok(result)
    }

    async fn run_layers(
        &self,
        text: &str,
        requested: &HashSet<Layer>,
        deadline: Option<Duration>,
    ) -> CascadeResult {
        let start = Instant::now();

        let mut layer_results = Vec::new();
        let mut errors = Vec::new();
        let mut layers_skipped = Vec::new();

        for layer_impl in &self.layers {
            let layer = layer_impl.layer();
            if !requested.contains(&layer) {
                continue;
            }
            if !layer_impl.is_available().await {
                layers_skipped.push(layer.as_u8());
                continue;
            }

            let result = layer_impl.run(text, deadline).await;
            if let Some(err) = &result.error {
                errors.push(format!("layer {} fail-open: {err}", layer.as_u8()));
            }
            let is_injection = result.is_injection;
            layer_results.push(result);
            if is_injection {
                break;
            }
        }

        let total_latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        let detection = layer_results.last().filter(|r| r.is_injection);

        CascadeResult {
            is_injection: detection.is_some(),
            confidence: detection.map(|r| r.confidence).unwrap_or(0.0),
            attack_type: detection.and_then(|r| r.attack_type),
            detected_by_layer: detection.map(|r| r.layer),
            layer_results,
            total_latency_ms,
            errors,
            layers_skipped,
        }
    }

    /// `None` defaults to all three layers; `Some([])` is rejected (spec
    /// §4.4 step 3: "requested_layers is a non-empty subset of {1,2,3}").
    fn resolve_requested_layers(
        layers: Option<Vec<Layer>>,
    ) -> Result<HashSet<Layer>, DetectorError> {
        match layers {
            None => Ok(Layer::ALL.into_iter().collect()),
            Some(ls) if ls.is_empty() => Err(DetectorError::InvalidInput(
                "requested layers must be a non-empty subset of {1,2,3}".to_string(),
            )),
            Some(ls) => Ok(ls.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::InMemoryResultCache;
    use crate::model::{AttackCategory, LayerResult};
    use async_trait::async_trait;

    struct FixedLayer {
        layer: Layer,
        available: bool,
        result: LayerResult,
    }

    #[async_trait]
    impl DetectionLayer for FixedLayer {
        fn layer(&self) -> Layer {
            self.layer
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        async fn run(&self, _text: &str, _deadline: Option<Duration>) -> LayerResult {
            self.result.clone()
        }
    }

    fn detector_with(layers: Vec<Box<dyn DetectionLayer>>) -> Detector {
        Detector::from_layers(layers, None, DetectorConfig::default())
    }

    #[tokio::test]
    async fn empty_input_short_circuits_to_empty_result() {
        let detector = detector_with(vec![]);
        let result = detector.detect("   ", DetectOptions::default()).await.unwrap();
        assert!(!result.is_injection);
        assert!(result.layer_results.is_empty());
        assert_eq!(result.total_latency_ms, 0.0);
    }

    #[tokio::test]
    async fn empty_requested_layers_is_rejected() {
        let detector = detector_with(vec![]);
        let err = detector
            .detect("hello", DetectOptions::with_layers(vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn over_length_input_is_rejected() {
        let config = DetectorConfig {
            max_input_length: 5,
            ..DetectorConfig::default()
        };
        let detector = Detector::from_layers(vec![], None, config);
        let err = detector
            .detect("too long for sure", DetectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn first_positive_layer_short_circuits_later_layers() {
        let layer_one = Box::new(FixedLayer {
            layer: Layer::One,
            available: true,
            result: LayerResult::detected(
                Layer::One,
                0.95,
                Some(AttackCategory::InstructionOverride),
                1.0,
                None,
            ),
        });
        let layer_two = Box::new(FixedLayer {
            layer: Layer::Two,
            available: true,
            result: LayerResult::benign(Layer::Two, 1.0),
        });
        let detector = detector_with(vec![layer_one, layer_two]);
        let result = detector
            .detect("ignore everything", DetectOptions::default())
            .await
            .unwrap();
        assert!(result.is_injection);
        assert_eq!(result.detected_by_layer, Some(Layer::One));
        assert_eq!(result.layer_results.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_layer_is_recorded_as_skipped() {
        let layer_two = Box::new(FixedLayer {
            layer: Layer::Two,
            available: false,
            result: LayerResult::benign(Layer::Two, 1.0),
        });
        let layer_three = Box::new(FixedLayer {
            layer: Layer::Three,
            available: true,
            result: LayerResult::benign(Layer::Three, 1.0),
        });
        let detector = detector_with(vec![layer_two, layer_three]);
        let result = detector
            .detect(
                "hello",
                DetectOptions::with_layers(vec![Layer::Two, Layer::Three]),
            )
            .await
            .unwrap();
        assert_eq!(result.layers_skipped, vec![2]);
        assert_eq!(result.layer_results.len(), 1);
        assert_eq!(result.layer_results[0].layer, Layer::Three);
    }

    #[tokio::test]
    async fn layer_not_requested_is_silently_absent_not_skipped() {
        let layer_one = Box::new(FixedLayer {
            layer: Layer::One,
            available: true,
            result: LayerResult::benign(Layer::One, 1.0),
        });
        let layer_two = Box::new(FixedLayer {
            layer: Layer::Two,
            available: true,
            result: LayerResult::benign(Layer::Two, 1.0),
        });
        let detector = detector_with(vec![layer_one, layer_two]);
        let result = detector
            .detect("hello", DetectOptions::with_layers(vec![Layer::One]))
            .await
            .unwrap();
        assert!(result.layers_skipped.is_empty());
        assert_eq!(result.layer_results.len(), 1);
    }

    #[tokio::test]
    async fn fail_open_layer_contributes_an_error_but_cascade_continues() {
        let layer_one = Box::new(FixedLayer {
            layer: Layer::One,
            available: true,
            result: LayerResult::fail_open(Layer::One, 1.0, "regex panic"),
        });
        let layer_two = Box::new(FixedLayer {
            layer: Layer::Two,
            available: true,
            result: LayerResult::benign(Layer::Two, 1.0),
        });
        let detector = detector_with(vec![layer_one, layer_two]);
        let result = detector.detect("hello", DetectOptions::default()).await.unwrap();
        assert!(!result.is_injection);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.layer_results.len(), 2);
    }

    #[tokio::test]
    async fn cache_hit_short_circuits_layer_execution() {
        let layer_one = Box::new(FixedLayer {
            layer: Layer::One,
            available: true,
            result: LayerResult::benign(Layer::One, 1.0),
        });
        let cached = CascadeResult {
            is_injection: true,
            confidence: 0.99,
            attack_type: Some(AttackCategory::Jailbreak),
            detected_by_layer: Some(Layer::One),
            layer_results: vec![],
            total_latency_ms: 0.0,
            errors: vec![],
            layers_skipped: vec![],
        };
        let cache = InMemoryResultCache::new();
        let key = cache::cache_key("detect", "hello", &[Layer::One]);
        cache.store(&key, &cached, Duration::from_secs(60)).await;

        let detector = Detector::from_layers(
            vec![layer_one],
            Some(Box::new(cache)),
            DetectorConfig::default(),
        );
        let result = detector
            .detect("hello", DetectOptions::with_layers(vec![Layer::One]))
            .await
            .unwrap();
        assert!(result.is_injection);
        assert_eq!(result.confidence, 0.99);
    }
}
