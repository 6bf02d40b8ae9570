// Shared result types for the detection cascade: LayerResult, CascadeResult,
// the pattern catalog entry type, and the closed attack-category vocabulary.
//
// Construction is funneled through a handful of constructors so the
// error/is_injection/confidence invariants can't be built wrong by callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DetectorError;

/// Which stage of the cascade produced a [`LayerResult`].
///
/// Serializes as the bare integer (1, 2, 3) to match the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Layer {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::One, Layer::Two, Layer::Three];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Layer {
    type Error = DetectorError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Layer::One),
            2 => Ok(Layer::Two),
            3 => Ok(Layer::Three),
            other => Err(DetectorError::InvalidInput(format!(
                "layer {other} is not in {{1,2,3}}"
            ))),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

impl Serialize for Layer {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Layer::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// The closed vocabulary of attack-type tags. Any tag outside this set is
/// discarded at the parsing boundary rather than carried forward as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackCategory {
    InstructionOverride,
    Jailbreak,
    DelimiterInjection,
    DataExtraction,
    IndirectInjection,
    ContextManipulation,
    Obfuscation,
    HypotheticalFraming,
    MultilingualInjection,
}

impl AttackCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackCategory::InstructionOverride => "instruction_override",
            AttackCategory::Jailbreak => "jailbreak",
            AttackCategory::DelimiterInjection => "delimiter_injection",
            AttackCategory::DataExtraction => "data_extraction",
            AttackCategory::IndirectInjection => "indirect_injection",
            AttackCategory::ContextManipulation => "context_manipulation",
            AttackCategory::Obfuscation => "obfuscation",
            AttackCategory::HypotheticalFraming => "hypothetical_framing",
            AttackCategory::MultilingualInjection => "multilingual_injection",
        }
    }
}

impl fmt::Display for AttackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AttackCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instruction_override" => Ok(AttackCategory::InstructionOverride),
            "jailbreak" => Ok(AttackCategory::Jailbreak),
            "delimiter_injection" => Ok(AttackCategory::DelimiterInjection),
            "data_extraction" => Ok(AttackCategory::DataExtraction),
            "indirect_injection" => Ok(AttackCategory::IndirectInjection),
            "context_manipulation" => Ok(AttackCategory::ContextManipulation),
            "obfuscation" => Ok(AttackCategory::Obfuscation),
            "hypothetical_framing" => Ok(AttackCategory::HypotheticalFraming),
            "multilingual_injection" => Ok(AttackCategory::MultilingualInjection),
            _ => Err(()),
        }
    }
}

/// Verdict from a single cascade layer.
///
/// Invariant: `error.is_some() => !is_injection && confidence == 0.0`. The
/// three constructors below are the only supported way to build one, so the
/// invariant holds by construction rather than by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer: Layer,
    pub is_injection: bool,
    pub confidence: f64,
    pub attack_type: Option<AttackCategory>,
    pub latency_ms: f64,
    pub details: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl LayerResult {
    pub fn benign(layer: Layer, latency_ms: f64) -> Self {
        Self {
            layer,
            is_injection: false,
            confidence: 0.0,
            attack_type: None,
            latency_ms: latency_ms.max(0.0),
            details: None,
            error: None,
        }
    }

    pub fn detected(
        layer: Layer,
        confidence: f64,
        attack_type: Option<AttackCategory>,
        latency_ms: f64,
        details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            layer,
            is_injection: true,
            confidence: confidence.clamp(0.0, 1.0),
            attack_type,
            latency_ms: latency_ms.max(0.0),
            details,
            error: None,
        }
    }

    pub fn fail_open(layer: Layer, latency_ms: f64, error: impl Into<String>) -> Self {
        Self {
            layer,
            is_injection: false,
            confidence: 0.0,
            attack_type: None,
            latency_ms: latency_ms.max(0.0),
            details: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate verdict returned by [`crate::cascade::Detector::detect`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeResult {
    pub is_injection: bool,
    pub confidence: f64,
    pub attack_type: Option<AttackCategory>,
    pub detected_by_layer: Option<Layer>,
    pub layer_results: Vec<LayerResult>,
    pub total_latency_ms: f64,
    pub errors: Vec<String>,
    pub layers_skipped: Vec<u8>,
}

impl CascadeResult {
    /// The no-op result for empty/whitespace-only input (spec §4.4).
    pub fn empty() -> Self {
        Self {
            is_injection: false,
            confidence: 0.0,
            attack_type: None,
            detected_by_layer: None,
            layer_results: Vec::new(),
            total_latency_ms: 0.0,
            errors: Vec::new(),
            layers_skipped: Vec::new(),
        }
    }
}

/// A compiled entry in the Layer 1 pattern catalog.
pub struct InjectionPattern {
    pub name: &'static str,
    pub category: AttackCategory,
    pub confidence: f64,
    pub description: &'static str,
    pub regex: regex::Regex,
}

/// The full Layer 1 catalog. Built once behind a `LazyLock`, read-only
/// thereafter (spec §3: "loaded once at startup and immutable").
pub struct PatternCatalog {
    pub patterns: Vec<InjectionPattern>,
}

impl PatternCatalog {
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// One row of the Layer 2 attack-embedding corpus metadata sidecar, aligned
/// by `index` with the corresponding row of the embedding matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackEmbedding {
    pub index: usize,
    pub category: AttackCategory,
    pub subcategory: Option<String>,
    pub label: String,
}
