// Verdict extraction from a generative model response (spec §4.3 step 4).
//
// Models wrap JSON in prose or code fences more often than not, so the
// first balanced `{...}` substring is extracted by brace counting rather
// than assumed to be the whole response.

use std::str::FromStr;

use serde::Deserialize;

use crate::model::AttackCategory;

#[derive(Debug, Clone, PartialEq)]
pub struct JudgeVerdict {
    pub is_injection: bool,
    pub confidence: f64,
    pub attack_type: Option<AttackCategory>,
    pub reasoning: String,
}

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    is_injection: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    attack_type: Option<String>,
    #[serde(default)]
    reasoning: String,
}

/// Returns the first balanced `{...}` substring in `text`, or `None` if
/// braces never balance.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0i32;
    for (offset, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and clamp a raw model response into a `JudgeVerdict`. Any
/// malformed or unparseable `attack_type` is treated as absent rather than
/// rejecting the whole verdict.
pub fn parse_verdict(raw_response: &str) -> Result<JudgeVerdict, String> {
    let object = extract_json_object(raw_response)
        .ok_or_else(|| "no JSON object found in judge response".to_string())?;

    let raw: RawVerdict =
        serde_json::from_str(object).map_err(|e| format!("malformed judge response: {e}"))?;

    let attack_type = raw
        .attack_type
        .as_deref()
        .and_then(|s| AttackCategory::from_str(s).ok());

    Ok(JudgeVerdict {
        is_injection: raw.is_injection,
        confidence: raw.confidence.clamp(0.0, 1.0),
        attack_type,
        reasoning: raw.reasoning.chars().take(500).collect(),
    })
}
