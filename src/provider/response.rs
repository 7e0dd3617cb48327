// Shared handling of raw provider text: JSON extraction, the error escape
// hatch, score clamping, and lenient feedback defaults. Remote adapters all
// funnel through parse_score_response so they cannot drift apart.

use serde::Deserialize;

use super::ProviderError;
use crate::types::{CriteriaFeedback, CriteriaScores, ValidationOutput};

/// Wire shape of a provider's answer. Scores arrive as numbers (some models
/// emit 87.0), feedback fields may be missing entirely.
#[derive(Deserialize)]
struct RawScorePayload {
    error: Option<String>,
    relevance: Option<f64>,
    continuity: Option<f64>,
    documentation: Option<f64>,
    relevance_feedback: Option<String>,
    continuity_feedback: Option<String>,
    documentation_feedback: Option<String>,
}

/// Parse a provider's raw text into a `ValidationOutput`.
///
/// Accepts bare JSON or JSON inside a code fence (models add fences despite
/// instructions). Each score is clamped into [0,100]; missing feedback
/// defaults to empty text. The contract's error escape hatch surfaces as
/// `ProviderError::Unprocessable`.
pub fn parse_score_response(
    provider_id: &str,
    raw: &str,
) -> Result<ValidationOutput, ProviderError> {
    let json_str = extract_json(raw)?;

    let payload: RawScorePayload = serde_json::from_str(&json_str)
        .map_err(|e| ProviderError::JsonParsing(e.to_string()))?;

    if let Some(reason) = payload.error {
        return Err(ProviderError::Unprocessable(reason));
    }

    let scores = CriteriaScores::new(
        clamp_score(payload.relevance, "relevance")?,
        clamp_score(payload.continuity, "continuity")?,
        clamp_score(payload.documentation, "documentation")?,
    );

    Ok(ValidationOutput {
        provider_id: provider_id.to_string(),
        scores,
        feedback: CriteriaFeedback {
            relevance: payload.relevance_feedback.unwrap_or_default(),
            continuity: payload.continuity_feedback.unwrap_or_default(),
            documentation: payload.documentation_feedback.unwrap_or_default(),
        },
    })
}

/// Pull the JSON object out of the raw response text.
fn extract_json(raw: &str) -> Result<String, ProviderError> {
    let trimmed = raw.trim();

    // Fenced block first (```json ... ``` or bare ``` ... ```)
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let content_start = start + fence.len();
            if let Some(end) = trimmed[content_start..].find("```") {
                let inner = trimmed[content_start..content_start + end].trim();
                if inner.starts_with('{') {
                    return Ok(inner.to_string());
                }
            }
        }
    }

    // Otherwise the outermost braces
    let start = trimmed
        .find('{')
        .ok_or_else(|| ProviderError::MalformedResponse("no JSON object in response".into()))?;
    let end = trimmed
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| ProviderError::MalformedResponse("unterminated JSON object".into()))?;

    Ok(trimmed[start..=end].to_string())
}

fn clamp_score(value: Option<f64>, criterion: &str) -> Result<u8, ProviderError> {
    match value {
        Some(v) if v.is_finite() => Ok(v.clamp(0.0, 100.0).round() as u8),
        Some(_) => Err(ProviderError::MalformedResponse(format!(
            "non-finite {criterion} score"
        ))),
        None => Err(ProviderError::MalformedResponse(format!(
            "missing {criterion} score"
        ))),
    }
}
