// Statistical reconciliation of surviving provider outputs. Pure functions
// of the successes list; no hidden state influences the result.

use crate::types::{ConsensusResult, CriteriaConfidence, CriteriaScores, ValidationOutput};

/// Score spread (in points) at which cross-provider confidence reaches zero.
const CONFIDENCE_SPREAD_SCALE: f64 = 50.0;

/// Reconcile surviving outputs into a consensus result.
///
/// Per criterion: consensus is the rounded mean, confidence is
/// `1 - std_dev/50` clamped into [0,1]. `overall` is the rounded mean of
/// the already-rounded consensus triple; the two rounding stages are
/// deliberate and must not be collapsed into one (see DESIGN.md).
///
/// `successes` must be non-empty; the orchestrator guarantees this.
pub fn aggregate(successes: Vec<ValidationOutput>, remote_success_count: usize) -> ConsensusResult {
    debug_assert!(!successes.is_empty(), "aggregate requires at least one success");

    let (relevance, relevance_conf) =
        criterion_stats(&successes, |s| s.scores.relevance);
    let (continuity, continuity_conf) =
        criterion_stats(&successes, |s| s.scores.continuity);
    let (documentation, documentation_conf) =
        criterion_stats(&successes, |s| s.scores.documentation);

    let overall = mean(&[relevance as f64, continuity as f64, documentation as f64]).round() as u8;
    let overall_confidence =
        (mean(&[relevance_conf, continuity_conf, documentation_conf]) * 100.0).round() / 100.0;

    ConsensusResult {
        consensus: CriteriaScores::new(relevance, continuity, documentation),
        overall,
        confidence: CriteriaConfidence {
            relevance: relevance_conf,
            continuity: continuity_conf,
            documentation: documentation_conf,
        },
        overall_confidence,
        successes,
        remote_success_count,
    }
}

/// Rounded mean and agreement confidence for one criterion.
fn criterion_stats(
    successes: &[ValidationOutput],
    criterion: impl Fn(&ValidationOutput) -> u8,
) -> (u8, f64) {
    let values: Vec<f64> = successes.iter().map(|s| criterion(s) as f64).collect();
    let mean = mean(&values);
    let spread = std_dev(&values, mean);
    let confidence = (1.0 - spread / CONFIDENCE_SPREAD_SCALE).clamp(0.0, 1.0);
    (mean.round() as u8, confidence)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
