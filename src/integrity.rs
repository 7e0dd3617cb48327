//! Post-parse integrity check for provider responses.
//!
//! A response that parses cleanly can still be the product of a successful
//! manipulation. This check rejects the telltale shapes; a rejected response
//! is excluded from consensus exactly as a transport failure would be.

use thiserror::Error;

use crate::types::ValidationOutput;

/// Phrases a manipulated model tends to admit to in its own feedback.
const ADMISSION_PHRASES: &[&str] = &[
    "ignore previous",
    "jailbroken",
    "bypassed",
    "hacked",
    "exploited",
    "manipulated",
    "tricked",
    "injection",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("all three scores are exactly 100")]
    PerfectTriple,

    #[error("all three scores uniformly {0}")]
    UniformExtreme(&'static str),

    #[error("feedback contains manipulation phrase '{0}'")]
    ManipulationPhrase(&'static str),
}

/// Inspect a parsed provider response for signs of manipulation.
pub fn check_response(output: &ValidationOutput) -> Result<(), IntegrityViolation> {
    let s = &output.scores;
    let triple = [s.relevance, s.continuity, s.documentation];

    if triple.iter().all(|&v| v == 100) {
        return Err(IntegrityViolation::PerfectTriple);
    }
    if triple.iter().all(|&v| v >= 95) {
        return Err(IntegrityViolation::UniformExtreme("high"));
    }
    if triple.iter().all(|&v| v <= 5) {
        return Err(IntegrityViolation::UniformExtreme("low"));
    }

    let feedback = format!(
        "{} {} {}",
        output.feedback.relevance, output.feedback.continuity, output.feedback.documentation
    )
    .to_lowercase();
    for phrase in ADMISSION_PHRASES.iter().copied() {
        if feedback.contains(phrase) {
            return Err(IntegrityViolation::ManipulationPhrase(phrase));
        }
    }

    Ok(())
}
