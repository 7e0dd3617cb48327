use serde::{Deserialize, Serialize};

/// A validation request as handed over by the calling layer.
///
/// The engine owns nothing about where the content came from; callers are
/// responsible for persistence and authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub content: String,
    pub context: Option<AssignmentContext>,
}

impl ValidationRequest {
    pub fn standalone(content: &str) -> Self {
        Self {
            content: content.to_string(),
            context: None,
        }
    }

    pub fn with_context(content: &str, context: AssignmentContext) -> Self {
        Self {
            content: content.to_string(),
            context: Some(context),
        }
    }
}

/// Assignment metadata attached to a request. Constructed once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentContext {
    pub topic: String,
    pub prerequisite_topics: Vec<String>,
    pub guidelines: Option<String>,
    pub content_type: ContentType,
}

/// What kind of course material is being validated. The rubric, and the
/// meaning of each criterion, depends on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    Assignment,
    PreRead,
    LectureNote,
}

/// The three scored criteria, each in [0,100].
///
/// Semantics shift with content type, but the triple always maps to
/// structure/format, topic or prerequisite coverage, and quality/clarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub relevance: u8,
    pub continuity: u8,
    pub documentation: u8,
}

impl CriteriaScores {
    pub fn new(relevance: u8, continuity: u8, documentation: u8) -> Self {
        Self {
            relevance: relevance.min(100),
            continuity: continuity.min(100),
            documentation: documentation.min(100),
        }
    }
}

/// Per-criterion feedback strings (≤50 words each by prompt contract).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaFeedback {
    pub relevance: String,
    pub continuity: String,
    pub documentation: String,
}

/// One provider's verdict on a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutput {
    pub provider_id: String,
    pub scores: CriteriaScores,
    pub feedback: CriteriaFeedback,
}

/// Per-criterion cross-provider agreement, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriteriaConfidence {
    pub relevance: f64,
    pub continuity: f64,
    pub documentation: f64,
}

/// The reconciled result of one batch validation.
///
/// `successes` holds the raw surviving per-provider outputs for audit;
/// `consensus` and `overall` are deterministic functions of it alone.
/// `remote_success_count` is 0 when the result rests entirely on the stub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub consensus: CriteriaScores,
    pub overall: u8,
    pub confidence: CriteriaConfidence,
    pub overall_confidence: f64,
    pub successes: Vec<ValidationOutput>,
    pub remote_success_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_clamped_on_construction() {
        let scores = CriteriaScores::new(150, 80, 200);
        assert_eq!(scores.relevance, 100);
        assert_eq!(scores.continuity, 80);
        assert_eq!(scores.documentation, 100);
    }

    #[test]
    fn content_type_wire_names() {
        let json = serde_json::to_string(&ContentType::LectureNote).unwrap();
        assert_eq!(json, "\"LECTURE_NOTE\"");
        let back: ContentType = serde_json::from_str("\"PRE_READ\"").unwrap();
        assert_eq!(back, ContentType::PreRead);
    }

    #[test]
    fn consensus_result_round_trips_through_json() {
        let result = ConsensusResult {
            consensus: CriteriaScores::new(82, 72, 91),
            overall: 82,
            confidence: CriteriaConfidence {
                relevance: 0.96,
                continuity: 0.96,
                documentation: 0.98,
            },
            overall_confidence: 0.97,
            successes: vec![ValidationOutput {
                provider_id: "gemini".into(),
                scores: CriteriaScores::new(80, 70, 90),
                feedback: CriteriaFeedback::default(),
            }],
            remote_success_count: 1,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: ConsensusResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.consensus, result.consensus);
        assert_eq!(back.successes.len(), 1);
        assert_eq!(back.remote_success_count, 1);
    }
}
