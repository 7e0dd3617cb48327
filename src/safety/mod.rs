pub mod gate;
pub mod sanitize;

pub use gate::check_injection;
pub use sanitize::sanitize;

use thiserror::Error;

/// Why the injection gate refused a piece of content.
///
/// A gate hit means no prompt is built and no provider is called; the
/// caller sees this as a distinct rejection, never as a low score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("content matches manipulation signature: {0}")]
    ManipulationSignature(String),

    #[error("term '{term}' repeated {count} times (limit {limit})")]
    ExcessiveRepetition {
        term: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("content length {length} exceeds limit of {limit} characters")]
    ContentTooLong { length: usize, limit: usize },
}
