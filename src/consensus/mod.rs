pub mod aggregate;
pub mod orchestrator;

pub use aggregate::aggregate;
pub use orchestrator::BatchValidator;

use thiserror::Error;

use crate::safety::GateError;

/// The only error a caller of the batch pipeline ever sees. Provider and
/// integrity failures degrade the batch instead of surfacing here.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("content rejected before dispatch: {0}")]
    InputRejected(#[from] GateError),
}
