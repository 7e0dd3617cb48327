pub mod config;
pub mod types;
pub mod safety; // Injection gate + soft sanitizer
pub mod prompt; // Rubric prompt builder
pub mod provider; // Model provider adapters + stub
pub mod integrity; // Response integrity checker
pub mod consensus; // Parallel dispatch + aggregation

pub use consensus::{BatchValidator, ValidationError};
pub use types::{
    AssignmentContext, ConsensusResult, ContentType, CriteriaConfidence, CriteriaFeedback,
    CriteriaScores, ValidationOutput, ValidationRequest,
};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries and examples embedding the engine.
/// Library consumers with their own subscriber should skip this.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
