pub mod builder;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod sweeper;

pub use builder::OrchestratorBuilder;
pub use error::OrchestratorError;
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use orchestrator::{
    CallbackOutcome, CreatedSession, RetrievedArtifact, SessionOrchestrator, StatusReport,
};
pub use sweeper::{ExpirySweeper, SweeperConfig};
