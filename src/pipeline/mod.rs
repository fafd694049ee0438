// Plant report ingestion pipeline: normalize four sources, merge them on
// line_id, validate against the data contract, forward downstream.

pub mod audit;
pub mod contract;
pub mod error;
pub mod forward;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod orchestrator;

// Re-export core types
pub use audit::AuditStore;
pub use contract::{CliContractValidator, ContractTemplate, ContractValidator};
pub use error::{PipelineError, PipelineFailure, Source};
pub use forward::{Forwarder, HttpForwarder};
pub use merge::{merge, merge_at};
pub use model::*;
pub use orchestrator::{NormalizedSources, Pipeline, PipelineOutcome, PipelineStage};
