pub mod analysis;
pub mod prompts;
pub mod stage;
pub mod workflow;

pub use stage::{next_stage, Stage};
pub use workflow::AnalysisWorkflow;

pub mod prelude {
    pub use super::{AnalysisWorkflow, Stage};
    pub use nr_core::{AnalysisRecord, Result, WorkflowState};
}
