use std::fmt;
use serde::Serialize;
use nr_core::WorkflowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    Analysis,
    Summary,
    ErrorHandler,
    End,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::End)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Research => "research",
            Stage::Analysis => "analysis",
            Stage::Summary => "summary",
            Stage::ErrorHandler => "error_handler",
            Stage::End => "end",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the workflow goes after `current` has run on `state`.
pub fn next_stage(current: Stage, state: &WorkflowState) -> Stage {
    match current {
        Stage::ErrorHandler | Stage::End => Stage::End,
        _ if state.has_error() => Stage::ErrorHandler,
        _ => match state.step_count {
            1 => Stage::Analysis,
            2 => Stage::Summary,
            _ => Stage::End,
        },
    }
}
