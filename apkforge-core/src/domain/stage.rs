//! Stage result types

use serde::{Deserialize, Serialize};

/// Outcome of a single pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    Succeeded,
    Failed,
}

/// Record of one executed stage
///
/// Appended in execution order; a job's results are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub outcome: StageOutcome,
    pub message: String,
}

impl StageResult {
    pub fn succeeded(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            outcome: StageOutcome::Succeeded,
            message: message.into(),
        }
    }

    pub fn failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            outcome: StageOutcome::Failed,
            message: message.into(),
        }
    }
}
