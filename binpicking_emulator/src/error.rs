use crate::planner::PlanStage;
use binpicking_lib::ErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Why a trajectory request produced an Error operation instead of a plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// The planner returned no valid (or only a partial) trajectory.
    #[error("Planning failed at stage {stage}")]
    PlanningFailed { stage: PlanStage },

    /// The bin pose source did not answer.
    #[error("Bin pose source unavailable: {0}")]
    PoseSourceUnavailable(String),

    /// Start/end poses were never sent through InitializePose.
    #[error("Boundary poses were never initialized")]
    ConfigurationMissing,

    #[error("Planner did not answer within {timeout:?} at stage {stage}")]
    PlanningTimeout { stage: PlanStage, timeout: Duration },
}

impl PlanningError {
    /// Code carried by the Error operation record.
    pub fn code(&self) -> ErrorCode {
        match self {
            PlanningError::PlanningFailed { .. } => ErrorCode::PlanningFailed,
            PlanningError::PoseSourceUnavailable(_) => ErrorCode::PoseSourceUnavailable,
            PlanningError::ConfigurationMissing => ErrorCode::ConfigurationMissing,
            PlanningError::PlanningTimeout { .. } => ErrorCode::PlanningTimeout,
        }
    }
}

/// Failure talking to a remote collaborator (planner or pose source).
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Query to {key} failed: {message}")]
    Query { key: String, message: String },

    #[error("No reply from {key}")]
    NoReply { key: String },

    #[error("Invalid payload for {key}: {source}")]
    Payload {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseStoreError {
    #[error("{which} pose has {got} joints, expected {expected}")]
    JointCountMismatch {
        which: &'static str,
        got: usize,
        expected: usize,
    },
}

/// A service call that could not be answered with a response payload.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Malformed request: {0}")]
    BadRequest(#[source] serde_json::Error),

    #[error("Failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let failed = PlanningError::PlanningFailed {
            stage: PlanStage::ToGrasp,
        };
        assert_eq!(failed.code(), ErrorCode::PlanningFailed);
        assert_eq!(failed.to_string(), "Planning failed at stage to_grasp");

        assert_eq!(
            PlanningError::ConfigurationMissing.code(),
            ErrorCode::ConfigurationMissing
        );
        assert_eq!(
            PlanningError::PoseSourceUnavailable("timeout".into()).code(),
            ErrorCode::PoseSourceUnavailable
        );
        assert_eq!(
            PlanningError::PlanningTimeout {
                stage: PlanStage::ToEnd,
                timeout: Duration::from_secs(1),
            }
            .code(),
            ErrorCode::PlanningTimeout
        );
    }
}
