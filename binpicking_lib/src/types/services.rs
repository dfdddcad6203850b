//! Request and response payloads of every service the emulator serves.
//!
//! All requests implement `Default` so an empty query is a valid call.

use crate::OperationRecord;
use serde::{Deserialize, Serialize};

/// InitializePose accepted the boundary poses
pub const INIT_RESULT_OK: i32 = 0;
/// InitializePose got a joint array of the wrong length
pub const INIT_RESULT_INVALID_JOINT_COUNT: i32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerWithIdRequest {
    /// Vision system id, or solution id for ChangeSolution
    #[serde(default)]
    pub id: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl TriggerResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn ok_with_message(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Joint positions as reported by the robot controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JointPositions {
    #[serde(default)]
    pub name: Vec<String>,
    pub position: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializePoseRequest {
    #[serde(default)]
    pub vision_system_id: i32,
    pub start_pose: JointPositions,
    pub end_pose: JointPositions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitializePoseResponse {
    pub success: bool,
    pub result: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationsRequest {
    #[serde(default)]
    pub vision_system_id: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationsResponse {
    pub operations: Vec<OperationRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddPointRequest {}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AddPointResponse {
    pub average_reprojection_error: f64,
    pub calibration_state: i32,
    pub too_close_indices: Vec<i32>,
    pub message: String,
    pub success: bool,
}
