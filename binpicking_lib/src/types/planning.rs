//! Wire payloads exchanged with the external motion planner and the bin
//! pose source.

use crate::{BinPose, CartesianPose, JointConfiguration, JointTrajectory};
use serde::{Deserialize, Serialize};

/// Goal of a single planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PlanTarget {
    /// Full joint space configuration
    Joints(JointConfiguration),
    /// Single end effector pose
    Pose(CartesianPose),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub group: String,
    /// Link that pose targets refer to
    pub end_effector_link: String,
    pub planner_id: String,
    pub goal_tolerance: f64,
    pub start_state: JointConfiguration,
    pub target: PlanTarget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanResponse {
    pub success: bool,
    #[serde(default)]
    pub trajectory: JointTrajectory,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartesianPathRequest {
    pub group: String,
    pub end_effector_link: String,
    pub start_state: JointConfiguration,
    pub waypoints: Vec<CartesianPose>,
    /// Max end effector distance between consecutive waypoints (metres)
    pub eef_step: f64,
    /// 0.0 disables the joint-space jump check
    pub jump_threshold: f64,
    pub avoid_collisions: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartesianPathResponse {
    /// Achieved share of the requested path, 0.0 ..= 1.0
    pub fraction: f64,
    #[serde(default)]
    pub trajectory: JointTrajectory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStateRequest {
    pub group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStateResponse {
    pub positions: JointConfiguration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinPoseRequest {}

pub type BinPoseResponse = BinPose;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_target_is_tagged() {
        let target = PlanTarget::Joints(JointConfiguration(vec![0.1, 0.2]));
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["type"], "Joints");
        assert_eq!(json["value"][1], 0.2);

        let back: PlanTarget = serde_json::from_value(json).unwrap();
        assert_eq!(back, target);
    }

    #[test]
    fn test_failed_plan_response_may_omit_trajectory() {
        let resp: PlanResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.trajectory.is_empty());
    }
}
