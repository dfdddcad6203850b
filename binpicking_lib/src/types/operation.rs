use crate::JointTrajectoryPoint;
use serde::{Deserialize, Serialize};

/// Kind of a single operation handed to the robot-side executor.
///
/// Encoded on the wire by its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum OperationType {
    /// Continuous motion, blending allowed (approach and end legs)
    TrajectoryCoarse = 1,
    /// Precise motion through every waypoint (grasp and deapproach legs)
    TrajectoryFine = 2,
    Gripper = 3,
    Error = 4,
    Info = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum GripperCommand {
    #[default]
    None = 0,
    Open = 1,
    Close = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ErrorCode {
    #[default]
    None = 0,
    PlanningFailed = 1,
    PoseSourceUnavailable = 2,
    ConfigurationMissing = 3,
    PlanningTimeout = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum InfoCode {
    #[default]
    None = 0,
    ToolInvariance = 1,
    GrippingPoint = 2,
    GrippingPointInvariance = 3,
}

macro_rules! impl_wire_code {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$ty> for i32 {
            fn from(value: $ty) -> i32 {
                value as i32
            }
        }

        impl TryFrom<i32> for $ty {
            type Error = String;

            fn try_from(code: i32) -> Result<Self, String> {
                $(
                    if code == $ty::$variant as i32 {
                        return Ok($ty::$variant);
                    }
                )+
                Err(format!("unknown {} code {}", stringify!($ty), code))
            }
        }
    };
}

impl_wire_code!(OperationType {
    TrajectoryCoarse,
    TrajectoryFine,
    Gripper,
    Error,
    Info,
});
impl_wire_code!(GripperCommand { None, Open, Close });
impl_wire_code!(ErrorCode {
    None,
    PlanningFailed,
    PoseSourceUnavailable,
    ConfigurationMissing,
    PlanningTimeout,
});
impl_wire_code!(InfoCode {
    None,
    ToolInvariance,
    GrippingPoint,
    GrippingPointInvariance,
});

/// One serialized instruction returned by the trajectory services.
///
/// Only the fields relevant to `operation_type` carry values; the rest stay
/// at their neutral defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub operation_type: OperationType,
    pub points: Vec<JointTrajectoryPoint>,
    pub gripper: GripperCommand,
    pub error: ErrorCode,
    pub info: InfoCode,
}

impl OperationRecord {
    fn blank(operation_type: OperationType) -> Self {
        Self {
            operation_type,
            points: Vec::new(),
            gripper: GripperCommand::None,
            error: ErrorCode::None,
            info: InfoCode::None,
        }
    }

    pub fn trajectory_coarse(points: Vec<JointTrajectoryPoint>) -> Self {
        Self {
            points,
            ..Self::blank(OperationType::TrajectoryCoarse)
        }
    }

    pub fn trajectory_fine(points: Vec<JointTrajectoryPoint>) -> Self {
        Self {
            points,
            ..Self::blank(OperationType::TrajectoryFine)
        }
    }

    pub fn gripper(command: GripperCommand) -> Self {
        Self {
            gripper: command,
            ..Self::blank(OperationType::Gripper)
        }
    }

    pub fn error(code: ErrorCode) -> Self {
        Self {
            error: code,
            ..Self::blank(OperationType::Error)
        }
    }

    pub fn info(code: InfoCode) -> Self {
        Self {
            info: code,
            ..Self::blank(OperationType::Info)
        }
    }

    pub fn is_trajectory(&self) -> bool {
        matches!(
            self.operation_type,
            OperationType::TrajectoryCoarse | OperationType::TrajectoryFine
        )
    }
}
