use serde::{Deserialize, Serialize};

/// Ordered joint values of the planning group, one per joint (radians).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointConfiguration(pub Vec<f64>);

impl JointConfiguration {
    /// All-zero configuration for `dof` joints.
    pub fn zeros(dof: usize) -> Self {
        Self(vec![0.0; dof])
    }

    pub fn positions(&self) -> &[f64] {
        &self.0
    }

    /// Space separated rendering used in service logs.
    pub fn to_log_string(&self) -> String {
        self.0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<f64>> for JointConfiguration {
    fn from(positions: Vec<f64>) -> Self {
        Self(positions)
    }
}

/// One waypoint of a planned joint trajectory, including its timing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointTrajectoryPoint {
    pub positions: Vec<f64>,
    #[serde(default)]
    pub velocities: Vec<f64>,
    #[serde(default)]
    pub accelerations: Vec<f64>,
    /// Seconds since the start of the trajectory
    pub time_from_start: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointTrajectory {
    #[serde(default)]
    pub joint_names: Vec<String>,
    pub points: Vec<JointTrajectoryPoint>,
}

impl JointTrajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Joint configuration reached at the final waypoint.
    pub fn final_configuration(&self) -> Option<JointConfiguration> {
        self.points
            .last()
            .map(|point| JointConfiguration(point.positions.clone()))
    }

    pub fn total_time(&self) -> f64 {
        self.points
            .last()
            .map(|point| point.time_from_start)
            .unwrap_or(0.0)
    }
}
