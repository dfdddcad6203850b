use crate::error::PoseStoreError;
use binpicking_lib::JointConfiguration;
use std::sync::{PoisonError, RwLock};

struct BoundaryPoses {
    start: JointConfiguration,
    end: JointConfiguration,
    initialized: bool,
}

/// Start and end joint configurations of the pick cycle, as last sent by
/// the robot through InitializePose.
pub struct PoseStore {
    dof: usize,
    poses: RwLock<BoundaryPoses>,
}

impl PoseStore {
    pub fn new(dof: usize) -> Self {
        Self {
            dof,
            poses: RwLock::new(BoundaryPoses {
                start: JointConfiguration::zeros(dof),
                end: JointConfiguration::zeros(dof),
                initialized: false,
            }),
        }
    }

    /// Replace both poses. Nothing is stored unless both have exactly `dof`
    /// values.
    pub fn set_boundary_poses(
        &self,
        start: Vec<f64>,
        end: Vec<f64>,
    ) -> Result<(), PoseStoreError> {
        for (which, pose) in [("start", &start), ("end", &end)] {
            if pose.len() != self.dof {
                return Err(PoseStoreError::JointCountMismatch {
                    which,
                    got: pose.len(),
                    expected: self.dof,
                });
            }
        }

        let mut poses = self.poses.write().unwrap_or_else(PoisonError::into_inner);
        poses.start = start.into();
        poses.end = end.into();
        poses.initialized = true;
        Ok(())
    }

    /// Last stored pair, zero-filled if never set.
    pub fn boundary_poses(&self) -> (JointConfiguration, JointConfiguration) {
        let poses = self.poses.read().unwrap_or_else(PoisonError::into_inner);
        (poses.start.clone(), poses.end.clone())
    }

    /// Last stored pair, or `None` before the first initialization.
    pub fn initialized_boundary_poses(&self) -> Option<(JointConfiguration, JointConfiguration)> {
        let poses = self.poses.read().unwrap_or_else(PoisonError::into_inner);
        poses
            .initialized
            .then(|| (poses.start.clone(), poses.end.clone()))
    }
}
