//! Seams to the external collaborators and the per-request planning session.
//!
//! The motion planner keeps a mutable start state between calls, the same
//! way a MoveIt move group does. A [`PlanningSession`] holds the planner's
//! mutex for its whole lifetime, so one trajectory request owns that state
//! from the first stage to the last.

use crate::error::{PlanningError, RemoteError};
use async_trait::async_trait;
use binpicking_lib::{BinPose, CartesianPose, JointConfiguration, JointTrajectory, PlanTarget};
use std::fmt;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Result of a constrained Cartesian path computation.
#[derive(Debug, Clone, Default)]
pub struct CartesianPath {
    /// Achieved share of the requested path, 0.0 ..= 1.0
    pub fraction: f64,
    pub trajectory: JointTrajectory,
}

#[async_trait]
pub trait MotionPlanner: Send {
    /// Live joint state of the planning group.
    async fn current_state(&mut self) -> Result<JointConfiguration, RemoteError>;

    /// Start subsequent plans from `state` instead of the live state.
    fn set_start_state(&mut self, state: JointConfiguration);

    /// Start subsequent plans from the live state again.
    fn set_start_state_to_current(&mut self);

    /// Plan to a joint or pose target. `Ok(None)` means the planner found no
    /// solution.
    async fn plan(&mut self, target: &PlanTarget) -> Result<Option<JointTrajectory>, RemoteError>;

    /// Plan a path that follows the straight interpolation through
    /// `waypoints`.
    async fn compute_cartesian_path(
        &mut self,
        waypoints: &[CartesianPose],
    ) -> Result<CartesianPath, RemoteError>;
}

/// Source of the approach/grasp/deapproach poses of the next pick.
#[async_trait]
pub trait PoseSource: Send + Sync {
    async fn bin_pose(&self) -> Result<BinPose, RemoteError>;
}

/// One leg of the pick sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanStage {
    ToStart,
    ToApproach,
    ToGrasp,
    ToDeapproach,
    ToEnd,
}

impl fmt::Display for PlanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanStage::ToStart => "to_start",
            PlanStage::ToApproach => "to_approach",
            PlanStage::ToGrasp => "to_grasp",
            PlanStage::ToDeapproach => "to_deapproach",
            PlanStage::ToEnd => "to_end",
        };
        f.write_str(name)
    }
}

/// Goal of a single stage.
#[derive(Debug, Clone, Copy)]
pub enum StageTarget<'a> {
    Joints(&'a JointConfiguration),
    Pose(&'a CartesianPose),
    /// Constrained path through the waypoints; anything short of full
    /// completion is a failure
    CartesianPath(&'a [CartesianPose]),
}

/// Successful plan of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResult {
    pub stage: PlanStage,
    pub trajectory: JointTrajectory,
}

/// Exclusive checkout of the planner for one trajectory request.
pub struct PlanningSession<'a, P: MotionPlanner> {
    planner: MutexGuard<'a, P>,
    timeout: Duration,
}

impl<'a, P: MotionPlanner> PlanningSession<'a, P> {
    /// Wait for the planner to be free and start from its live state.
    pub async fn checkout(planner: &'a Mutex<P>, timeout: Duration) -> PlanningSession<'a, P> {
        let mut planner = planner.lock().await;
        planner.set_start_state_to_current();
        PlanningSession { planner, timeout }
    }

    /// Override the start state of the next stage.
    pub fn seed(&mut self, state: JointConfiguration) {
        self.planner.set_start_state(state);
    }

    /// Plan one stage. On success the final waypoint becomes the start
    /// state of the next stage, standing in for executing the trajectory.
    pub async fn plan_stage(
        &mut self,
        stage: PlanStage,
        target: StageTarget<'_>,
    ) -> Result<PlanResult, PlanningError> {
        let planner = &mut *self.planner;

        let call = async move {
            let outcome: Result<Option<JointTrajectory>, RemoteError> = match target {
                StageTarget::Joints(joints) => {
                    planner.plan(&PlanTarget::Joints(joints.clone())).await
                }
                StageTarget::Pose(pose) => planner.plan(&PlanTarget::Pose(*pose)).await,
                StageTarget::CartesianPath(waypoints) => {
                    let path = planner.compute_cartesian_path(waypoints).await?;
                    info!(
                        "Stage {} Cartesian path: {:.2}% achieved",
                        stage,
                        path.fraction * 100.0
                    );
                    Ok((path.fraction >= 1.0).then_some(path.trajectory))
                }
            };
            outcome
        };

        let outcome = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| PlanningError::PlanningTimeout {
                stage,
                timeout: self.timeout,
            })?;

        let trajectory = match outcome {
            Ok(Some(trajectory)) if !trajectory.is_empty() => trajectory,
            Ok(Some(_)) => {
                warn!("Stage {}: planner returned an empty trajectory", stage);
                return Err(PlanningError::PlanningFailed { stage });
            }
            Ok(None) => {
                warn!("Stage {}: no solution found", stage);
                return Err(PlanningError::PlanningFailed { stage });
            }
            Err(e) => {
                warn!("Stage {}: planner call failed: {}", stage, e);
                return Err(PlanningError::PlanningFailed { stage });
            }
        };

        if let Some(end_state) = trajectory.final_configuration() {
            self.planner.set_start_state(end_state);
        }

        debug!(
            "Stage {} planned with {} waypoints over {:.2}s",
            stage,
            trajectory.len(),
            trajectory.total_time()
        );

        Ok(PlanResult { stage, trajectory })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PlannerCall, ScriptedPlanner};

    #[tokio::test]
    async fn test_successful_stage_seeds_next_start_state() {
        let planner = ScriptedPlanner::new(6);
        let calls = planner.calls.clone();
        let outputs = planner.outputs.clone();
        let planner = Mutex::new(planner);

        let mut session = PlanningSession::checkout(&planner, Duration::from_secs(1)).await;
        let target = JointConfiguration(vec![0.3; 6]);
        let result = session
            .plan_stage(PlanStage::ToStart, StageTarget::Joints(&target))
            .await
            .unwrap();

        assert_eq!(result.stage, PlanStage::ToStart);
        assert_eq!(result.trajectory, outputs.lock().unwrap()[0]);

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], PlannerCall::ResetToCurrent);
        assert_eq!(calls.last(), Some(&PlannerCall::SetStart(target)));
    }

    #[tokio::test]
    async fn test_partial_cartesian_path_fails() {
        let mut planner = ScriptedPlanner::new(6);
        planner.cartesian_fraction = 0.99;
        let planner = Mutex::new(planner);

        let mut session = PlanningSession::checkout(&planner, Duration::from_secs(1)).await;
        let waypoints = [CartesianPose::default(), CartesianPose::default()];
        let err = session
            .plan_stage(PlanStage::ToGrasp, StageTarget::CartesianPath(&waypoints))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanningError::PlanningFailed {
                stage: PlanStage::ToGrasp
            }
        );
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_planning_failure() {
        let mut planner = ScriptedPlanner::new(6);
        planner.unreachable_at = Some(0);
        let planner = Mutex::new(planner);

        let mut session = PlanningSession::checkout(&planner, Duration::from_secs(1)).await;
        let err = session
            .plan_stage(PlanStage::ToApproach, StageTarget::Pose(&CartesianPose::default()))
            .await
            .unwrap_err();

        assert_eq!(err.code(), binpicking_lib::ErrorCode::PlanningFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_planner_times_out() {
        let mut planner = ScriptedPlanner::new(6);
        planner.hang_at = Some(0);
        let planner = Mutex::new(planner);

        let mut session = PlanningSession::checkout(&planner, Duration::from_millis(500)).await;
        let err = session
            .plan_stage(PlanStage::ToApproach, StageTarget::Pose(&CartesianPose::default()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanningError::PlanningTimeout {
                stage: PlanStage::ToApproach,
                timeout: Duration::from_millis(500),
            }
        );
    }
}
