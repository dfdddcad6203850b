use crate::error::PlanningError;
use crate::planner::{
    MotionPlanner, PlanResult, PlanStage, PlanningSession, PoseSource, StageTarget,
};
use crate::pose_store::PoseStore;
use crate::visualization::TrajectorySink;
use binpicking_lib::{CartesianPose, GraspPathMode, PlannerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct StageSettings {
    pub grasp_path: GraspPathMode,
    pub planning_timeout: Duration,
    pub pose_source_timeout: Duration,
}

impl From<&PlannerConfig> for StageSettings {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            grasp_path: config.grasp_path,
            planning_timeout: config.planning_timeout(),
            pose_source_timeout: config.pose_source_timeout(),
        }
    }
}

/// The four exposed legs of a fully planned pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPick {
    pub approach: PlanResult,
    pub grasp: PlanResult,
    pub deapproach: PlanResult,
    pub end: PlanResult,
}

/// Chains the planning calls of one pick: start, approach, grasp,
/// deapproach, end. Nothing is executed; each stage starts where the
/// previous one ended.
pub struct StagePlanner<P: MotionPlanner, S: PoseSource> {
    planner: Mutex<P>,
    pose_source: S,
    pose_store: Arc<PoseStore>,
    sink: Arc<dyn TrajectorySink>,
    settings: StageSettings,
}

impl<P: MotionPlanner, S: PoseSource> StagePlanner<P, S> {
    pub fn new(
        planner: P,
        pose_source: S,
        pose_store: Arc<PoseStore>,
        sink: Arc<dyn TrajectorySink>,
        settings: StageSettings,
    ) -> Self {
        Self {
            planner: Mutex::new(planner),
            pose_source,
            pose_store,
            sink,
            settings,
        }
    }

    /// Plan the whole pick, stopping at the first failing stage.
    pub async fn plan_pick(&self) -> Result<PlannedPick, PlanningError> {
        let (start_pose, end_pose) = self
            .pose_store
            .initialized_boundary_poses()
            .ok_or(PlanningError::ConfigurationMissing)?;

        let bin_pose = match tokio::time::timeout(
            self.settings.pose_source_timeout,
            self.pose_source.bin_pose(),
        )
        .await
        {
            Ok(Ok(bin_pose)) => bin_pose,
            Ok(Err(e)) => return Err(PlanningError::PoseSourceUnavailable(e.to_string())),
            Err(_) => {
                return Err(PlanningError::PoseSourceUnavailable(format!(
                    "no answer within {:?}",
                    self.settings.pose_source_timeout
                )))
            }
        };

        let mut session =
            PlanningSession::checkout(&self.planner, self.settings.planning_timeout).await;

        // Only the end state of this leg is used
        match session
            .plan_stage(PlanStage::ToStart, StageTarget::Joints(&start_pose))
            .await
        {
            Ok(_) => {}
            Err(e) => {
                warn!("{}; continuing from the stored start pose", e);
                session.seed(start_pose);
            }
        }

        let approach = session
            .plan_stage(PlanStage::ToApproach, StageTarget::Pose(&bin_pose.approach_pose))
            .await?;
        self.sink.publish(approach.stage, &approach.trajectory);

        let grasp_leg = [bin_pose.approach_pose, bin_pose.grasp_pose];
        let grasp = session
            .plan_stage(PlanStage::ToGrasp, self.leg_target(&grasp_leg))
            .await?;
        self.sink.publish(grasp.stage, &grasp.trajectory);

        let deapproach_leg = [bin_pose.grasp_pose, bin_pose.deapproach_pose];
        let deapproach = session
            .plan_stage(PlanStage::ToDeapproach, self.leg_target(&deapproach_leg))
            .await?;
        self.sink.publish(deapproach.stage, &deapproach.trajectory);

        let end = session
            .plan_stage(PlanStage::ToEnd, StageTarget::Joints(&end_pose))
            .await?;
        self.sink.publish(end.stage, &end.trajectory);

        info!(
            "Pick planned: approach {}, grasp {}, deapproach {}, end {} waypoints",
            approach.trajectory.len(),
            grasp.trajectory.len(),
            deapproach.trajectory.len(),
            end.trajectory.len()
        );

        Ok(PlannedPick {
            approach,
            grasp,
            deapproach,
            end,
        })
    }

    fn leg_target<'a>(&self, leg: &'a [CartesianPose; 2]) -> StageTarget<'a> {
        match self.settings.grasp_path {
            GraspPathMode::Cartesian => StageTarget::CartesianPath(leg),
            GraspPathMode::Free => StageTarget::Pose(&leg[1]),
        }
    }
}
