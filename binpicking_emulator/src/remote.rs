//! Zenoh clients for the external motion planner and bin pose source.

use crate::error::RemoteError;
use crate::planner::{CartesianPath, MotionPlanner, PoseSource};
use async_trait::async_trait;
use binpicking_lib::{
    BinPose, BinPoseRequest, BinPoseResponse, CartesianPathRequest, CartesianPathResponse,
    CartesianPose, CurrentStateRequest, CurrentStateResponse, EmulatorConfig, JointConfiguration,
    JointTrajectory, PlanRequest, PlanResponse, PlanTarget,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use zenoh::Session;

/// Send `request` as JSON to `key` and decode the first reply.
pub async fn query_json<Req, Resp>(
    session: &Session,
    key: &str,
    request: &Req,
    timeout: Duration,
) -> Result<Resp, RemoteError>
where
    Req: Serialize,
    Resp: DeserializeOwned,
{
    let body = serde_json::to_vec(request).map_err(|source| RemoteError::Payload {
        key: key.to_string(),
        source,
    })?;

    let replies = session
        .get(key)
        .payload(body)
        .timeout(timeout)
        .await
        .map_err(|e| RemoteError::Query {
            key: key.to_string(),
            message: e.to_string(),
        })?;

    let reply = replies
        .recv_async()
        .await
        .map_err(|_| RemoteError::NoReply {
            key: key.to_string(),
        })?;

    match reply.result() {
        Ok(sample) => serde_json::from_slice(&sample.payload().to_bytes()).map_err(|source| {
            RemoteError::Payload {
                key: key.to_string(),
                source,
            }
        }),
        Err(err) => Err(RemoteError::Query {
            key: key.to_string(),
            message: String::from_utf8_lossy(&err.payload().to_bytes()).into_owned(),
        }),
    }
}

/// Extra time a planner query gets beyond the stage deadline, so a slow
/// planner always trips the stage timeout before the query gives up.
const QUERY_GRACE: Duration = Duration::from_secs(1);

pub fn planner_query_timeout(planning_timeout: Duration) -> Duration {
    planning_timeout + QUERY_GRACE
}

/// Fixed part of every planning request, taken from the configuration once.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    group: String,
    end_effector_link: String,
    planner_id: String,
    goal_tolerance: f64,
    eef_step: f64,
    jump_threshold: f64,
    avoid_collisions: bool,
}

impl PlanSettings {
    pub fn from_config(config: &EmulatorConfig) -> Self {
        Self {
            group: config.robot.planning_group.clone(),
            end_effector_link: config.robot.end_effector_link.clone(),
            planner_id: config.planner.planner_id.clone(),
            goal_tolerance: config.planner.goal_tolerance,
            eef_step: config.planner.eef_step,
            jump_threshold: config.planner.jump_threshold,
            avoid_collisions: config.planner.avoid_collisions,
        }
    }

    pub fn plan_request(&self, start_state: JointConfiguration, target: &PlanTarget) -> PlanRequest {
        PlanRequest {
            group: self.group.clone(),
            end_effector_link: self.end_effector_link.clone(),
            planner_id: self.planner_id.clone(),
            goal_tolerance: self.goal_tolerance,
            start_state,
            target: target.clone(),
        }
    }

    pub fn cartesian_path_request(
        &self,
        start_state: JointConfiguration,
        waypoints: &[CartesianPose],
    ) -> CartesianPathRequest {
        CartesianPathRequest {
            group: self.group.clone(),
            end_effector_link: self.end_effector_link.clone(),
            start_state,
            waypoints: waypoints.to_vec(),
            eef_step: self.eef_step,
            jump_threshold: self.jump_threshold,
            avoid_collisions: self.avoid_collisions,
        }
    }
}

/// Motion planner reached over zenoh. Mirrors a move group: the start state
/// set here is sent along with every planning request.
pub struct ZenohPlanner {
    session: Session,
    plan_key: String,
    cartesian_path_key: String,
    current_state_key: String,
    settings: PlanSettings,
    timeout: Duration,
    start: Option<JointConfiguration>,
}

impl ZenohPlanner {
    pub fn new(session: Session, config: &EmulatorConfig) -> Self {
        Self {
            session,
            plan_key: config.planner_key("plan"),
            cartesian_path_key: config.planner_key("cartesian_path"),
            current_state_key: config.planner_key("current_state"),
            settings: PlanSettings::from_config(config),
            timeout: planner_query_timeout(config.planner.planning_timeout()),
            start: None,
        }
    }

    async fn start_state(&mut self) -> Result<JointConfiguration, RemoteError> {
        match &self.start {
            Some(state) => Ok(state.clone()),
            None => self.current_state().await,
        }
    }
}

#[async_trait]
impl MotionPlanner for ZenohPlanner {
    async fn current_state(&mut self) -> Result<JointConfiguration, RemoteError> {
        let request = CurrentStateRequest {
            group: self.settings.group.clone(),
        };
        let response: CurrentStateResponse = query_json(
            &self.session,
            &self.current_state_key,
            &request,
            self.timeout,
        )
        .await?;
        Ok(response.positions)
    }

    fn set_start_state(&mut self, state: JointConfiguration) {
        self.start = Some(state);
    }

    fn set_start_state_to_current(&mut self) {
        self.start = None;
    }

    async fn plan(&mut self, target: &PlanTarget) -> Result<Option<JointTrajectory>, RemoteError> {
        let start_state = self.start_state().await?;
        let request = self.settings.plan_request(start_state, target);
        let response: PlanResponse =
            query_json(&self.session, &self.plan_key, &request, self.timeout).await?;

        if response.success {
            Ok(Some(response.trajectory))
        } else {
            debug!("Planner reported failure: {}", response.message);
            Ok(None)
        }
    }

    async fn compute_cartesian_path(
        &mut self,
        waypoints: &[CartesianPose],
    ) -> Result<CartesianPath, RemoteError> {
        let start_state = self.start_state().await?;
        let request = self.settings.cartesian_path_request(start_state, waypoints);
        let response: CartesianPathResponse = query_json(
            &self.session,
            &self.cartesian_path_key,
            &request,
            self.timeout,
        )
        .await?;

        Ok(CartesianPath {
            fraction: response.fraction,
            trajectory: response.trajectory,
        })
    }
}

pub struct ZenohPoseSource {
    session: Session,
    key: String,
    timeout: Duration,
}

impl ZenohPoseSource {
    pub fn new(session: Session, config: &EmulatorConfig) -> Self {
        Self {
            session,
            key: config.services.bin_pose.clone(),
            timeout: config.planner.pose_source_timeout(),
        }
    }
}

#[async_trait]
impl PoseSource for ZenohPoseSource {
    async fn bin_pose(&self) -> Result<BinPose, RemoteError> {
        let pose: BinPoseResponse =
            query_json(&self.session, &self.key, &BinPoseRequest {}, self.timeout).await?;
        Ok(pose)
    }
}

/// Whether a liveliness token is declared on `key`.
pub async fn is_alive(session: &Session, key: &str, timeout: Duration) -> bool {
    let replies = match session.liveliness().get(key).timeout(timeout).await {
        Ok(replies) => replies,
        Err(e) => {
            warn!("Liveliness query on {} failed: {}", key, e);
            return false;
        }
    };

    while let Ok(reply) = replies.recv_async().await {
        if reply.result().is_ok() {
            return true;
        }
    }
    false
}

/// Block until every key in `keys` has a live token.
pub async fn wait_for_dependencies(session: &Session, keys: &[String], poll_interval: Duration) {
    loop {
        let mut missing = Vec::new();
        for key in keys {
            if !is_alive(session, key, poll_interval).await {
                missing.push(key.as_str());
            }
        }

        if missing.is_empty() {
            return;
        }

        warn!("Waiting for {}", missing.join(", "));
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanningError;
    use crate::planner::{PlanStage, PlanningSession, StageTarget};
    use crate::testing::ScriptedPlanner;
    use tokio::sync::Mutex;

    #[test]
    fn test_requests_carry_configured_settings() {
        let mut config = EmulatorConfig::default();
        config.robot.end_effector_link = "gripper_tcp".to_string();
        config.planner.eef_step = 0.05;
        let settings = PlanSettings::from_config(&config);
        let start = JointConfiguration(vec![0.0; 6]);

        let target = PlanTarget::Pose(CartesianPose::default());
        let request = settings.plan_request(start.clone(), &target);
        assert_eq!(request.group, "manipulator");
        assert_eq!(request.end_effector_link, "gripper_tcp");
        assert_eq!(request.planner_id, "RRTConnectkConfigDefault");
        assert_eq!(request.goal_tolerance, 0.001);
        assert_eq!(request.target, target);

        let waypoints = [CartesianPose::default(); 2];
        let request = settings.cartesian_path_request(start, &waypoints);
        assert_eq!(request.end_effector_link, "gripper_tcp");
        assert_eq!(request.eef_step, 0.05);
        assert_eq!(request.jump_threshold, 0.0);
        assert_eq!(request.waypoints.len(), 2);
    }

    #[test]
    fn test_query_outlives_stage_deadline() {
        let planning_timeout = Duration::from_millis(250);
        assert!(planner_query_timeout(planning_timeout) > planning_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_after_deadline_is_a_timeout() {
        let planning_timeout = Duration::from_millis(500);
        // The planner gives up exactly when a zenoh query would
        let mut planner = ScriptedPlanner::new(6);
        planner.step_delay = planner_query_timeout(planning_timeout);
        planner.unreachable_at = Some(0);
        let planner = Mutex::new(planner);

        let mut session = PlanningSession::checkout(&planner, planning_timeout).await;
        let err = session
            .plan_stage(PlanStage::ToApproach, StageTarget::Pose(&CartesianPose::default()))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlanningError::PlanningTimeout {
                stage: PlanStage::ToApproach,
                timeout: planning_timeout,
            }
        );
    }
}
