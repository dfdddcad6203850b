//! In-memory collaborators for unit tests.

use crate::error::RemoteError;
use crate::planner::{CartesianPath, MotionPlanner, PlanStage, PoseSource};
use crate::visualization::TrajectorySink;
use async_trait::async_trait;
use binpicking_lib::{
    BinPose, CartesianPose, JointConfiguration, JointTrajectory, JointTrajectoryPoint, PlanTarget,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerCall {
    ResetToCurrent,
    SetStart(JointConfiguration),
    Plan {
        start: JointConfiguration,
        target: PlanTarget,
    },
    CartesianPath {
        start: JointConfiguration,
        waypoints: Vec<CartesianPose>,
    },
}

/// Planner that interpolates linearly to its goal. The n-th planning call
/// (0-based) returns `3 + n` waypoints so every stage is distinguishable.
pub struct ScriptedPlanner {
    dof: usize,
    current: JointConfiguration,
    start: Option<JointConfiguration>,
    plan_index: usize,
    /// Planning call that reports "no solution"
    pub fail_at: Option<usize>,
    /// Planning call that fails at the transport level
    pub unreachable_at: Option<usize>,
    /// Planning call that never returns
    pub hang_at: Option<usize>,
    pub cartesian_fraction: f64,
    /// Delay inside every planning call
    pub step_delay: Duration,
    pub calls: Arc<Mutex<Vec<PlannerCall>>>,
    pub outputs: Arc<Mutex<Vec<JointTrajectory>>>,
}

impl ScriptedPlanner {
    pub fn new(dof: usize) -> Self {
        Self {
            dof,
            current: JointConfiguration(vec![-0.5; dof]),
            start: None,
            plan_index: 0,
            fail_at: None,
            unreachable_at: None,
            hang_at: None,
            cartesian_fraction: 1.0,
            step_delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
            outputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn effective_start(&self) -> JointConfiguration {
        self.start.clone().unwrap_or_else(|| self.current.clone())
    }

    fn record(&self, call: PlannerCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Joint goal reported for the n-th call when the target is a pose
    fn pose_goal(&self, index: usize) -> Vec<f64> {
        vec![0.1 * (index as f64 + 1.0); self.dof]
    }

    /// Shared behaviour of every planning call. Returns the index of this
    /// call, or an error for scripted transport failures.
    async fn next_call(&mut self) -> Result<usize, RemoteError> {
        let index = self.plan_index;
        self.plan_index += 1;

        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
        if self.hang_at == Some(index) {
            std::future::pending::<()>().await;
        }
        if self.unreachable_at == Some(index) {
            return Err(RemoteError::NoReply {
                key: "scripted".to_string(),
            });
        }
        Ok(index)
    }

    fn trajectory(&self, index: usize, start: &JointConfiguration, goal: Vec<f64>) -> JointTrajectory {
        let n = 3 + index;
        let mut points: Vec<JointTrajectoryPoint> = (0..n - 1)
            .map(|i| {
                let s = i as f64 / (n - 1) as f64;
                JointTrajectoryPoint {
                    positions: start
                        .positions()
                        .iter()
                        .zip(&goal)
                        .map(|(a, b)| a + (b - a) * s)
                        .collect(),
                    time_from_start: i as f64 * 0.1,
                    ..Default::default()
                }
            })
            .collect();
        points.push(JointTrajectoryPoint {
            positions: goal,
            time_from_start: (n - 1) as f64 * 0.1,
            ..Default::default()
        });

        let trajectory = JointTrajectory {
            joint_names: vec![],
            points,
        };
        self.outputs.lock().unwrap().push(trajectory.clone());
        trajectory
    }
}

#[async_trait]
impl MotionPlanner for ScriptedPlanner {
    async fn current_state(&mut self) -> Result<JointConfiguration, RemoteError> {
        Ok(self.current.clone())
    }

    fn set_start_state(&mut self, state: JointConfiguration) {
        self.record(PlannerCall::SetStart(state.clone()));
        self.start = Some(state);
    }

    fn set_start_state_to_current(&mut self) {
        self.record(PlannerCall::ResetToCurrent);
        self.start = None;
    }

    async fn plan(&mut self, target: &PlanTarget) -> Result<Option<JointTrajectory>, RemoteError> {
        let start = self.effective_start();
        self.record(PlannerCall::Plan {
            start: start.clone(),
            target: target.clone(),
        });

        let index = self.next_call().await?;
        if self.fail_at == Some(index) {
            return Ok(None);
        }

        let goal = match target {
            PlanTarget::Joints(joints) => joints.positions().to_vec(),
            PlanTarget::Pose(_) => self.pose_goal(index),
        };
        Ok(Some(self.trajectory(index, &start, goal)))
    }

    async fn compute_cartesian_path(
        &mut self,
        waypoints: &[CartesianPose],
    ) -> Result<CartesianPath, RemoteError> {
        let start = self.effective_start();
        self.record(PlannerCall::CartesianPath {
            start: start.clone(),
            waypoints: waypoints.to_vec(),
        });

        let index = self.next_call().await?;
        if self.fail_at == Some(index) {
            return Ok(CartesianPath::default());
        }

        let goal = self.pose_goal(index);
        Ok(CartesianPath {
            fraction: self.cartesian_fraction,
            trajectory: self.trajectory(index, &start, goal),
        })
    }
}

pub struct FixedPoseSource {
    pub pose: BinPose,
    pub available: bool,
    pub calls: AtomicUsize,
}

impl FixedPoseSource {
    pub fn new() -> Self {
        Self {
            pose: BinPose {
                approach_pose: CartesianPose::new([0.4, 0.1, 0.3], [0.0, 1.0, 0.0, 0.0]),
                grasp_pose: CartesianPose::new([0.4, 0.1, 0.2], [0.0, 1.0, 0.0, 0.0]),
                deapproach_pose: CartesianPose::new([0.4, 0.1, 0.35], [0.0, 1.0, 0.0, 0.0]),
            },
            available: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }
}

#[async_trait]
impl PoseSource for FixedPoseSource {
    async fn bin_pose(&self) -> Result<BinPose, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(self.pose)
        } else {
            Err(RemoteError::NoReply {
                key: "bin_pose".to_string(),
            })
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub published: Mutex<Vec<(PlanStage, JointTrajectory)>>,
}

impl TrajectorySink for RecordingSink {
    fn publish(&self, stage: PlanStage, trajectory: &JointTrajectory) {
        self.published
            .lock()
            .unwrap()
            .push((stage, trajectory.clone()));
    }
}
