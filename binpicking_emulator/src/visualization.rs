use crate::planner::PlanStage;
use binpicking_lib::{
    ColorRgba, ForwardKinematics, JointTrajectory, TrajectoryMarker, VisualizationConfig,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Receives every successfully planned stage for display.
///
/// Implementations must not block and must not fail the planning request.
pub trait TrajectorySink: Send + Sync {
    fn publish(&self, stage: PlanStage, trajectory: &JointTrajectory);
}

/// Sink used when visualization is disabled.
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn publish(&self, _stage: PlanStage, _trajectory: &JointTrajectory) {}
}

/// Turns each waypoint into a sphere marker at the end effector position
/// and hands the batch to the pacing task.
pub struct MarkerPublisher {
    kinematics: ForwardKinematics,
    config: VisualizationConfig,
    next_id: AtomicU32,
    batches: flume::Sender<Vec<TrajectoryMarker>>,
}

impl MarkerPublisher {
    pub fn new(
        kinematics: ForwardKinematics,
        config: VisualizationConfig,
    ) -> (Self, flume::Receiver<Vec<TrajectoryMarker>>) {
        let (batches, rx) = flume::unbounded();
        let publisher = Self {
            kinematics,
            config,
            next_id: AtomicU32::new(0),
            batches,
        };
        (publisher, rx)
    }

    pub fn build_markers(&self, trajectory: &JointTrajectory) -> Vec<TrajectoryMarker> {
        let color = ColorRgba {
            r: self.config.color[0],
            g: self.config.color[1],
            b: self.config.color[2],
            a: self.config.color[3],
        };
        let scale = self.config.marker_scale;

        trajectory
            .points
            .iter()
            .filter_map(|point| {
                match self.kinematics.compute_end_effector_position(&point.positions) {
                    Ok(position) => Some(TrajectoryMarker {
                        frame_id: self.config.frame_id.clone(),
                        namespace: self.config.namespace.clone(),
                        id: self.next_id.fetch_add(1, Ordering::Relaxed),
                        stamp_ms: now_millis(),
                        position,
                        scale: [scale; 3],
                        color,
                        lifetime_ms: self.config.lifetime_ms,
                    }),
                    Err(e) => {
                        warn!("Skipping trajectory marker: {}", e);
                        None
                    }
                }
            })
            .collect()
    }
}

impl TrajectorySink for MarkerPublisher {
    fn publish(&self, stage: PlanStage, trajectory: &JointTrajectory) {
        let markers = self.build_markers(trajectory);
        debug!("Visualizing stage {} with {} markers", stage, markers.len());

        if self.batches.send(markers).is_err() {
            debug!("Marker channel closed, dropping stage {} markers", stage);
        }
    }
}

/// Forward markers one by one, spaced by `pacing`.
pub async fn pace_markers(
    batches: flume::Receiver<Vec<TrajectoryMarker>>,
    output: flume::Sender<TrajectoryMarker>,
    pacing: Duration,
) {
    while let Ok(batch) = batches.recv_async().await {
        for marker in batch {
            if output.send_async(marker).await.is_err() {
                return;
            }
            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
