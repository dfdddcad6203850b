use crate::error::ServiceError;
use crate::planner::{MotionPlanner, PoseSource};
use crate::pose_store::PoseStore;
use crate::serializer::serialize_operations;
use crate::server::{decode_payload, encode_reply};
use crate::stage_planner::StagePlanner;
use binpicking_lib::{
    AddPointRequest, AddPointResponse, DelayConfig, InitializePoseRequest, InitializePoseResponse,
    OperationsRequest, OperationsResponse, TriggerRequest, TriggerResponse, TriggerWithIdRequest,
    INIT_RESULT_INVALID_JOINT_COUNT, INIT_RESULT_OK,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Every service the emulator answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    InitializePose,
    Scan,
    Trajectory,
    ScanAndTrajectory,
    LocateBin,
    CalibrationAddPoint,
    CalibrationSetToScanner,
    CalibrationReset,
    CalibrationStart,
    PickFailed,
    ChangeSolution,
}

impl Service {
    pub const ALL: [Service; 11] = [
        Service::InitializePose,
        Service::Scan,
        Service::Trajectory,
        Service::ScanAndTrajectory,
        Service::LocateBin,
        Service::CalibrationAddPoint,
        Service::CalibrationSetToScanner,
        Service::CalibrationReset,
        Service::CalibrationStart,
        Service::PickFailed,
        Service::ChangeSolution,
    ];

    /// Key suffix under the service prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Service::InitializePose => "initialize_pose",
            Service::Scan => "scan",
            Service::Trajectory => "trajectory",
            Service::ScanAndTrajectory => "scan_and_trajectory",
            Service::LocateBin => "locate_bin",
            Service::CalibrationAddPoint => "calibration/add_point",
            Service::CalibrationSetToScanner => "calibration/set_to_scanner",
            Service::CalibrationReset => "calibration/reset",
            Service::CalibrationStart => "calibration/start",
            Service::PickFailed => "pick_failed",
            Service::ChangeSolution => "change_solution",
        }
    }
}

/// Service implementations. Stubs wait for their configured delay and
/// return a canned answer; the trajectory services run the stage planner.
pub struct Emulator<P: MotionPlanner, S: PoseSource> {
    stage_planner: StagePlanner<P, S>,
    pose_store: Arc<PoseStore>,
    delays: DelayConfig,
    emit_info_records: bool,
}

impl<P: MotionPlanner, S: PoseSource> Emulator<P, S> {
    pub fn new(
        stage_planner: StagePlanner<P, S>,
        pose_store: Arc<PoseStore>,
        delays: DelayConfig,
        emit_info_records: bool,
    ) -> Self {
        Self {
            stage_planner,
            pose_store,
            delays,
            emit_info_records,
        }
    }

    /// Decode `payload`, run the matching handler, encode its response.
    pub async fn dispatch(&self, service: Service, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
        match service {
            Service::InitializePose => respond(payload, |req| self.initialize_pose(req)).await,
            Service::Scan => respond(payload, |req| self.scan(req)).await,
            Service::Trajectory => respond(payload, |req| self.trajectory(req)).await,
            Service::ScanAndTrajectory => {
                respond(payload, |req| self.scan_and_trajectory(req)).await
            }
            Service::LocateBin => respond(payload, |req| self.locate_bin(req)).await,
            Service::CalibrationAddPoint => {
                respond(payload, |req| self.calibration_add_point(req)).await
            }
            Service::CalibrationSetToScanner => {
                respond(payload, |req| self.calibration_set_to_scanner(req)).await
            }
            Service::CalibrationReset => respond(payload, |req| self.calibration_reset(req)).await,
            Service::CalibrationStart => respond(payload, |req| self.calibration_start(req)).await,
            Service::PickFailed => respond(payload, |req| self.pick_failed(req)).await,
            Service::ChangeSolution => respond(payload, |req| self.change_solution(req)).await,
        }
    }

    pub async fn initialize_pose(&self, request: InitializePoseRequest) -> InitializePoseResponse {
        info!("InitializePose for vision system {}", request.vision_system_id);

        match self
            .pose_store
            .set_boundary_poses(request.start_pose.position, request.end_pose.position)
        {
            Ok(()) => {
                let (start, end) = self.pose_store.boundary_poses();
                info!("Start pose: {}", start.to_log_string());
                info!("End pose: {}", end.to_log_string());
                InitializePoseResponse {
                    success: true,
                    result: INIT_RESULT_OK,
                }
            }
            Err(e) => {
                warn!("Rejecting InitializePose: {}", e);
                InitializePoseResponse {
                    success: false,
                    result: INIT_RESULT_INVALID_JOINT_COUNT,
                }
            }
        }
    }

    pub async fn scan(&self, request: TriggerWithIdRequest) -> TriggerResponse {
        info!("Scan requested for vision system {}", request.id);
        simulate_latency(self.delays.scan_ms).await;
        TriggerResponse::ok()
    }

    pub async fn trajectory(&self, request: OperationsRequest) -> OperationsResponse {
        let span = info_span!("trajectory", request_id = %Uuid::new_v4());
        async move {
            info!(
                "Trajectory requested for vision system {}",
                request.vision_system_id
            );
            self.plan_operations().await
        }
        .instrument(span)
        .await
    }

    pub async fn scan_and_trajectory(&self, request: OperationsRequest) -> OperationsResponse {
        let span = info_span!("scan_and_trajectory", request_id = %Uuid::new_v4());
        async move {
            info!(
                "Scan and trajectory requested for vision system {}",
                request.vision_system_id
            );
            simulate_latency(self.delays.scan_ms).await;
            self.plan_operations().await
        }
        .instrument(span)
        .await
    }

    pub async fn locate_bin(&self, request: TriggerWithIdRequest) -> TriggerResponse {
        info!("Bin locator requested for vision system {}", request.id);
        simulate_latency(self.delays.bin_locator_ms).await;
        TriggerResponse::ok_with_message("OK")
    }

    pub async fn calibration_add_point(&self, _request: AddPointRequest) -> AddPointResponse {
        info!("Calibration add point requested");
        simulate_latency(self.delays.calibration_add_point_ms).await;
        AddPointResponse {
            average_reprojection_error: 12.345,
            calibration_state: 0,
            too_close_indices: vec![0, 0, 0, 0],
            message: "OK".to_string(),
            success: true,
        }
    }

    pub async fn calibration_set_to_scanner(&self, _request: TriggerRequest) -> TriggerResponse {
        info!("Calibration set to scanner requested");
        simulate_latency(self.delays.calibration_set_to_scanner_ms).await;
        TriggerResponse::ok()
    }

    pub async fn calibration_reset(&self, _request: TriggerRequest) -> TriggerResponse {
        info!("Calibration reset requested");
        simulate_latency(self.delays.calibration_reset_ms).await;
        TriggerResponse::ok()
    }

    pub async fn calibration_start(&self, request: TriggerWithIdRequest) -> TriggerResponse {
        info!("Calibration start requested for vision system {}", request.id);
        simulate_latency(self.delays.calibration_start_ms).await;
        TriggerResponse::ok()
    }

    pub async fn pick_failed(&self, request: TriggerWithIdRequest) -> TriggerResponse {
        info!("Pick failed reported for vision system {}", request.id);
        simulate_latency(self.delays.pick_failed_ms).await;
        TriggerResponse::ok()
    }

    pub async fn change_solution(&self, request: TriggerWithIdRequest) -> TriggerResponse {
        info!("Change solution requested, solution id {}", request.id);
        simulate_latency(self.delays.change_solution_ms).await;
        TriggerResponse::ok()
    }

    async fn plan_operations(&self) -> OperationsResponse {
        let outcome = self.stage_planner.plan_pick().await;
        if let Err(e) = &outcome {
            warn!("Trajectory request failed: {}", e);
        }

        let operations = serialize_operations(outcome, self.emit_info_records);
        info!("Returning {} operations", operations.len());
        OperationsResponse { operations }
    }
}

async fn respond<Req, Resp, Fut>(
    payload: &[u8],
    handler: impl FnOnce(Req) -> Fut,
) -> Result<Vec<u8>, ServiceError>
where
    Req: DeserializeOwned + Default,
    Resp: Serialize,
    Fut: Future<Output = Resp>,
{
    let request = decode_payload(payload)?;
    let response = handler(request).await;
    encode_reply(&response)
}

async fn simulate_latency(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
