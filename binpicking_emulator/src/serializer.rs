use crate::error::PlanningError;
use crate::stage_planner::PlannedPick;
use binpicking_lib::{GripperCommand, InfoCode, OperationRecord};

const INFO_RECORDS: [InfoCode; 3] = [
    InfoCode::ToolInvariance,
    InfoCode::GrippingPoint,
    InfoCode::GrippingPointInvariance,
];

/// Turn the outcome of a pick plan into the operation list returned to the
/// executor. A failure yields exactly one Error record.
pub fn serialize_operations(
    outcome: Result<PlannedPick, PlanningError>,
    emit_info_records: bool,
) -> Vec<OperationRecord> {
    let pick = match outcome {
        Ok(pick) => pick,
        Err(e) => return vec![OperationRecord::error(e.code())],
    };

    let mut operations = vec![
        OperationRecord::trajectory_coarse(pick.approach.trajectory.points),
        OperationRecord::gripper(GripperCommand::Open),
        OperationRecord::trajectory_fine(pick.grasp.trajectory.points),
        OperationRecord::gripper(GripperCommand::Close),
        OperationRecord::trajectory_fine(pick.deapproach.trajectory.points),
        OperationRecord::trajectory_coarse(pick.end.trajectory.points),
    ];

    if emit_info_records {
        operations.extend(INFO_RECORDS.into_iter().map(OperationRecord::info));
    }

    operations
}
