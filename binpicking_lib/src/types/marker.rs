use crate::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Sphere marker placed at the end effector position of one trajectory
/// waypoint, for operator inspection in a 3D viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMarker {
    pub frame_id: String,
    pub namespace: String,
    /// Unique over the lifetime of the emulator process
    pub id: u32,
    /// Milliseconds since Unix epoch
    pub stamp_ms: u64,
    pub position: Point,
    pub scale: [f64; 3],
    pub color: ColorRgba,
    pub lifetime_ms: u64,
}
