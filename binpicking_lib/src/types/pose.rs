use serde::{Deserialize, Serialize};

/// Position in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Orientation as a quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// End effector pose in task space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianPose {
    pub position: Point,
    pub orientation: Orientation,
}

impl CartesianPose {
    pub fn new(position: [f64; 3], orientation: [f64; 4]) -> Self {
        Self {
            position: Point {
                x: position[0],
                y: position[1],
                z: position[2],
            },
            orientation: Orientation {
                x: orientation[0],
                y: orientation[1],
                z: orientation[2],
                w: orientation[3],
            },
        }
    }
}

/// The three poses of a single pick, as served by the bin pose source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BinPose {
    pub approach_pose: CartesianPose,
    pub grasp_pose: CartesianPose,
    pub deapproach_pose: CartesianPose,
}
