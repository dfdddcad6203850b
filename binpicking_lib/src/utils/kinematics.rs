use crate::types::{DHParameter, KinematicsConfig, Point};
use eyre::Result;
use nalgebra::{Matrix4, Vector3};

/// DH-table forward kinematics, used to place trajectory markers at the end
/// effector of each planned waypoint.
pub struct ForwardKinematics {
    dh_params: Vec<DHParameter>,
    base_offset: Vector3<f64>,
}

impl ForwardKinematics {
    pub fn new(config: &KinematicsConfig) -> Self {
        Self {
            dh_params: config.dh_parameters.clone(),
            base_offset: Vector3::new(
                config.base_offset[0],
                config.base_offset[1],
                config.base_offset[2],
            ),
        }
    }

    pub fn dof(&self) -> usize {
        self.dh_params.len()
    }

    pub fn compute_end_effector_transform(&self, joint_angles: &[f64]) -> Result<Matrix4<f64>> {
        if joint_angles.len() != self.dh_params.len() {
            return Err(eyre::eyre!(
                "Joint angles count ({}) doesn't match DH parameters ({})",
                joint_angles.len(),
                self.dh_params.len()
            ));
        }

        let mut transform = Matrix4::identity();

        transform[(0, 3)] = self.base_offset.x;
        transform[(1, 3)] = self.base_offset.y;
        transform[(2, 3)] = self.base_offset.z;

        for (dh, angle) in self.dh_params.iter().zip(joint_angles) {
            let theta = angle + dh.theta;
            transform *= self.dh_transformation(dh.a, dh.alpha, dh.d, theta);
        }

        Ok(transform)
    }

    pub fn compute_end_effector_position(&self, joint_angles: &[f64]) -> Result<Point> {
        let transform = self.compute_end_effector_transform(joint_angles)?;

        Ok(Point {
            x: transform[(0, 3)],
            y: transform[(1, 3)],
            z: transform[(2, 3)],
        })
    }

    fn dh_transformation(&self, a: f64, alpha: f64, d: f64, theta: f64) -> Matrix4<f64> {
        let cos_theta = theta.cos();
        let sin_theta = theta.sin();
        let cos_alpha = alpha.cos();
        let sin_alpha = alpha.sin();

        Matrix4::new(
            cos_theta, -sin_theta * cos_alpha,  sin_theta * sin_alpha, a * cos_theta,
            sin_theta,  cos_theta * cos_alpha, -cos_theta * sin_alpha, a * sin_theta,
            0.0,        sin_alpha,              cos_alpha,             d,
            0.0,        0.0,                    0.0,                   1.0,
        )
    }
}
