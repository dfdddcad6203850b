use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub robot: RobotConfig,
    pub planner: PlannerConfig,
    pub delays: DelayConfig,
    pub startup: StartupConfig,
    pub services: ServiceKeys,
    pub visualization: VisualizationConfig,
    pub kinematics: KinematicsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub num_of_joints: usize,
    pub planning_group: String,
    pub end_effector_link: String,
}

/// How the approach->grasp and grasp->deapproach legs are planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraspPathMode {
    /// Straight-line Cartesian path, must be fully achieved
    Cartesian,
    /// Unconstrained pose-to-pose plan
    Free,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub planner_id: String,
    pub goal_tolerance: f64,
    pub eef_step: f64,
    pub jump_threshold: f64,
    pub avoid_collisions: bool,
    pub grasp_path: GraspPathMode,
    pub planning_timeout_ms: u64,
    pub pose_source_timeout_ms: u64,
    /// Append the tool/gripping point info records to successful plans
    pub emit_info_records: bool,
}

/// Simulated latency of the stub services, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    pub scan_ms: u64,
    pub bin_locator_ms: u64,
    pub calibration_add_point_ms: u64,
    pub calibration_set_to_scanner_ms: u64,
    pub calibration_reset_ms: u64,
    pub calibration_start_ms: u64,
    pub pick_failed_ms: u64,
    pub change_solution_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub initial_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub wait_for_dependencies: bool,
    /// Threads serving requests concurrently
    pub worker_threads: usize,
}

/// Zenoh key expressions of the served services and the collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceKeys {
    pub prefix: String,
    pub planner_prefix: String,
    pub bin_pose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub enabled: bool,
    pub frame_id: String,
    pub namespace: String,
    pub marker_scale: f64,
    pub color: [f32; 4],
    pub lifetime_ms: u64,
    /// Delay between consecutive markers, 0 disables pacing
    pub pacing_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DHParameter {
    pub a: f64,      // link length
    pub alpha: f64,  // link twist
    pub d: f64,      // link offset
    pub theta: f64,  // joint angle offset
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsConfig {
    pub dh_parameters: Vec<DHParameter>,
    pub base_offset: [f64; 3], // x, y, z
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            num_of_joints: 6,
            planning_group: "manipulator".to_string(),
            end_effector_link: "tool0".to_string(),
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            planner_id: "RRTConnectkConfigDefault".to_string(),
            goal_tolerance: 0.001,
            eef_step: 0.02,
            jump_threshold: 0.0,
            avoid_collisions: false,
            grasp_path: GraspPathMode::Cartesian,
            planning_timeout_ms: 10_000,
            pose_source_timeout_ms: 5_000,
            emit_info_records: true,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            scan_ms: 5_000,
            bin_locator_ms: 5_000,
            calibration_add_point_ms: 5_000,
            calibration_set_to_scanner_ms: 2_000,
            calibration_reset_ms: 2_000,
            calibration_start_ms: 2_000,
            pick_failed_ms: 5_000,
            change_solution_ms: 5_000,
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 3_000,
            poll_interval_ms: 1_000,
            wait_for_dependencies: true,
            worker_threads: 2,
        }
    }
}

impl Default for ServiceKeys {
    fn default() -> Self {
        Self {
            prefix: "binpicking".to_string(),
            planner_prefix: "moveit".to_string(),
            bin_pose: "bin_pose".to_string(),
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_id: "/base_link".to_string(),
            namespace: "trajectory".to_string(),
            marker_scale: 0.01,
            color: [0.9, 0.9, 0.9, 1.0],
            lifetime_ms: 5_000,
            pacing_ms: 1,
        }
    }
}

impl Default for KinematicsConfig {
    /// UR5 standard DH table
    fn default() -> Self {
        use std::f64::consts::FRAC_PI_2;

        let row = |a: f64, alpha: f64, d: f64| DHParameter {
            a,
            alpha,
            d,
            theta: 0.0,
        };

        Self {
            dh_parameters: vec![
                row(0.0, FRAC_PI_2, 0.089159),
                row(-0.425, 0.0, 0.0),
                row(-0.39225, 0.0, 0.0),
                row(0.0, FRAC_PI_2, 0.10915),
                row(0.0, -FRAC_PI_2, 0.09465),
                row(0.0, 0.0, 0.0823),
            ],
            base_offset: [0.0, 0.0, 0.0],
        }
    }
}

impl EmulatorConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EmulatorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when the file is absent.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load_from_file(path)
                .map_err(|e| eyre::eyre!("Failed to load emulator config from {}: {}", path, e))
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.robot.num_of_joints == 0 {
            return Err(eyre::eyre!("num_of_joints must be greater than zero"));
        }

        if self.startup.worker_threads == 0 {
            return Err(eyre::eyre!("worker_threads must be greater than zero"));
        }

        if self.planner.eef_step <= 0.0 {
            return Err(eyre::eyre!(
                "eef_step must be positive, got {}",
                self.planner.eef_step
            ));
        }

        if self.planner.planning_timeout_ms == 0 || self.planner.pose_source_timeout_ms == 0 {
            return Err(eyre::eyre!("Planner and pose source timeouts must be non-zero"));
        }

        if self.visualization.enabled
            && self.kinematics.dh_parameters.len() != self.robot.num_of_joints
        {
            return Err(eyre::eyre!(
                "DH parameters count ({}) doesn't match num_of_joints ({})",
                self.kinematics.dh_parameters.len(),
                self.robot.num_of_joints
            ));
        }

        Ok(())
    }

    /// Key expression of one of the emulator's own services.
    pub fn service_key(&self, service: &str) -> String {
        format!("{}/{}", self.services.prefix, service)
    }

    /// Key expression of one of the external planner's endpoints.
    pub fn planner_key(&self, endpoint: &str) -> String {
        format!("{}/{}", self.services.planner_prefix, endpoint)
    }
}

impl PlannerConfig {
    pub fn planning_timeout(&self) -> Duration {
        Duration::from_millis(self.planning_timeout_ms)
    }

    pub fn pose_source_timeout(&self) -> Duration {
        Duration::from_millis(self.pose_source_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EmulatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.robot.num_of_joints, 6);
        assert_eq!(config.planner.grasp_path, GraspPathMode::Cartesian);
        assert_eq!(config.delays.calibration_reset_ms, 2_000);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let toml_str = r#"
            [robot]
            num_of_joints = 6

            [planner]
            grasp_path = "free"
            planning_timeout_ms = 250

            [delays]
            scan_ms = 10
        "#;
        let config: EmulatorConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.planner.grasp_path, GraspPathMode::Free);
        assert_eq!(config.planner.planning_timeout(), Duration::from_millis(250));
        assert_eq!(config.planner.eef_step, 0.02);
        assert_eq!(config.delays.scan_ms, 10);
        assert_eq!(config.delays.pick_failed_ms, 5_000);
        assert_eq!(config.robot.planning_group, "manipulator");
    }

    #[test]
    fn test_validate_rejects_kinematics_mismatch() {
        let mut config = EmulatorConfig::default();
        config.robot.num_of_joints = 7;
        assert!(config.validate().is_err());

        // Kinematics only matter for markers
        config.visualization.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_planner_settings() {
        let mut config = EmulatorConfig::default();
        config.planner.eef_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = EmulatorConfig::default();
        config.planner.planning_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = EmulatorConfig::default();
        config.robot.num_of_joints = 0;
        config.visualization.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_expressions() {
        let config = EmulatorConfig::default();
        assert_eq!(config.service_key("trajectory"), "binpicking/trajectory");
        assert_eq!(config.planner_key("plan"), "moveit/plan");
    }
}
