// Timeouts, topics, platform configuration
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;
use std::time::Duration;

use crate::motor::{MotorInfo, SpeedRange};
use crate::orientation::AxisConfig;
use crate::pid::PidRegulator;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Orientation is untrusted once the IMU falls silent this long
pub const IMU_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_BASE: &str = "lekiwi/cmd/base"; // motion commands
pub const TOPIC_CMD_CALIBRATE: &str = "lekiwi/cmd/calibrate"; // re-zero orientation
pub const TOPIC_IMU: &str = "lekiwi/state/imu"; // raw inertial samples
pub const TOPIC_ORIENTATION: &str = "lekiwi/state/orientation"; // filtered yaw/pitch/roll
pub const TOPIC_HEALTH: &str = "lekiwi/state/health"; // health status

// Serial port for Feetech motor controller
pub const MOTOR_PORT: &str = "/dev/tty.usbmodem58760432781";

// Enable hardware motor control (set to false for simulation/testing)
pub const MOTOR_ENABLED: bool = true;

/// STS3215 resolution: 4096 steps per revolution
const STEPS_PER_RADIAN: f64 = 4096.0 / (2.0 * PI);

/// Raw velocity safety limit (steps/s)
const MAX_RAW: f64 = 3000.0;

const WHEEL_RADIUS: f64 = 0.05; // meters
const BASE_RADIUS: f64 = 0.125; // meters, center to wheel

/// Rolling directions of the left, back and right wheels (degrees)
const WHEEL_ANGLES_DEG: [f64; 3] = [240.0 - 90.0, 0.0 - 90.0, 120.0 - 90.0];

/// Motor bus ids, index-aligned with WHEEL_ANGLES_DEG
const BASE_MOTOR_IDS: [u8; 3] = [7, 8, 9];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub fn regulator(&self) -> PidRegulator {
        PidRegulator::new(self.kp, self.ki, self.kd)
    }
}

/// Gyro trust per axis for the complementary filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterWeights {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl FilterWeights {
    pub fn axis_configs(&self) -> (AxisConfig, AxisConfig, AxisConfig) {
        (
            AxisConfig::new(self.yaw, 0.0),
            AxisConfig::new(self.pitch, 0.0),
            AxisConfig::new(self.roll, 0.0),
        )
    }
}

/// Everything needed to assemble a heading-holding platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub motors: Vec<MotorInfo>,
    /// Bus id of each motor, index-aligned with `motors`
    pub motor_ids: Vec<u8>,
    /// Decimal places used when grouping parallel wheels
    pub parallelism_precision: u32,
    /// Heading hold, output in rad/s per degree of error
    pub heading_pid: PidGains,
    pub filter: FilterWeights,
}

impl Default for PlatformConfig {
    /// Three-wheel LeKiwi omniwheel base; wheel speeds in rad/s
    fn default() -> Self {
        let wheel_limit = MAX_RAW / STEPS_PER_RADIAN;
        let motors = WHEEL_ANGLES_DEG
            .iter()
            .map(|&angle| {
                MotorInfo::new(
                    angle,
                    BASE_RADIUS,
                    WHEEL_RADIUS,
                    SpeedRange::symmetric(MAX_RAW),
                    SpeedRange::symmetric(wheel_limit),
                    false,
                )
            })
            .collect();

        Self {
            motors,
            motor_ids: BASE_MOTOR_IDS.to_vec(),
            parallelism_precision: 0,
            heading_pid: PidGains {
                kp: 0.03,
                ki: 0.0,
                kd: 0.002,
            },
            filter: FilterWeights {
                yaw: 1.0,
                pitch: 0.98,
                roll: 0.98,
            },
        }
    }
}

impl PlatformConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motors.is_empty() {
            return Err(ConfigError::Invalid("no motors configured".into()));
        }
        for (i, motor) in self.motors.iter().enumerate() {
            if !motor.speed_range.is_ordered() || !motor.interface_speed_range.is_ordered() {
                return Err(ConfigError::Invalid(format!(
                    "motor {} has a speed range with min above max; use `reversed` to flip direction",
                    i
                )));
            }
        }
        if self.motor_ids.len() != self.motors.len() {
            return Err(ConfigError::Invalid(format!(
                "{} motor ids for {} motors",
                self.motor_ids.len(),
                self.motors.len()
            )));
        }
        Ok(())
    }
}
