// Message types exchanged over zenoh

use serde::{Deserialize, Serialize};

use crate::orientation::{Vector3, Ypr};
use crate::platform::GoCommand;

fn unit() -> f64 {
    1.0
}

// Command from teleop/scripts -> runtime
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BaseCommand {
    /// Linear speed, m/s
    pub speed: f64,
    /// Travel direction, degrees
    pub angle: f64,
    /// Requested rotation, rad/s
    #[serde(default)]
    pub angular_speed: f64,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub sync_head: bool,
    #[serde(default = "unit")]
    pub speed_k: f64,
}

impl From<&BaseCommand> for GoCommand {
    fn from(cmd: &BaseCommand) -> Self {
        Self {
            speed: cmd.speed,
            angle: cmd.angle,
            relative: cmd.relative,
            sync_head: cmd.sync_head,
            angular_speed: cmd.angular_speed,
            speed_k: cmd.speed_k,
        }
    }
}

// Raw inertial sample from the IMU publisher
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ImuSample {
    /// m/s², [x, y, z]
    pub acceleration: Vector3,
    /// deg/s around [yaw, pitch, roll]
    pub angular_rate: Vector3,
}

// Filtered orientation published every tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OrientationReport {
    pub ypr: Ypr,
    /// Heading being held, degrees
    pub head: f64,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    ImuStale,
    Fault,
}
