// Orientation estimation from an inertial sensor
//
// Provides:
// - Per-axis complementary filter (gyro integration + absolute correction)
// - Yaw/pitch/roll estimator composing the three axes
// - Sensor capability traits consumed by the estimator

mod axis;
mod estimator;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use axis::{Axis, AxisConfig, AxisEstimator, Correction};
pub use estimator::OrientationEstimator;

/// Three-component sensor reading, indexed [x, y, z]
pub type Vector3 = [f64; 3];

/// Yaw, pitch and roll in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ypr {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Ypr {
    pub fn new(yaw: f64, pitch: f64, roll: f64) -> Self {
        Self { yaw, pitch, roll }
    }
}

/// Orientation together with the raw readings it was derived from
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub ypr: Ypr,
    pub acceleration: Vector3,
    pub angular_rate: Vector3,
}

/// Inertial sensor capability
///
/// Gyro-only sensors implement `angular_rate` and inherit an `acceleration`
/// that reports the capability as missing.
pub trait Imu {
    /// Angular rate in deg/s around [yaw, pitch, roll] axes
    fn angular_rate(&self) -> Result<Vector3>;

    fn acceleration(&self) -> Result<Vector3> {
        Err(Error::InvalidResource(
            "sensor has no accelerometer".to_string(),
        ))
    }
}

/// Anything able to report the current heading in degrees
pub trait YawSource {
    fn yaw(&self) -> Result<f64>;
}
