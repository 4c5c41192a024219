// Single-axis complementary filter
//
// blended = integrated * weight + correction * (1 - weight)
// The blended value overwrites the integrator so the next step integrates
// from the corrected angle instead of the drifting one.

use crate::error::Result;
use crate::integrator::{Integrator, TrapezoidIntegrator};

use super::{Imu, Vector3};

/// Which channel of the angular-rate vector an axis integrates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Yaw,
    Pitch,
    Roll,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::Yaw => 0,
            Axis::Pitch => 1,
            Axis::Roll => 2,
        }
    }
}

/// Absolute reference blended into an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Correction {
    /// No absolute reference, contributes zero
    #[default]
    None,
    /// Tilt from gravity: atan2(ay, sqrt(ay² + az²))
    AccelPitch,
    /// Tilt from gravity: atan2(ay, az)
    AccelRoll,
}

impl Correction {
    /// Evaluate the correction in degrees, reading the accelerometer if needed
    pub fn evaluate<S: Imu + ?Sized>(self, sensor: &S) -> Result<f64> {
        match self {
            Correction::None => Ok(0.0),
            Correction::AccelPitch => Ok(pitch_from_acceleration(sensor.acceleration()?)),
            Correction::AccelRoll => Ok(roll_from_acceleration(sensor.acceleration()?)),
        }
    }
}

fn pitch_from_acceleration(acc: Vector3) -> f64 {
    let (acc_y, acc_z) = (acc[1], acc[2]);
    let magnitude = (acc_y * acc_y + acc_z * acc_z).sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }
    acc_y.atan2(magnitude).to_degrees()
}

fn roll_from_acceleration(acc: Vector3) -> f64 {
    let (acc_y, acc_z) = (acc[1], acc[2]);
    if acc_z == 0.0 {
        return 90.0;
    }
    acc_y.atan2(acc_z).to_degrees()
}

/// Filter parameters for one axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig<I = TrapezoidIntegrator> {
    /// Trust in the integrated gyro rate, nominally in [0, 1]
    pub integral_weight: f64,
    /// Angle added to the integrator at init
    pub offset: f64,
    pub integrator: I,
}

impl<I: Default> Default for AxisConfig<I> {
    fn default() -> Self {
        Self {
            integral_weight: 1.0,
            offset: 0.0,
            integrator: I::default(),
        }
    }
}

impl<I: Default> AxisConfig<I> {
    pub fn new(integral_weight: f64, offset: f64) -> Self {
        Self {
            integral_weight,
            offset,
            integrator: I::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxisEstimator<I = TrapezoidIntegrator> {
    axis: Axis,
    correction: Correction,
    config: AxisConfig<I>,
}

impl<I: Integrator + Default> AxisEstimator<I> {
    pub fn new(axis: Axis, correction: Correction) -> Self {
        Self {
            axis,
            correction,
            config: AxisConfig::default(),
        }
    }
}

impl<I: Integrator> AxisEstimator<I> {
    /// Install a configuration, folding its offset into the integrator
    ///
    /// The offset is added to whatever the supplied integrator already holds,
    /// so re-initializing with a carried-over integrator keeps its history.
    pub fn init(&mut self, config: AxisConfig<I>) {
        self.config = config;
        let anchored = self.config.integrator.integral() + self.config.offset;
        self.config.integrator.set_integral(anchored);
    }

    /// Run one filter step at `current_time` (seconds)
    ///
    /// Sensor and integrator failures are returned before any state changes.
    pub fn calculate<S: Imu + ?Sized>(&mut self, sensor: &S, current_time: f64) -> Result<f64> {
        let rate = sensor.angular_rate()?[self.axis.index()];
        let correction = self.correction.evaluate(sensor)?;
        let integrated = self.config.integrator.update(current_time, rate)?;

        let weight = self.config.integral_weight;
        let blended = integrated * weight + correction * (1.0 - weight);
        self.config.integrator.set_integral(blended);

        Ok(blended)
    }

    /// Current filtered angle
    pub fn value(&self) -> f64 {
        self.config.integrator.integral()
    }

    /// Discard accumulated drift, reading the configured offset again
    pub fn recenter(&mut self) {
        let offset = self.config.offset;
        self.config.integrator.set_integral(offset);
    }

    /// Drop the last rate sample, e.g. after the sensor went silent
    pub fn reset_history(&mut self) {
        self.config.integrator.reset_history();
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn correction(&self) -> Correction {
        self.correction
    }

    pub fn config(&self) -> &AxisConfig<I> {
        &self.config
    }
}
