// Yaw/pitch/roll estimator composing three complementary-filter axes

use tracing::{debug, info};

use crate::error::Result;
use crate::integrator::{Integrator, TrapezoidIntegrator};

use super::axis::{Axis, AxisConfig, AxisEstimator, Correction};
use super::{Imu, OrientationSample, YawSource, Ypr};

/// Orientation estimator owning its sensor and one filter per axis
pub struct OrientationEstimator<S, I = TrapezoidIntegrator> {
    sensor: S,
    yaw: AxisEstimator<I>,
    pitch: AxisEstimator<I>,
    roll: AxisEstimator<I>,
}

impl<S: Imu, I: Integrator + Default> OrientationEstimator<S, I> {
    /// Gyro-only estimator: every axis is pure rate integration
    pub fn new(sensor: S) -> Self {
        Self::with_corrections(sensor, Correction::None, Correction::None)
    }

    /// Estimator whose pitch and roll are corrected by the accelerometer
    pub fn with_acceleration(sensor: S) -> Self {
        Self::with_corrections(sensor, Correction::AccelPitch, Correction::AccelRoll)
    }

    fn with_corrections(sensor: S, pitch: Correction, roll: Correction) -> Self {
        Self {
            sensor,
            yaw: AxisEstimator::new(Axis::Yaw, Correction::None),
            pitch: AxisEstimator::new(Axis::Pitch, pitch),
            roll: AxisEstimator::new(Axis::Roll, roll),
        }
    }
}

impl<S: Imu, I: Integrator> OrientationEstimator<S, I> {
    pub fn init(&mut self, yaw: AxisConfig<I>, pitch: AxisConfig<I>, roll: AxisConfig<I>) {
        self.yaw.init(yaw);
        self.pitch.init(pitch);
        self.roll.init(roll);
    }

    /// Advance all axes to `time` (seconds), yaw first, stopping at the first failure
    pub fn calculate_ypr(&mut self, time: f64) -> Result<Ypr> {
        let yaw = self.yaw.calculate(&self.sensor, time)?;
        let pitch = self.pitch.calculate(&self.sensor, time)?;
        let roll = self.roll.calculate(&self.sensor, time)?;

        Ok(Ypr { yaw, pitch, roll })
    }

    /// Advance all axes and bundle the result with fresh raw readings
    pub fn calculate_sample(&mut self, time: f64) -> Result<OrientationSample> {
        let ypr = self.calculate_ypr(time)?;
        self.sample_with(ypr)
    }

    pub fn update(&mut self, time: f64) -> Result<()> {
        let ypr = self.calculate_ypr(time)?;
        debug!(
            "Orientation at {:.3}s: yaw={:.2}, pitch={:.2}, roll={:.2}",
            time, ypr.yaw, ypr.pitch, ypr.roll
        );
        Ok(())
    }

    /// Treat the current pose as the configured offsets, dropping accumulated drift
    pub fn calibrate(&mut self) -> Result<()> {
        info!(
            "Calibrating orientation (drift yaw={:.2}, pitch={:.2}, roll={:.2})",
            self.yaw.value() - self.yaw.config().offset,
            self.pitch.value() - self.pitch.config().offset,
            self.roll.value() - self.roll.config().offset
        );
        self.yaw.recenter();
        self.pitch.recenter();
        self.roll.recenter();
        Ok(())
    }

    /// Restart integration on every axis; the next update only seeds the rates
    pub fn reset_history(&mut self) {
        self.yaw.reset_history();
        self.pitch.reset_history();
        self.roll.reset_history();
    }

    pub fn pitch(&self) -> Result<f64> {
        Ok(self.pitch.value())
    }

    pub fn roll(&self) -> Result<f64> {
        Ok(self.roll.value())
    }

    pub fn ypr(&self) -> Result<Ypr> {
        Ok(Ypr {
            yaw: self.yaw()?,
            pitch: self.pitch()?,
            roll: self.roll()?,
        })
    }

    /// Latest orientation plus fresh acceleration and angular rate readings
    pub fn sample(&self) -> Result<OrientationSample> {
        let ypr = self.ypr()?;
        self.sample_with(ypr)
    }

    fn sample_with(&self, ypr: Ypr) -> Result<OrientationSample> {
        let acceleration = self.sensor.acceleration()?;
        let angular_rate = self.sensor.angular_rate()?;
        Ok(OrientationSample {
            ypr,
            acceleration,
            angular_rate,
        })
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

impl<S: Imu, I: Integrator> YawSource for OrientationEstimator<S, I> {
    fn yaw(&self) -> Result<f64> {
        Ok(self.yaw.value())
    }
}
