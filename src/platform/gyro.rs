// Gyro heading hold for a wheeled platform
//
// yaw -> PID on heading error -> extra angular speed -> kinematics -> wheels

use tracing::debug;

use crate::error::Result;
use crate::motor::{MotorInfo, Speed, SpeedController};
use crate::orientation::YawSource;
use crate::pid::PidRegulator;
use crate::time::TimeSource;

use super::Platform;
use super::kinematics::calculate_platform_speeds;

/// Wrap an angle in degrees into (-180, 180]
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Adds a PID heading correction to the requested angular speed
pub struct GyroPidCalculator<Y> {
    pid: PidRegulator,
    yaw: Y,
}

impl<Y: YawSource> GyroPidCalculator<Y> {
    pub fn new(pid: PidRegulator, yaw: Y) -> Self {
        Self { pid, yaw }
    }

    /// Per-wheel speeds at `time` (seconds) with the heading correction applied
    pub fn calculate_speeds(
        &mut self,
        time: f64,
        config: &[MotorInfo],
        travel_angle: f64,
        speed: Speed,
        speed_k: f64,
        angular_speed: f64,
    ) -> Result<Vec<Speed>> {
        let yaw = self.yaw.yaw()?;
        self.calculate_speeds_at(yaw, time, config, travel_angle, speed, speed_k, angular_speed)
    }

    /// Like `calculate_speeds` with a yaw the caller already read
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_speeds_at(
        &mut self,
        yaw: f64,
        time: f64,
        config: &[MotorInfo],
        travel_angle: f64,
        speed: Speed,
        speed_k: f64,
        angular_speed: f64,
    ) -> Result<Vec<Speed>> {
        // Measure against the wrapped error so 359° vs 0° is a 1° correction
        let target = self.pid.target();
        let measured = target - normalize_degrees(target - yaw);
        let correction = self.pid.compute(measured, time);

        calculate_platform_speeds(config, travel_angle, speed, speed_k, angular_speed + correction)
    }

    pub fn pid(&self) -> &PidRegulator {
        &self.pid
    }

    pub fn pid_mut(&mut self) -> &mut PidRegulator {
        &mut self.pid
    }

    pub fn yaw_source(&self) -> &Y {
        &self.yaw
    }

    pub fn yaw_source_mut(&mut self) -> &mut Y {
        &mut self.yaw
    }
}

/// Motion request for `GyroPlatform::go`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoCommand {
    pub speed: Speed,
    /// Travel direction in degrees
    pub angle: f64,
    /// Angle is field-relative and gets compensated by the current yaw
    pub relative: bool,
    /// Turn the held heading towards `angle`
    pub sync_head: bool,
    pub angular_speed: f64,
    pub speed_k: f64,
}

impl GoCommand {
    pub fn new(speed: Speed, angle: f64) -> Self {
        Self {
            speed,
            angle,
            relative: false,
            sync_head: false,
            angular_speed: 0.0,
            speed_k: 1.0,
        }
    }
}

/// Platform holding a heading while it drives
pub struct GyroPlatform<C, Y, T> {
    platform: Platform<C>,
    calculator: GyroPidCalculator<Y>,
    clock: T,
    head: f64,
}

impl<C, Y, T> GyroPlatform<C, Y, T>
where
    C: SpeedController,
    Y: YawSource,
    T: TimeSource,
{
    pub fn new(platform: Platform<C>, calculator: GyroPidCalculator<Y>, clock: T) -> Self {
        Self {
            platform,
            calculator,
            clock,
            head: 0.0,
        }
    }

    /// Heading the PID holds, in degrees
    pub fn head(&self) -> f64 {
        self.head
    }

    pub fn set_head(&mut self, angle: f64) {
        self.head = angle;
    }

    /// Drive with heading hold; nothing is actuated if any stage fails
    pub fn go(&mut self, cmd: &GoCommand) -> Result<()> {
        let time = self.clock.now();
        let yaw = self.calculator.yaw_source().yaw()?;

        if cmd.sync_head {
            self.head = cmd.angle;
        }
        self.calculator.pid_mut().set_target(self.head);

        let travel_angle = if cmd.relative { cmd.angle - yaw } else { cmd.angle };

        let speeds = self.calculator.calculate_speeds_at(
            yaw,
            time,
            self.platform.config(),
            travel_angle,
            cmd.speed,
            cmd.speed_k,
            cmd.angular_speed,
        )?;

        debug!(
            "go: yaw={:.2}, head={:.2}, travel={:.2}, wheels={:?}",
            yaw, self.head, travel_angle, speeds
        );
        self.platform.set_speeds(&speeds)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.platform.stop()
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }

    pub fn platform(&self) -> &Platform<C> {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut Platform<C> {
        &mut self.platform
    }

    pub fn calculator(&self) -> &GyroPidCalculator<Y> {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut GyroPidCalculator<Y> {
        &mut self.calculator
    }
}
