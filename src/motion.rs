// Single-axis trapezoidal motion profile
//
// Ramp up at constant acceleration, cruise, ramp down. Moves too short to
// reach the speed limit degenerate into a triangle (t1 == t2). The phase is
// picked from elapsed time on every query, nothing advances per tick.

use tracing::debug;

use crate::error::{Error, Result};

/// Kinematic state at a point of the profile, signed along the direction of travel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub position: f64,
    pub speed: f64,
    pub acceleration: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrapezoidalMotionProfile {
    acceleration: f64,
    speed_limit: f64,
    /// min(speed_limit, sqrt(acceleration * distance)) for the current move
    cruise_speed: f64,

    t1: f64,
    t2: f64,
    t3: f64,

    x1: f64,
    x2: f64,

    start_time: f64,
    x0: f64,
    xt: f64,
    direction: f64,

    configured: bool,
    /// Last start was already at its target
    reached: bool,
}

impl TrapezoidalMotionProfile {
    pub fn new(acceleration: f64, speed_limit: f64) -> Self {
        Self {
            acceleration,
            speed_limit,
            ..Self::default()
        }
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    /// Peak speed actually reached by the current move
    pub fn cruise_speed(&self) -> f64 {
        self.cruise_speed
    }

    /// Phase boundary times (end of ramp-up, start of ramp-down, end of motion), relative to start
    pub fn phase_times(&self) -> (f64, f64, f64) {
        (self.t1, self.t2, self.t3)
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    fn valid_check(&self) -> Result<()> {
        if self.x0 == self.xt {
            return Err(Error::ReachedTarget(
                "the start position is the same as the target".into(),
            ));
        }
        if self.acceleration <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "acceleration must be positive, got {}",
                self.acceleration
            )));
        }
        if self.speed_limit <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "speed limit must be positive, got {}",
                self.speed_limit
            )));
        }
        Ok(())
    }

    /// Ok when a motion is in progress, otherwise the reason why not
    pub fn configured_as_err(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else if self.reached {
            Err(Error::ReachedTarget(
                "target already reached; call end() or start a new motion".into(),
            ))
        } else {
            Err(Error::InvalidConfiguration(
                "no motion has been started".into(),
            ))
        }
    }

    /// Forget the motion and the physical constants
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// Plan a move from `x0` to `xt` starting at time `t0`
    ///
    /// A rejected start resets the whole profile, constants included.
    pub fn start(&mut self, x0: f64, xt: f64, t0: f64) -> Result<()> {
        self.configured = false;
        self.reached = false;
        self.x0 = x0;
        self.xt = xt;

        if let Err(e) = self.valid_check() {
            self.end();
            self.reached = matches!(e, Error::ReachedTarget(_));
            return Err(e);
        }

        let distance = (xt - x0).abs();
        let a = self.acceleration;
        let v = self.speed_limit.min((a * distance).sqrt());

        self.direction = (xt - x0).signum();
        self.cruise_speed = v;

        self.t1 = v / a;
        let ramp = v * self.t1 / 2.0;
        self.x1 = x0 + self.direction * ramp;

        // Whatever the two ramps don't cover is travelled at cruise speed
        self.t2 = self.t1 + (distance - 2.0 * ramp) / v;
        self.x2 = self.x1 + self.direction * v * (self.t2 - self.t1);

        self.t3 = self.t2 + self.t1;
        self.start_time = t0;
        self.configured = true;

        debug!(
            "Motion {} -> {}: cruise={:.4}, t1={:.4}, t2={:.4}, t3={:.4}",
            x0, xt, v, self.t1, self.t2, self.t3
        );
        Ok(())
    }

    /// Position, speed and acceleration at absolute time `time`
    ///
    /// Past the end of the motion the profile rests at the target.
    pub fn calculate_motion(&self, time: f64) -> Result<MotionState> {
        self.configured_as_err()?;

        let t = time - self.start_time;
        if t < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "time {} is before the motion start {}",
                time, self.start_time
            )));
        }

        let s = self.direction;
        let a = self.acceleration;
        let v = self.cruise_speed;

        let state = if t <= self.t1 {
            MotionState {
                position: self.x0 + s * a * t * t / 2.0,
                speed: s * a * t,
                acceleration: s * a,
            }
        } else if t < self.t2 {
            MotionState {
                position: self.x1 + s * v * (t - self.t1),
                speed: s * v,
                acceleration: 0.0,
            }
        } else if t <= self.t3 {
            let dt = t - self.t2;
            MotionState {
                position: self.x2 + s * (v * dt - a * dt * dt / 2.0),
                speed: s * (v - a * dt),
                acceleration: -s * a,
            }
        } else {
            MotionState {
                position: self.xt,
                speed: 0.0,
                acceleration: 0.0,
            }
        };

        Ok(state)
    }
}
