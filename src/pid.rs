// PID regulator over a scalar error sampled at irregular times
//
// Time is f64 seconds, so ki is per second and kd is in seconds. Callers
// working in milliseconds must rescale their gains.

#[derive(Debug, Clone, PartialEq)]
pub struct PidRegulator {
    kp: f64,
    ki: f64,
    kd: f64,
    integral: f64,
    prev_error: f64,
    prev_time: Option<f64>,
    target: f64,
}

impl PidRegulator {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self::with_target(kp, ki, kd, 0.0)
    }

    pub fn with_target(kp: f64, ki: f64, kd: f64, target: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral: 0.0,
            prev_error: 0.0,
            prev_time: None,
            target,
        }
    }

    /// Compute the control output against the stored target
    pub fn compute(&mut self, measured: f64, time: f64) -> f64 {
        self.compute_with_target(measured, self.target, time)
    }

    /// Compute the control output against an explicit target
    ///
    /// The first call only seeds the history and returns the proportional
    /// term. A zero time step contributes no derivative.
    pub fn compute_with_target(&mut self, measured: f64, target: f64, time: f64) -> f64 {
        let error = target - measured;

        let Some(prev_time) = self.prev_time else {
            self.prev_time = Some(time);
            self.prev_error = error;
            return self.kp * error;
        };

        let dt = time - prev_time;
        self.integral += error * dt;

        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };

        self.prev_error = error;
        self.prev_time = Some(time);

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Forget the accumulated integral and sample history
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_proportional() {
        let mut pid = PidRegulator::new(2.0, 100.0, 100.0);
        assert_eq!(pid.compute_with_target(1.0, 4.0, 0.0), 6.0);
    }

    #[test]
    fn test_integral_scales_with_seconds() {
        let mut pid = PidRegulator::with_target(0.0, 1.0, 0.0, 1.0);
        pid.compute(0.0, 0.0);
        // error 1 held for 0.5 s
        let out = pid.compute(0.0, 0.5);
        assert!((out - 0.5).abs() < 1e-12);
        let out = pid.compute(0.0, 1.0);
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_millisecond_time_needs_rescaled_gains() {
        // Same physical history expressed in ms gives 1000x the integral
        let mut seconds = PidRegulator::with_target(0.0, 1.0, 0.0, 1.0);
        seconds.compute(0.0, 0.0);
        let out_s = seconds.compute(0.0, 0.2);

        let mut millis = PidRegulator::with_target(0.0, 1.0 / 1000.0, 0.0, 1.0);
        millis.compute(0.0, 0.0);
        let out_ms = millis.compute(0.0, 200.0);

        assert!((out_s - out_ms).abs() < 1e-12);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidRegulator::new(0.0, 0.0, 1.0);
        pid.compute_with_target(0.0, 0.0, 0.0);
        // error jumps from 0 to 2 over 0.1 s
        let out = pid.compute_with_target(0.0, 2.0, 0.1);
        assert!((out - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_time_step_has_no_derivative() {
        let mut pid = PidRegulator::new(1.0, 0.0, 5.0);
        pid.compute_with_target(0.0, 1.0, 1.0);
        let out = pid.compute_with_target(0.0, 3.0, 1.0);
        assert_eq!(out, 3.0);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut pid = PidRegulator::with_target(1.0, 1.0, 0.0, 1.0);
        pid.compute(0.0, 0.0);
        pid.compute(0.0, 1.0);
        pid.reset();
        assert_eq!(pid.compute(0.0, 5.0), 1.0);
    }
}
