// Running integral of a rate signal over irregularly sampled time

use crate::error::{Error, Result};

/// Accumulates the integral of a rate signal
///
/// The integration policy (rectangle, trapezoid, ...) belongs to the
/// implementation. Time is expressed in seconds.
pub trait Integrator {
    /// Integrate `rate` up to `time` and return the new accumulated value
    fn update(&mut self, time: f64, rate: f64) -> Result<f64>;

    fn integral(&self) -> f64;

    fn set_integral(&mut self, value: f64);

    /// Forget the last sample so the next update only seeds, keeping the integral
    fn reset_history(&mut self);
}

/// Trapezoidal-rule integrator
///
/// The first sample only seeds the history. Time going backwards is rejected
/// and leaves the integrator untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrapezoidIntegrator {
    integral: f64,
    last: Option<(f64, f64)>, // (time, rate)
}

impl TrapezoidIntegrator {
    pub fn new(initial: f64) -> Self {
        Self {
            integral: initial,
            last: None,
        }
    }
}

impl Integrator for TrapezoidIntegrator {
    fn update(&mut self, time: f64, rate: f64) -> Result<f64> {
        if let Some((prev_time, prev_rate)) = self.last {
            let dt = time - prev_time;
            if dt < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "integration time went backwards: {} -> {}",
                    prev_time, time
                )));
            }
            self.integral += (prev_rate + rate) * 0.5 * dt;
        }

        self.last = Some((time, rate));
        Ok(self.integral)
    }

    fn integral(&self) -> f64 {
        self.integral
    }

    fn set_integral(&mut self, value: f64) {
        self.integral = value;
    }

    fn reset_history(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_only_seeds() {
        let mut integrator = TrapezoidIntegrator::new(3.0);
        assert_eq!(integrator.update(10.0, 100.0).unwrap(), 3.0);
    }

    #[test]
    fn test_constant_rate() {
        let mut integrator = TrapezoidIntegrator::default();
        integrator.update(0.0, 2.0).unwrap();
        integrator.update(0.5, 2.0).unwrap();
        let value = integrator.update(1.5, 2.0).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_rate_is_exact() {
        // rate = t, integral over [0, 2] is 2
        let mut integrator = TrapezoidIntegrator::default();
        for i in 0..=20 {
            let t = i as f64 * 0.1;
            integrator.update(t, t).unwrap();
        }
        assert!((integrator.integral() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_history_skips_gap() {
        let mut integrator = TrapezoidIntegrator::default();
        integrator.update(0.0, 30.0).unwrap();
        integrator.update(1.0, 30.0).unwrap();
        integrator.reset_history();

        // 10 s of silence is not integrated
        assert_eq!(integrator.update(11.0, 0.0).unwrap(), 30.0);
        assert_eq!(integrator.update(12.0, 0.0).unwrap(), 30.0);
    }

    #[test]
    fn test_time_regression_rejected() {
        let mut integrator = TrapezoidIntegrator::default();
        integrator.update(1.0, 1.0).unwrap();
        integrator.update(2.0, 1.0).unwrap();

        let err = integrator.update(1.5, 1.0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!((integrator.integral() - 1.0).abs() < 1e-12);
    }
}
