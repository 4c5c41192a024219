// Motor driver capabilities and the range-mapping speed controller
//
// Concrete drivers only know their native ("raw") speed domain.
// RangedSpeedController sits on top and lets callers program in the
// logical interface range declared by MotorInfo.

use crate::error::Result;

use super::info::{MotorInfo, Speed, SpeedRange};

/// Raw speed access supplied by each concrete motor driver
pub trait MotorDriver {
    fn set_speed_raw(&mut self, speed: Speed) -> Result<()>;

    fn speed_raw(&self) -> Result<Speed>;
}

/// One-time binding of a controller to its hardware port
pub trait PortInit<P> {
    fn init(&mut self, port: P) -> Result<()>;
}

/// Speed control in the logical interface domain
pub trait SpeedController {
    fn info(&self) -> &MotorInfo;

    fn set_speed(&mut self, speed: Speed) -> Result<()>;

    fn speed(&self) -> Result<Speed>;

    /// Set a speed expressed in an arbitrary third range
    fn set_speed_in_range(&mut self, speed: Speed, range: SpeedRange) -> Result<()> {
        let interface = self.info().interface_speed_range;
        self.set_speed(interface.map_value_from_range(range.restrict(speed), &range))
    }

    fn in_speed_range(&self, speed: Speed) -> bool {
        self.info().interface_speed_range.contains(speed)
    }
}

/// Maps interface speeds onto a driver's physical range
#[derive(Debug)]
pub struct RangedSpeedController<D> {
    info: MotorInfo,
    driver: D,
}

impl<D: MotorDriver> RangedSpeedController<D> {
    pub fn new(info: MotorInfo, driver: D) -> Self {
        Self { info, driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: MotorDriver> SpeedController for RangedSpeedController<D> {
    fn info(&self) -> &MotorInfo {
        &self.info
    }

    /// Clamp to the interface range, then map onto the physical range
    fn set_speed(&mut self, speed: Speed) -> Result<()> {
        let interface = &self.info.interface_speed_range;
        let signed = if self.info.reversed { -speed } else { speed };
        let raw = interface.map_value_to_range(interface.restrict(signed), &self.info.speed_range);
        self.driver.set_speed_raw(raw)
    }

    fn speed(&self) -> Result<Speed> {
        let raw = self.driver.speed_raw()?;
        let mapped = self
            .info
            .speed_range
            .map_value_to_range(raw, &self.info.interface_speed_range);
        Ok(if self.info.reversed { -mapped } else { mapped })
    }
}

impl<P, D: MotorDriver + PortInit<P>> PortInit<P> for RangedSpeedController<D> {
    fn init(&mut self, port: P) -> Result<()> {
        self.driver.init(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::SimulatedMotor;

    fn info(reversed: bool) -> MotorInfo {
        MotorInfo::new(
            0.0,
            1.0,
            1.0,
            SpeedRange::symmetric(3000.0),
            SpeedRange::symmetric(10.0),
            reversed,
        )
    }

    #[test]
    fn test_maps_onto_physical_range() {
        let mut ctrl = RangedSpeedController::new(info(false), SimulatedMotor::default());
        ctrl.set_speed(5.0).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), 1500.0);
    }

    #[test]
    fn test_reversed_inverts_sign() {
        let mut ctrl = RangedSpeedController::new(info(true), SimulatedMotor::default());
        ctrl.set_speed(5.0).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), -1500.0);
    }

    #[test]
    fn test_round_trip_within_interface_range() {
        for reversed in [false, true] {
            let mut ctrl = RangedSpeedController::new(info(reversed), SimulatedMotor::default());
            for i in -20..=20 {
                let speed = i as f64 * 0.5;
                ctrl.set_speed(speed).unwrap();
                let read = ctrl.speed().unwrap();
                assert!(
                    (read - speed).abs() < 1e-9,
                    "reversed={} set {} read {}",
                    reversed,
                    speed,
                    read
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let mut ctrl = RangedSpeedController::new(info(false), SimulatedMotor::default());
        ctrl.set_speed(25.0).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), 3000.0);
        assert!(!ctrl.in_speed_range(25.0));
    }

    #[test]
    fn test_speed_in_custom_range() {
        // Percent throttle 0..100 onto interface -10..10
        let mut ctrl = RangedSpeedController::new(info(false), SimulatedMotor::default());
        ctrl.set_speed_in_range(75.0, SpeedRange::new(0.0, 100.0)).unwrap();
        assert!((ctrl.speed().unwrap() - 5.0).abs() < 1e-9);

        ctrl.set_speed_in_range(150.0, SpeedRange::new(0.0, 100.0)).unwrap();
        assert!((ctrl.speed().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_in_inverted_range() {
        // 100..0 runs backwards: 25 sits three quarters of the way to -10
        let mut ctrl = RangedSpeedController::new(info(false), SimulatedMotor::default());
        ctrl.set_speed_in_range(25.0, SpeedRange::new(100.0, 0.0)).unwrap();
        assert!((ctrl.speed().unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_width_custom_range_stops() {
        let mut ctrl = RangedSpeedController::new(info(false), SimulatedMotor::default());
        ctrl.set_speed(5.0).unwrap();
        ctrl.set_speed_in_range(0.0, SpeedRange::new(0.0, 0.0)).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), 0.0);
    }

    #[test]
    fn test_inverted_interface_range_does_not_abort() {
        let mut inverted = info(false);
        inverted.interface_speed_range = SpeedRange::new(10.0, -10.0);
        let mut ctrl = RangedSpeedController::new(inverted, SimulatedMotor::default());

        ctrl.set_speed(0.0).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), 0.0);
        ctrl.set_speed(25.0).unwrap();
        assert_eq!(ctrl.driver().speed_raw().unwrap(), -3000.0);
    }
}
