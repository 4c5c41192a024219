// Wheeled platform: owns one speed controller per wheel
//
// Provides:
// - Parallel-axis grouping of wheels sharing a rolling direction
// - Best-effort batch speed application with aggregated errors
// - Inverse kinematics (kinematics) and gyro heading hold (gyro)

pub mod gyro;
pub mod kinematics;

use std::fmt::Debug;
use tracing::{debug, info, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::motor::{MotorInfo, PortInit, Speed, SpeedController, SpeedRange};

pub use gyro::{GoCommand, GyroPidCalculator, GyroPlatform};
pub use kinematics::{
    calculate_motor_linear_speed, calculate_motor_speed_linear_from_angular,
    calculate_platform_speeds,
};

/// Count, for every wheel, how many wheels roll along the same axis (itself included)
///
/// Two wheels are parallel when their mount angles are equal or opposite once
/// the difference is rounded to `precision` decimal places.
pub fn update_parallel_axes(config: &mut [MotorInfo], precision: u32) {
    for motor in config.iter_mut() {
        motor.parallel_axes = 1;
    }

    let scale = 10f64.powi(precision as i32);
    let half_turn = (180.0 * scale).round();
    let full_turn = (360.0 * scale).round();

    for i in 0..config.len() {
        for j in i + 1..config.len() {
            let diff = ((config[i].angle_pos - config[j].angle_pos).abs() % 360.0 * scale).round();
            if diff == 0.0 || diff == half_turn || diff == full_turn {
                config[i].parallel_axes += 1;
                config[j].parallel_axes += 1;
            }
        }
    }
}

pub struct Platform<C> {
    /// Geometry with parallel-axis counts, index-aligned with `controllers`
    config: Vec<MotorInfo>,
    controllers: Vec<C>,
}

impl<C: SpeedController> Platform<C> {
    /// Build one controller per wheel after computing parallel-axis counts
    pub fn new(
        mut config: Vec<MotorInfo>,
        parallelism_precision: u32,
        build: impl FnMut(MotorInfo) -> C,
    ) -> Self {
        update_parallel_axes(&mut config, parallelism_precision);
        debug!(
            "Platform with {} wheels, parallel axes {:?}",
            config.len(),
            config.iter().map(|m| m.parallel_axes).collect::<Vec<_>>()
        );
        let controllers = config.iter().copied().map(build).collect();
        Self {
            config,
            controllers,
        }
    }

    /// Wheel geometry, index-aligned with the controllers
    pub fn config(&self) -> &[MotorInfo] {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn controllers(&self) -> &[C] {
        &self.controllers
    }

    /// Apply one interface speed per wheel
    ///
    /// A length mismatch is rejected before any wheel is touched. Otherwise
    /// every wheel is attempted; failures are collected into one error
    /// carrying the kind of the first failure.
    pub fn set_speeds(&mut self, speeds: &[Speed]) -> Result<()> {
        if speeds.len() != self.controllers.len() {
            return Err(Error::InvalidArgument(format!(
                "got {} speeds for {} motor controllers",
                speeds.len(),
                self.controllers.len()
            )));
        }

        self.apply_each(|i, controller| controller.set_speed(speeds[i]))
    }

    /// Like `set_speeds`, each speed expressed in its own range
    pub fn set_speeds_in_ranges(&mut self, speeds: &[Speed], ranges: &[SpeedRange]) -> Result<()> {
        if speeds.len() != self.controllers.len() || ranges.len() != self.controllers.len() {
            return Err(Error::InvalidArgument(format!(
                "got {} speeds and {} ranges for {} motor controllers",
                speeds.len(),
                ranges.len(),
                self.controllers.len()
            )));
        }

        self.apply_each(|i, controller| controller.set_speed_in_range(speeds[i], ranges[i]))
    }

    pub fn stop(&mut self) -> Result<()> {
        self.apply_each(|_, controller| controller.set_speed(0.0))
    }

    /// Current interface speed of every wheel
    pub fn speeds(&self) -> Result<Vec<Speed>> {
        self.controllers.iter().map(|c| c.speed()).collect()
    }

    fn apply_each(&mut self, mut apply: impl FnMut(usize, &mut C) -> Result<()>) -> Result<()> {
        let mut first_kind: Option<ErrorKind> = None;
        let mut failures = Vec::new();

        for (i, controller) in self.controllers.iter_mut().enumerate() {
            if let Err(e) = apply(i, controller) {
                warn!("Could not apply speed to motor {}: {}", i, e);
                first_kind.get_or_insert(e.kind());
                failures.push(format!("motor {}: {}", i, e));
            }
        }

        match first_kind {
            None => Ok(()),
            Some(kind) => Err(Error::Actuation { kind, failures }),
        }
    }

    /// Bind every controller to its port, stopping at the first failure
    pub fn init<P>(&mut self, ports: &[P]) -> Result<()>
    where
        P: Clone + Debug,
        C: PortInit<P>,
    {
        let count = self.controllers.len();
        for (i, controller) in self.controllers.iter_mut().enumerate() {
            let port = ports.get(i).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "no port given for platform motor {} ({} ports for {} motors)",
                    i,
                    ports.len(),
                    count
                ))
            })?;

            controller.init(port.clone()).map_err(|e| {
                Error::InitFailed(format!(
                    "platform motor {} on port {:?}: {}",
                    i, port, e
                ))
            })?;
        }

        info!("Initialized {} platform motors", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::{MotorDriver, RangedSpeedController, SimulatedMotor};

    fn wheel(angle: f64) -> MotorInfo {
        MotorInfo::new(
            angle,
            1.0,
            1.0,
            SpeedRange::symmetric(1000.0),
            SpeedRange::symmetric(10.0),
            false,
        )
    }

    fn sim_platform(angles: &[f64]) -> Platform<RangedSpeedController<SimulatedMotor>> {
        let config = angles.iter().map(|&a| wheel(a)).collect();
        Platform::new(config, 0, |info| {
            RangedSpeedController::new(info, SimulatedMotor::default())
        })
    }

    fn raw_speeds(platform: &Platform<RangedSpeedController<SimulatedMotor>>) -> Vec<f64> {
        platform
            .controllers()
            .iter()
            .map(|c| c.driver().speed_raw().unwrap())
            .collect()
    }

    #[test]
    fn test_parallel_axes_grouping() {
        let platform = sim_platform(&[0.0, 180.0, 90.0]);
        let counts: Vec<_> = platform.config().iter().map(|m| m.parallel_axes).collect();
        assert_eq!(counts, vec![2, 2, 1]);
    }

    #[test]
    fn test_parallel_axes_precision() {
        let mut config = vec![wheel(0.0), wheel(180.04), wheel(0.4)];
        update_parallel_axes(&mut config, 0);
        assert_eq!(
            config.iter().map(|m| m.parallel_axes).collect::<Vec<_>>(),
            vec![3, 3, 3]
        );

        update_parallel_axes(&mut config, 1);
        assert_eq!(
            config.iter().map(|m| m.parallel_axes).collect::<Vec<_>>(),
            vec![2, 2, 1]
        );
    }

    #[test]
    fn test_full_turn_is_parallel() {
        let mut config = vec![wheel(0.0), wheel(360.0), wheel(-180.0)];
        update_parallel_axes(&mut config, 2);
        assert!(config.iter().all(|m| m.parallel_axes == 3));
    }

    #[test]
    fn test_set_speeds_applies_all() {
        let mut platform = sim_platform(&[0.0, 120.0, 240.0]);
        platform.set_speeds(&[1.0, -2.0, 10.0]).unwrap();
        assert_eq!(raw_speeds(&platform), vec![100.0, -200.0, 1000.0]);
        let speeds = platform.speeds().unwrap();
        assert!((speeds[1] + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_touches_nothing() {
        let mut platform = sim_platform(&[0.0, 120.0, 240.0]);
        platform.set_speeds(&[1.0, 1.0, 1.0]).unwrap();

        let err = platform.set_speeds(&[5.0, 5.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(raw_speeds(&platform), vec![100.0, 100.0, 100.0]);

        let err = platform
            .set_speeds_in_ranges(&[5.0, 5.0, 5.0], &[SpeedRange::symmetric(1.0)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(raw_speeds(&platform), vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_best_effort_with_aggregated_error() {
        let config = vec![wheel(0.0), wheel(90.0), wheel(180.0), wheel(270.0)];
        let mut index = 0;
        let mut platform = Platform::new(config, 0, |info| {
            index += 1;
            let driver = match index {
                2 => SimulatedMotor::faulty("wheel 2 stalled"),
                4 => SimulatedMotor::faulty("wheel 4 stalled"),
                _ => SimulatedMotor::default(),
            };
            RangedSpeedController::new(info, driver)
        });

        let err = platform.set_speeds(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResource);
        let Error::Actuation { failures, .. } = &err else {
            panic!("expected aggregated error, got {:?}", err);
        };
        assert_eq!(failures.len(), 2);
        assert!(failures[0].contains("wheel 2 stalled"));
        assert!(failures[1].contains("wheel 4 stalled"));

        // healthy wheels still got their speed
        assert_eq!(platform.controllers()[0].driver().speed_raw().unwrap(), 100.0);
        assert_eq!(platform.controllers()[2].driver().speed_raw().unwrap(), 300.0);
    }

    #[test]
    fn test_speeds_in_ranges() {
        let mut platform = sim_platform(&[0.0, 180.0]);
        platform
            .set_speeds_in_ranges(
                &[50.0, 0.0],
                &[SpeedRange::new(0.0, 100.0), SpeedRange::new(0.0, 100.0)],
            )
            .unwrap();
        assert_eq!(raw_speeds(&platform), vec![0.0, -1000.0]);
    }

    #[test]
    fn test_speeds_in_inverted_range() {
        let mut platform = sim_platform(&[0.0]);
        platform
            .set_speeds_in_ranges(&[25.0], &[SpeedRange::new(100.0, 0.0)])
            .unwrap();
        assert_eq!(raw_speeds(&platform), vec![500.0]);
    }

    #[test]
    fn test_stop_zeroes_every_wheel() {
        let mut platform = sim_platform(&[0.0, 120.0, 240.0]);
        platform.set_speeds(&[3.0, 3.0, 3.0]).unwrap();
        platform.stop().unwrap();
        assert_eq!(raw_speeds(&platform), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_init_binds_ports() {
        let mut platform = sim_platform(&[0.0, 120.0, 240.0]);
        platform.init(&[7u8, 8, 9]).unwrap();
        let ports: Vec<_> = platform
            .controllers()
            .iter()
            .map(|c| c.driver().port())
            .collect();
        assert_eq!(ports, vec![Some(7), Some(8), Some(9)]);
    }

    #[test]
    fn test_init_missing_port_names_index() {
        let mut platform = sim_platform(&[0.0, 120.0, 240.0]);
        let err = platform.init(&[7u8, 8]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("motor 2"));
    }

    #[test]
    fn test_init_failure_is_fail_fast() {
        let config = vec![wheel(0.0), wheel(120.0), wheel(240.0)];
        let mut index = 0;
        let mut platform = Platform::new(config, 0, |info| {
            index += 1;
            let driver = if index == 2 {
                SimulatedMotor::faulty("no answer")
            } else {
                SimulatedMotor::default()
            };
            RangedSpeedController::new(info, driver)
        });

        let err = platform.init(&[7u8, 8, 9]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InitFailed);
        assert!(err.to_string().contains("motor 1 on port 8"));
        assert_eq!(platform.controllers()[0].driver().port(), Some(7));
        assert_eq!(platform.controllers()[2].driver().port(), None);
    }
}
