// In-memory motor driver for simulation runs and tests

use crate::error::{Error, Result};

use super::driver::{MotorDriver, PortInit};
use super::feetech::FeetechMotor;
use super::info::Speed;

/// Motor that remembers the last raw speed it was given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedMotor {
    speed: Speed,
    port: Option<u8>,
    fault: Option<String>,
}

impl SimulatedMotor {
    /// A motor whose every command fails with `reason`
    pub fn faulty(reason: &str) -> Self {
        Self {
            fault: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn port(&self) -> Option<u8> {
        self.port
    }

    fn check(&self) -> Result<()> {
        match &self.fault {
            Some(reason) => Err(Error::InvalidResource(reason.clone())),
            None => Ok(()),
        }
    }
}

impl MotorDriver for SimulatedMotor {
    fn set_speed_raw(&mut self, speed: Speed) -> Result<()> {
        self.check()?;
        self.speed = speed;
        Ok(())
    }

    fn speed_raw(&self) -> Result<Speed> {
        self.check()?;
        Ok(self.speed)
    }
}

impl PortInit<u8> for SimulatedMotor {
    fn init(&mut self, port: u8) -> Result<()> {
        self.check()?;
        self.port = Some(port);
        Ok(())
    }
}

/// Driver chosen at startup: real bus or simulation
#[derive(Debug)]
pub enum WheelDriver {
    Feetech(FeetechMotor),
    Simulated(SimulatedMotor),
}

impl MotorDriver for WheelDriver {
    fn set_speed_raw(&mut self, speed: Speed) -> Result<()> {
        match self {
            WheelDriver::Feetech(motor) => motor.set_speed_raw(speed),
            WheelDriver::Simulated(motor) => motor.set_speed_raw(speed),
        }
    }

    fn speed_raw(&self) -> Result<Speed> {
        match self {
            WheelDriver::Feetech(motor) => motor.speed_raw(),
            WheelDriver::Simulated(motor) => motor.speed_raw(),
        }
    }
}

impl PortInit<u8> for WheelDriver {
    fn init(&mut self, port: u8) -> Result<()> {
        match self {
            WheelDriver::Feetech(motor) => motor.init(port),
            WheelDriver::Simulated(motor) => motor.init(port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_remembers_speed_and_port() {
        let mut motor = WheelDriver::Simulated(SimulatedMotor::default());
        motor.init(8).unwrap();
        motor.set_speed_raw(-120.0).unwrap();
        assert_eq!(motor.speed_raw().unwrap(), -120.0);

        let WheelDriver::Simulated(sim) = motor else {
            panic!("expected simulated driver");
        };
        assert_eq!(sim.port(), Some(8));
    }

    #[test]
    fn test_faulty_motor_rejects_everything() {
        let mut motor = SimulatedMotor::faulty("stalled");
        assert_eq!(
            motor.set_speed_raw(1.0).unwrap_err().kind(),
            ErrorKind::InvalidResource
        );
        assert!(motor.init(1).is_err());
        assert!(motor.speed_raw().is_err());
    }
}
