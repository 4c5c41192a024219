// Motor layer for wheeled platforms
//
// Provides:
// - Per-wheel geometry and speed ranges (MotorInfo)
// - Driver capability traits and the interface-range speed controller
// - Feetech STS3215 serial bus driver
// - Simulated driver for dry runs and tests

mod driver;
pub mod feetech;
mod info;
mod sim;

pub use driver::{MotorDriver, PortInit, RangedSpeedController, SpeedController};
pub use feetech::{FeetechBus, FeetechError, FeetechMotor, SharedBus};
pub use info::{MotorInfo, Speed, SpeedRange};
pub use sim::{SimulatedMotor, WheelDriver};
