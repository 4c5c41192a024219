// Motion control toolkit for wheeled robot bases
//
// orientation -> heading PID -> platform kinematics -> motor speed mapping,
// plus a trapezoidal motion profile and a zenoh runtime driving Feetech wheels.

pub mod config;
pub mod error;
pub mod integrator;
pub mod messages;
pub mod motion;
pub mod motor;
pub mod orientation;
pub mod pid;
pub mod platform;
pub mod runtime;
pub mod time;

pub use error::{Error, ErrorKind, Result};
