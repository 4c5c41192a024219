// Inverse kinematics for an arbitrary wheel layout
//
// Each wheel contributes along its own rolling direction:
//   linear  = cos(travel - wheel angle) * speed / parallel wheels / wheel radius
//   angular = angular speed * distance / wheel radius
// Angles are in degrees, platform frame.

use crate::error::{Error, Result};
use crate::motor::{MotorInfo, Speed};

/// Share of a linear platform speed handled by one wheel
pub fn calculate_motor_linear_speed(motor: &MotorInfo, travel_angle: f64, speed: Speed) -> Result<Speed> {
    if motor.parallel_axes == 0 {
        return Err(Error::InvalidArgument(
            "amount of motors with parallel axes cannot be zero".into(),
        ));
    }

    if !motor.interface_speed_range.contains(speed) {
        return Err(Error::OutOfRange(format!(
            "speed {} is outside the motor interface range [{}, {}]",
            speed, motor.interface_speed_range.min, motor.interface_speed_range.max
        )));
    }

    let projection = (travel_angle - motor.angle_pos).to_radians().cos();
    Ok(projection * speed / motor.parallel_axes as f64 / motor.wheel_r)
}

/// Wheel speed needed to spin the platform at `angular_speed`
pub fn calculate_motor_speed_linear_from_angular(motor: &MotorInfo, angular_speed: f64) -> Speed {
    let wheel_r = if motor.wheel_r != 0.0 { motor.wheel_r } else { 1.0 };
    angular_speed * motor.distance / wheel_r
}

/// Per-wheel speeds for travelling at `angle` with `speed * speed_k` while spinning
///
/// Stops at the first wheel that cannot take its share; nothing partial is returned.
pub fn calculate_platform_speeds(
    config: &[MotorInfo],
    angle: f64,
    speed: Speed,
    speed_k: f64,
    angular_speed: f64,
) -> Result<Vec<Speed>> {
    config
        .iter()
        .map(|motor| {
            let linear = calculate_motor_linear_speed(motor, angle, speed * speed_k)?;
            Ok(linear + calculate_motor_speed_linear_from_angular(motor, angular_speed))
        })
        .collect()
}
