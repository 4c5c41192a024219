// Static per-wheel geometry and speed ranges

use serde::{Deserialize, Serialize};

pub type Speed = f64;

/// Closed numeric interval [min, max]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: Speed,
    pub max: Speed,
}

impl SpeedRange {
    pub const fn new(min: Speed, max: Speed) -> Self {
        Self { min, max }
    }

    /// Range spanning [-limit, limit]
    pub const fn symmetric(limit: Speed) -> Self {
        Self::new(-limit, limit)
    }

    pub fn contains(&self, value: Speed) -> bool {
        self.min <= value && value <= self.max
    }

    /// Bounds were given in ascending order
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    /// Clamp a value into the range, whichever way round the bounds are
    pub fn restrict(&self, value: Speed) -> Speed {
        value.clamp(self.min.min(self.max), self.min.max(self.max))
    }

    /// Linearly map a value of this range onto `target`
    ///
    /// A zero-width source range maps everything onto the middle of `target`.
    pub fn map_value_to_range(&self, value: Speed, target: &SpeedRange) -> Speed {
        let span = self.max - self.min;
        if span == 0.0 {
            return (target.min + target.max) / 2.0;
        }
        target.min + (value - self.min) * (target.max - target.min) / span
    }

    /// Linearly map a value of `source` onto this range
    pub fn map_value_from_range(&self, value: Speed, source: &SpeedRange) -> Speed {
        source.map_value_to_range(value, self)
    }
}

/// Mounting geometry and speed domains of one wheel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorInfo {
    /// Rolling direction of the wheel in degrees, platform frame
    pub angle_pos: f64,
    /// Distance from the rotation center
    pub distance: f64,
    pub wheel_r: f64,
    /// Native range understood by the driver
    pub speed_range: SpeedRange,
    /// Logical range callers program against
    pub interface_speed_range: SpeedRange,
    #[serde(default)]
    pub reversed: bool,
    /// Number of wheels sharing this rolling axis, itself included
    #[serde(skip, default = "one")]
    pub parallel_axes: usize,
}

fn one() -> usize {
    1
}

impl MotorInfo {
    pub fn new(
        angle_pos: f64,
        distance: f64,
        wheel_r: f64,
        speed_range: SpeedRange,
        interface_speed_range: SpeedRange,
        reversed: bool,
    ) -> Self {
        Self {
            angle_pos,
            distance,
            wheel_r,
            speed_range,
            interface_speed_range,
            reversed,
            parallel_axes: 1,
        }
    }
}
