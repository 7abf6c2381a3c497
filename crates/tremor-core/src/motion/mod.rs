//! Motion processing on top of the raw driver: calibration, gyro
//! integration and the alarm threshold

pub mod calibration;
pub mod orientation;

use serde::{Deserialize, Serialize};

use crate::sensors::PhysicalSample;

pub use calibration::calibrate;
pub use orientation::{GyroBiasOffset, OrientationIntegrator, OrientationState};

/// Default per-axis alarm threshold (m/s², after calibration)
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// Per-axis acceleration limits for the motion alarm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionThreshold {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for MotionThreshold {
    fn default() -> Self {
        Self::uniform(DEFAULT_THRESHOLD)
    }
}

impl MotionThreshold {
    pub const fn uniform(limit: f64) -> Self {
        Self {
            x: limit,
            y: limit,
            z: limit,
        }
    }

    /// True when any axis magnitude is strictly above its limit.
    ///
    /// A value sitting exactly on the limit does not trip the alarm.
    pub fn exceeded_by(&self, sample: &PhysicalSample) -> bool {
        sample.x.abs() > self.x || sample.y.abs() > self.y || sample.z.abs() > self.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strict() {
        let threshold = MotionThreshold::default();
        assert!(!threshold.exceeded_by(&PhysicalSample::new(0.45, 0.0, 0.0)));
        assert!(!threshold.exceeded_by(&PhysicalSample::new(0.0, -0.45, 0.45)));
        assert!(threshold.exceeded_by(&PhysicalSample::new(0.4501, 0.0, 0.0)));
    }

    #[test]
    fn test_threshold_uses_magnitude_per_axis() {
        let threshold = MotionThreshold {
            x: 1.0,
            y: 0.2,
            z: 5.0,
        };
        assert!(threshold.exceeded_by(&PhysicalSample::new(0.0, -0.3, 0.0)));
        assert!(!threshold.exceeded_by(&PhysicalSample::new(-0.9, 0.1, 4.9)));
        assert!(threshold.exceeded_by(&PhysicalSample::new(0.0, 0.0, -5.1)));
    }
}
