//! MPU-6050 access: register codec, register map and the async driver

pub mod codec;
mod mpu6050;
pub mod registers;

use core::ops::{Add, AddAssign, Div, Sub};

use thiserror_no_std::Error;

pub use mpu6050::{Mpu6050, SCAN_CAPACITY, discover, scan};

/// Error types for sensor operations
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Nothing acknowledged during the bus scan
    #[error("No device responded on the I2C bus")]
    DeviceNotFound,

    /// An I2C transaction was NACKed or timed out
    #[error("I2C transaction failed while trying to {operation} (register {register:#04x})")]
    Bus {
        operation: &'static str,
        register: u8,
    },

    /// Calibration was asked to average zero samples
    #[error("Calibration needs at least one sample")]
    InvalidSampleCount,
}

/// A calibrated (x, y, z) reading in physical units.
///
/// Acceleration samples are in m/s², angular-rate samples in degrees per
/// nominal tick (see [`codec::angular_rate_units`]).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhysicalSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PhysicalSample {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for PhysicalSample {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for PhysicalSample {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for PhysicalSample {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f64> for PhysicalSample {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Per-axis acceleration bias measured at rest and subtracted from every
/// later acceleration read.
pub type CalibrationOffset = PhysicalSample;
