//! Dead-reckoned orientation from the gyroscope
//!
//! Each tick adds one angular-rate sample (already scaled to degrees per
//! nominal tick) minus the bias captured at startup. Elapsed time is never
//! measured, a late tick counts the same as an on-time one. There is no
//! drift correction and no wrap-around, so the angles walk away over long
//! runtimes.

use embedded_hal_async::i2c::I2c;
use log::{debug, info};

use crate::sensors::{Mpu6050, PhysicalSample, SensorError};

/// Zero-rate gyro error captured while the device is assumed stationary
pub type GyroBiasOffset = PhysicalSample;

/// Accumulated angles in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationState {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Debug, Clone)]
pub struct OrientationIntegrator {
    bias: GyroBiasOffset,
    state: OrientationState,
    ticks: u64,
}

impl OrientationIntegrator {
    /// Capture one angular-rate sample as the bias. The device must be still.
    pub async fn new<I: I2c>(mpu: &mut Mpu6050<I>) -> Result<Self, SensorError> {
        let bias = mpu.read_angular_rate().await?;
        info!(
            "Gyro bias captured: x={:.4} y={:.4} z={:.4}",
            bias.x, bias.y, bias.z
        );
        Ok(Self::with_bias(bias))
    }

    pub const fn with_bias(bias: GyroBiasOffset) -> Self {
        Self {
            bias,
            state: OrientationState {
                pitch: 0.0,
                roll: 0.0,
                yaw: 0.0,
            },
            ticks: 0,
        }
    }

    /// Read the gyro once and fold it into the running angles.
    ///
    /// On a bus error the state is left as it was and the tick is lost.
    pub async fn tick<I: I2c>(
        &mut self,
        mpu: &mut Mpu6050<I>,
    ) -> Result<OrientationState, SensorError> {
        let rate = mpu.read_angular_rate().await?;
        Ok(self.apply(rate))
    }

    /// Integrate one angular-rate sample.
    ///
    /// Axis mapping: gyro Y drives pitch, gyro X drives roll, gyro Z drives yaw.
    pub fn apply(&mut self, rate: PhysicalSample) -> OrientationState {
        let delta = rate - self.bias;
        self.state.pitch += delta.y;
        self.state.roll += delta.x;
        self.state.yaw += delta.z;
        self.ticks += 1;
        debug!(
            "Orientation: pitch={:.3} roll={:.3} yaw={:.3}",
            self.state.pitch, self.state.roll, self.state.yaw
        );
        self.state
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    pub fn bias(&self) -> GyroBiasOffset {
        self.bias
    }

    /// Number of samples integrated so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
