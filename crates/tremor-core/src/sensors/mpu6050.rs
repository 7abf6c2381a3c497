//! Async MPU-6050 driver
//!
//! Owns the I2C bus handle and the device address, wakes the sensor once at
//! construction, and exposes acceleration, angular-rate and temperature reads
//! in physical units. Bus failures are reported as [`SensorError::Bus`] and
//! never retried here; retry policy belongs to whoever schedules the reads.

use embedded_hal_async::i2c::I2c;
use heapless::Vec;
use log::{debug, error, info};

use super::registers::{self, Register};
use super::{CalibrationOffset, PhysicalSample, SensorError, codec};

/// Number of addresses probed by [`scan`]
pub const SCAN_CAPACITY: usize = (registers::SCAN_LAST_ADDRESS - registers::SCAN_FIRST_ADDRESS) as usize + 1;

/// Probe every 7-bit address with an empty write and collect the ones that ACK.
///
/// Addresses are returned in ascending order.
pub async fn scan<I: I2c>(i2c: &mut I) -> Vec<u8, SCAN_CAPACITY> {
    let mut found = Vec::new();
    for address in registers::SCAN_FIRST_ADDRESS..=registers::SCAN_LAST_ADDRESS {
        if i2c.write(address, &[]).await.is_ok() {
            debug!("I2C scan: device at {:#04x}", address);
            // capacity covers the whole probed range
            let _ = found.push(address);
        }
    }
    found
}

/// Return the first address that answers a bus scan.
pub async fn discover<I: I2c>(i2c: &mut I) -> Result<u8, SensorError> {
    scan(i2c)
        .await
        .first()
        .copied()
        .ok_or(SensorError::DeviceNotFound)
}

/// InvenSense MPU-6050 driver
pub struct Mpu6050<I> {
    i2c: I,
    address: u8,
    calibration: Option<CalibrationOffset>,
}

impl<I: I2c> Mpu6050<I> {
    /// Wrap a device at a known address and wake it from sleep mode.
    pub async fn new(i2c: I, address: u8) -> Result<Self, SensorError> {
        let mut sensor = Self {
            i2c,
            address,
            calibration: None,
        };
        sensor
            .write_register(Register::PwrMgmt1, registers::WAKE, "wake from sleep")
            .await?;
        info!("Initialized MPU-6050 at {:#04x}", address);
        Ok(sensor)
    }

    /// Scan the bus, take the first responding address and wake the device there.
    pub async fn discover(mut i2c: I) -> Result<Self, SensorError> {
        let address = discover(&mut i2c).await?;
        Self::new(i2c, address).await
    }

    /// Returns the underlying I2C bus, consuming this driver.
    pub fn release(self) -> I {
        self.i2c
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Currently installed acceleration offset, `None` before calibration.
    pub fn calibration(&self) -> Option<CalibrationOffset> {
        self.calibration
    }

    pub fn set_calibration(&mut self, offset: CalibrationOffset) {
        self.calibration = Some(offset);
    }

    /// Drop the installed offset so reads come back uncorrected.
    pub fn clear_calibration(&mut self) -> Option<CalibrationOffset> {
        self.calibration.take()
    }

    /// Acceleration in m/s² with the calibration offset subtracted.
    pub async fn read_acceleration(&mut self) -> Result<PhysicalSample, SensorError> {
        let [x, y, z] = self
            .read_triple(Register::ACCEL, "read acceleration")
            .await?;
        let sample = PhysicalSample::new(
            codec::acceleration_units(x),
            codec::acceleration_units(y),
            codec::acceleration_units(z),
        );
        Ok(sample - self.calibration.unwrap_or_default())
    }

    /// Angular rate in degrees per nominal tick. No offset is applied here.
    pub async fn read_angular_rate(&mut self) -> Result<PhysicalSample, SensorError> {
        let [x, y, z] = self
            .read_triple(Register::GYRO, "read angular rate")
            .await?;
        Ok(PhysicalSample::new(
            codec::angular_rate_units(x),
            codec::angular_rate_units(y),
            codec::angular_rate_units(z),
        ))
    }

    /// Die temperature in °F.
    pub async fn read_temperature(&mut self) -> Result<f64, SensorError> {
        let raw = self
            .read_pair(Register::TempOutH, "read temperature")
            .await?;
        Ok(codec::temperature_units(raw))
    }

    /// Raw `WHO_AM_I` value. Genuine parts answer `0x68`, clones vary.
    pub async fn read_who_am_i(&mut self) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.transfer(Register::WhoAmI, &mut buf, "read WHO_AM_I")
            .await?;
        Ok(buf[0])
    }

    async fn read_triple(
        &mut self,
        registers: [Register; 3],
        operation: &'static str,
    ) -> Result<[i16; 3], SensorError> {
        let mut values = [0_i16; 3];
        for (value, register) in values.iter_mut().zip(registers) {
            *value = self.read_pair(register, operation).await?;
        }
        Ok(values)
    }

    async fn read_pair(
        &mut self,
        register: Register,
        operation: &'static str,
    ) -> Result<i16, SensorError> {
        let mut buf = [0u8; 2];
        self.transfer(register, &mut buf, operation).await?;
        Ok(codec::decode_signed_16(buf[0], buf[1]))
    }

    async fn transfer(
        &mut self,
        register: Register,
        buf: &mut [u8],
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[register.addr()], buf)
            .await
            .map_err(|e| {
                error!(
                    "MPU-6050 {} failed at register {:#04x}: {:?}",
                    operation,
                    register.addr(),
                    e
                );
                SensorError::Bus {
                    operation,
                    register: register.addr(),
                }
            })
    }

    async fn write_register(
        &mut self,
        register: Register,
        value: u8,
        operation: &'static str,
    ) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register.addr(), value])
            .await
            .map_err(|e| {
                error!(
                    "MPU-6050 {} failed at register {:#04x}: {:?}",
                    operation,
                    register.addr(),
                    e
                );
                SensorError::Bus {
                    operation,
                    register: register.addr(),
                }
            })
    }
}
