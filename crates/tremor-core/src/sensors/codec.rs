//! Register decoding and unit conversion for the MPU-6050
//!
//! The sensor runs at its power-on defaults: ±2 g accelerometer range and
//! ±250 °/s gyroscope range. All conversions below assume that.

/// Accelerometer sensitivity at ±2 g (LSB per g)
pub const ACCEL_LSB_PER_G: f64 = 16384.0;

/// Standard gravity used for the m/s² conversion
pub const GRAVITY_MS2: f64 = 9.81;

/// Gyroscope sensitivity at ±250 °/s (LSB per °/s)
pub const GYRO_LSB_PER_DPS: f64 = 131.0;

/// Nominal orientation tick period in seconds.
///
/// The gyro conversion multiplies by this, so a converted angular-rate sample
/// is really "degrees turned during one 100 ms tick" rather than °/s.
pub const GYRO_TICK_SECONDS: f64 = 0.1;

/// Temperature sensitivity (LSB per °C)
pub const TEMP_LSB_PER_C: f64 = 340.0;

/// Temperature reading at raw zero (°C)
pub const TEMP_OFFSET_C: f64 = 36.53;

/// Decode a big-endian two's-complement register pair.
#[inline]
pub const fn decode_signed_16(byte_hi: u8, byte_lo: u8) -> i16 {
    i16::from_be_bytes([byte_hi, byte_lo])
}

/// Raw accelerometer value to m/s².
#[inline]
pub fn acceleration_units(raw: i16) -> f64 {
    f64::from(raw) / ACCEL_LSB_PER_G * GRAVITY_MS2
}

/// Raw gyroscope value to degrees per nominal tick.
#[inline]
pub fn angular_rate_units(raw: i16) -> f64 {
    f64::from(raw) / GYRO_LSB_PER_DPS * GYRO_TICK_SECONDS
}

#[inline]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Raw temperature value to °F.
#[inline]
pub fn temperature_units(raw: i16) -> f64 {
    celsius_to_fahrenheit(f64::from(raw) / TEMP_LSB_PER_C + TEMP_OFFSET_C)
}
