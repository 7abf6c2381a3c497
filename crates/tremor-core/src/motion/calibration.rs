//! Acceleration zero-offset calibration
//!
//! The device must sit still for the whole run. Nothing checks that: a bump
//! during calibration ends up baked into the offset.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::{info, warn};

use crate::config::CalibrationConfig;
use crate::sensors::{CalibrationOffset, Mpu6050, PhysicalSample, SensorError};

/// Average `config.samples` acceleration reads and install the mean as the
/// device's new offset.
///
/// Any previous offset is dropped first, so calling this again recalibrates
/// from scratch. If a read fails part way, the previous offset is put back
/// and the bus error is returned.
///
/// This blocks the caller for roughly `samples × inter_sample_delay_ms`.
pub async fn calibrate<I, D>(
    mpu: &mut Mpu6050<I>,
    delay: &mut D,
    config: &CalibrationConfig,
) -> Result<CalibrationOffset, SensorError>
where
    I: I2c,
    D: DelayNs,
{
    if config.samples == 0 {
        return Err(SensorError::InvalidSampleCount);
    }

    let previous = mpu.clear_calibration();
    let mut sum = PhysicalSample::ZERO;

    for _ in 0..config.samples {
        match mpu.read_acceleration().await {
            Ok(sample) => sum += sample,
            Err(e) => {
                warn!("Calibration aborted: {}", e);
                if let Some(offset) = previous {
                    mpu.set_calibration(offset);
                }
                return Err(e);
            }
        }
        delay.delay_ms(config.inter_sample_delay_ms).await;
    }

    let offset = sum / f64::from(config.samples);
    mpu.set_calibration(offset);
    info!(
        "Calibrated acceleration offset over {} samples: x={:.4} y={:.4} z={:.4}",
        config.samples, offset.x, offset.y, offset.z
    );

    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::registers::Register;
    use crate::testing::{MockBus, NoDelay};
    use embassy_futures::block_on;

    fn sensor(bus: &MockBus) -> Mpu6050<MockBus> {
        block_on(Mpu6050::new(bus.handle(), 0x68)).unwrap()
    }

    #[test]
    fn test_offset_is_per_axis_mean() {
        let bus = MockBus::with_device(0x68);
        bus.queue_register(Register::AccelXoutH.addr(), &[100, 200, 300, 400]);
        bus.queue_register(Register::AccelYoutH.addr(), &[-50, -50, -50, -50]);
        bus.queue_register(Register::AccelZoutH.addr(), &[16384, 16384, 16384, 16384]);

        let mut mpu = sensor(&bus);
        let mut delay = NoDelay::default();
        let config = CalibrationConfig {
            samples: 4,
            inter_sample_delay_ms: 25,
        };
        let offset = block_on(calibrate(&mut mpu, &mut delay, &config)).unwrap();

        let unit = 9.81 / 16384.0;
        assert!((offset.x - 250.0 * unit).abs() < 1e-9);
        assert!((offset.y + 50.0 * unit).abs() < 1e-9);
        assert!((offset.z - 9.81).abs() < 1e-9);
        assert_eq!(mpu.calibration(), Some(offset));
    }

    #[test]
    fn test_reading_at_mean_returns_zero_after_calibration() {
        let bus = MockBus::with_device(0x68);
        bus.set_register(Register::AccelXoutH.addr(), 1200);
        bus.set_register(Register::AccelYoutH.addr(), -800);
        bus.set_register(Register::AccelZoutH.addr(), 16000);

        let mut mpu = sensor(&bus);
        block_on(calibrate(
            &mut mpu,
            &mut NoDelay::default(),
            &CalibrationConfig::default(),
        ))
        .unwrap();

        let residual = block_on(mpu.read_acceleration()).unwrap();
        assert!(residual.x.abs() < 1e-9);
        assert!(residual.y.abs() < 1e-9);
        assert!(residual.z.abs() < 1e-9);
    }

    #[test]
    fn test_sampling_count_and_delay() {
        let bus = MockBus::with_device(0x68);
        let mut mpu = sensor(&bus);
        let mut delay = NoDelay::default();
        let config = CalibrationConfig::default();

        block_on(calibrate(&mut mpu, &mut delay, &config)).unwrap();

        // three register pairs per sample
        assert_eq!(bus.reads(), 3 * 100);
        assert_eq!(delay.calls, 100);
        assert_eq!(delay.total_ns, 100 * 25 * 1_000_000);
    }

    #[test]
    fn test_recalibration_discards_previous_offset() {
        let bus = MockBus::with_device(0x68);
        bus.set_register(Register::AccelZoutH.addr(), 16384);

        let mut mpu = sensor(&bus);
        mpu.set_calibration(PhysicalSample::new(3.0, 3.0, 3.0));

        let config = CalibrationConfig {
            samples: 10,
            inter_sample_delay_ms: 0,
        };
        let first = block_on(calibrate(&mut mpu, &mut NoDelay::default(), &config)).unwrap();
        let second = block_on(calibrate(&mut mpu, &mut NoDelay::default(), &config)).unwrap();

        assert_eq!(first.x, 0.0);
        assert_eq!(first.y, 0.0);
        assert!((first.z - 9.81).abs() < 1e-9);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let bus = MockBus::with_device(0x68);
        let mut mpu = sensor(&bus);
        let config = CalibrationConfig {
            samples: 0,
            inter_sample_delay_ms: 25,
        };
        let result = block_on(calibrate(&mut mpu, &mut NoDelay::default(), &config));
        assert_eq!(result, Err(SensorError::InvalidSampleCount));
        assert_eq!(mpu.calibration(), None);
    }

    #[test]
    fn test_bus_failure_restores_previous_offset() {
        let bus = MockBus::with_device(0x68);
        let mut mpu = sensor(&bus);
        let previous = PhysicalSample::new(0.1, 0.2, 9.7);
        mpu.set_calibration(previous);

        bus.set_failing(true);
        let result = block_on(calibrate(
            &mut mpu,
            &mut NoDelay::default(),
            &CalibrationConfig::default(),
        ));

        assert!(matches!(result, Err(SensorError::Bus { .. })));
        assert_eq!(mpu.calibration(), Some(previous));
    }
}
