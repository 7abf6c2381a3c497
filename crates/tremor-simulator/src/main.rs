//! Desktop simulator for the tremor motion alarm.
//!
//! Runs the real `MotionMonitor` from tremor-core against a simulated MPU-6050
//! and logging collaborators, with shortened periods so every path shows up
//! within a minute.
//!
//! # Timeline
//!
//! | What              | When                                   |
//! |-------------------|----------------------------------------|
//! | status poll       | every 6 s, ACTIVATE / DEACTIVATE pairs |
//! | motion poll       | every 1 s                              |
//! | orientation tick  | every 100 ms                           |
//! | bump on the IMU   | 1.5 s out of every 15 s, from 10 s on  |
//!
//! Run with `RUST_LOG=info` (or `debug` for per-tick samples).

use std::time::Instant;

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};
use log::{error, info, warn};

use tremor_core::collaborators::{
    AlertPayload, AlertSink, CollaboratorError, IndicatorColor, IndicatorOutput, StatusSource,
    StatusValue,
};
use tremor_core::config::MonitorConfig;
use tremor_core::scheduler::MotionMonitor;
use tremor_core::sensors::Mpu6050;
use tremor_core::sensors::registers::{self, Register};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Address the simulated IMU answers on.
const IMU_ADDRESS: u8 = registers::DEFAULT_ADDRESS;

/// First bump, well after calibration and gyro bias capture have finished.
const FIRST_BUMP_SECS: f64 = 10.0;

/// Time between the start of two bumps.
const BUMP_PERIOD_SECS: f64 = 15.0;

/// How long a bump lasts.
const BUMP_LENGTH_SECS: f64 = 1.5;

/// Status polls per ACTIVATE / DEACTIVATE phase.
const POLLS_PER_PHASE: u32 = 2;

/// Raw reading for 1 g on the accelerometer.
const ONE_G_RAW: f64 = 16384.0;

/// Raw temperature for roughly 22 °C die temperature.
const ROOM_TEMPERATURE_RAW: i16 = -4940;

fn simulator_config() -> MonitorConfig {
    MonitorConfig {
        status_period_ms: 6_000,
        motion_period_ms: 1_000,
        orientation_period_ms: Some(100),
        collaborator_timeout_ms: 2_000,
        ..MonitorConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Simulated MPU-6050
// ---------------------------------------------------------------------------

/// An MPU-6050 sitting flat on a table that gets knocked every so often.
///
/// Data registers read zero until the sleep bit is cleared, like the real
/// part after power-on.
struct SimulatedImu {
    started: Instant,
    pointer: u8,
    awake: bool,
}

impl SimulatedImu {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            pointer: 0,
            awake: false,
        }
    }

    /// Raw value of a 16-bit register pair at `t` seconds since power-on.
    fn register_value(&self, register: u8, t: f64) -> i16 {
        if !self.awake {
            return 0;
        }

        let since_first = t - FIRST_BUMP_SECS;
        let bump = if since_first >= 0.0 && since_first % BUMP_PERIOD_SECS < BUMP_LENGTH_SECS {
            (t * 9.0).sin()
        } else {
            0.0
        };

        // Small deterministic jitter so calibration has something to average
        let jitter = |phase: f64| 18.0 * (t * 13.7 + phase).sin() + 6.0 * (t * 41.3 + phase).cos();

        let raw = match register {
            r if r == Register::AccelXoutH.addr() => 110.0 + jitter(0.0) + 3500.0 * bump,
            r if r == Register::AccelYoutH.addr() => -60.0 + jitter(1.0) + 1200.0 * bump,
            r if r == Register::AccelZoutH.addr() => ONE_G_RAW - 180.0 + jitter(2.0),
            r if r == Register::GyroXoutH.addr() => 25.0 + jitter(3.0) * 0.2,
            r if r == Register::GyroYoutH.addr() => -12.0 + jitter(4.0) * 0.2,
            r if r == Register::GyroZoutH.addr() => 7.0 + jitter(5.0) * 0.2 + 2600.0 * bump,
            r if r == Register::TempOutH.addr() => f64::from(ROOM_TEMPERATURE_RAW),
            r if r == Register::WhoAmI.addr() => f64::from(IMU_ADDRESS),
            _ => 0.0,
        };
        raw.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }
}

impl ErrorType for SimulatedImu {
    type Error = ErrorKind;
}

impl I2c for SimulatedImu {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != IMU_ADDRESS {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let t = self.started.elapsed().as_secs_f64();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => match **bytes {
                    [register, value] if register == Register::PwrMgmt1.addr() => {
                        self.awake = value & 0x40 == 0;
                        info!("Simulated IMU {}", if self.awake { "awake" } else { "asleep" });
                    }
                    [register, ..] => self.pointer = register,
                    [] => {}
                },
                Operation::Read(buf) => {
                    let value = self.register_value(self.pointer, t);
                    if buf.len() == 1 {
                        buf[0] = value as u8;
                    } else {
                        for (dst, src) in buf.iter_mut().zip(value.to_be_bytes()) {
                            *dst = src;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logging collaborators
// ---------------------------------------------------------------------------

/// Flips between ACTIVATE and DEACTIVATE every few polls.
struct ScriptedStatus {
    polls: u32,
}

impl StatusSource for ScriptedStatus {
    async fn poll(&mut self) -> Result<StatusValue, CollaboratorError> {
        let phase = self.polls / POLLS_PER_PHASE;
        self.polls += 1;

        // Pretend the network is slow now and then
        Timer::after(Duration::from_millis(150)).await;

        let status = if phase % 2 == 0 { "ACTIVATE" } else { "DEACTIVATE" };
        let mut value = StatusValue::new();
        value
            .push_str(status)
            .map_err(|_| CollaboratorError::Unavailable {
                collaborator: "scripted status",
                details: "status too long",
            })?;
        info!("Status source answered {:?}", status);
        Ok(value)
    }
}

struct LogAlertSink;

impl AlertSink for LogAlertSink {
    async fn send(&mut self, payload: AlertPayload) -> Result<(), CollaboratorError> {
        warn!(
            "ALERT: value1={} value2={} value3={}",
            payload.x, payload.y, payload.z
        );
        Ok(())
    }
}

struct LogIndicator;

impl IndicatorOutput for LogIndicator {
    fn set(&mut self, color: IndicatorColor) {
        let (r, g, b) = color.rgb();
        info!("Indicator → {} ({}, {}, {})", color.label(), r, g, b);
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    env_logger::init();
    info!("Starting tremor simulator");
    info!(
        "Bump every {} s for {} s from {} s on, status flips every {} polls",
        BUMP_PERIOD_SECS, BUMP_LENGTH_SECS, FIRST_BUMP_SECS, POLLS_PER_PHASE
    );

    let mpu = match Mpu6050::discover(SimulatedImu::new()).await {
        Ok(mpu) => mpu,
        Err(e) => {
            error!("No IMU on the simulated bus: {}", e);
            return;
        }
    };

    let mut monitor = MotionMonitor::new(
        mpu,
        ScriptedStatus { polls: 0 },
        LogAlertSink,
        LogIndicator,
        simulator_config(),
    );

    match monitor.mpu_mut().read_who_am_i().await {
        Ok(id) => info!("WHO_AM_I: {:#04x}", id),
        Err(e) => warn!("WHO_AM_I read failed: {}", e),
    }
    match monitor.mpu_mut().read_temperature().await {
        Ok(fahrenheit) => info!("Die temperature: {:.1} °F", fahrenheit),
        Err(e) => warn!("Temperature read failed: {}", e),
    }

    info!("Calibrating, keep the (simulated) device still");
    if let Err(e) = monitor.calibrate(&mut Delay).await {
        error!("Calibration failed: {}", e);
        return;
    }
    if let Err(e) = monitor.init_orientation().await {
        error!("Gyro bias capture failed: {}", e);
        return;
    }

    monitor.run().await
}
