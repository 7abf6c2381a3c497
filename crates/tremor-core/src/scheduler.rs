//! The motion alarm's cooperative scheduler
//!
//! [`MotionMonitor`] owns the sensor, the orientation integrator, the three
//! collaborators and the armed flag. Three periodic activities share it:
//!
//! | Task        | Default period | Work                                         |
//! |-------------|----------------|----------------------------------------------|
//! | status      | 30 s           | poll the remote switch, update armed + LED   |
//! | motion      | 2 s            | when armed, compare acceleration to limits   |
//! | orientation | 100 ms         | integrate one gyro sample (optional)         |
//!
//! All three are driven from one loop in [`MotionMonitor::run`]. A tick runs
//! to completion before the next timer is looked at, so the armed flag is a
//! plain `bool` with a single writer (status) and a single reader (motion).
//! A slow network call delays the other tasks; collaborator ticks are capped
//! by `collaborator_timeout_ms`. Ticks a task misses meanwhile collapse into
//! a single late tick, so a stalled status poll never turns into a burst of
//! alerts.
//!
//! A failed tick is logged and dropped. The next tick starts from whatever
//! state the last successful one left behind.

use embassy_futures::select::{Either3, select3};
use embassy_time::{Duration, Instant, Timer, with_timeout};
use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::collaborators::{
    AlertPayload, AlertSink, CollaboratorError, IndicatorColor, IndicatorOutput, StatusSource,
};
use crate::config::MonitorConfig;
use crate::motion::{self, OrientationIntegrator, OrientationState};
use crate::sensors::{CalibrationOffset, Mpu6050, PhysicalSample, SensorError};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),
}

/// Result of one motion poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionOutcome {
    /// Not armed, the sensor was not read
    Disarmed,
    /// Armed and within limits
    Still(PhysicalSample),
    /// Armed and over a limit; the alert was handed to the sink
    Alerted(PhysicalSample),
}

/// Running counters, logged with every status tick. Counters saturate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub status_polls: u32,
    pub motion_polls: u32,
    pub alerts_sent: u32,
    pub orientation_ticks: u32,
    pub failed_ticks: u32,
    /// Most recent error that cost a tick
    pub last_failure: Option<MonitorError>,
}

pub struct MotionMonitor<I, S, A, L> {
    mpu: Mpu6050<I>,
    orientation: Option<OrientationIntegrator>,
    status: S,
    alerts: A,
    indicator: L,
    config: MonitorConfig,
    armed: bool,
    stats: MonitorStats,
}

impl<I, S, A, L> MotionMonitor<I, S, A, L>
where
    I: I2c,
    S: StatusSource,
    A: AlertSink,
    L: IndicatorOutput,
{
    /// Assemble the monitor. Starts disarmed with the indicator off.
    pub fn new(
        mpu: Mpu6050<I>,
        status: S,
        alerts: A,
        mut indicator: L,
        config: MonitorConfig,
    ) -> Self {
        indicator.set(IndicatorColor::Off);
        Self {
            mpu,
            orientation: None,
            status,
            alerts,
            indicator,
            config,
            armed: false,
            stats: MonitorStats::default(),
        }
    }

    /// Run acceleration calibration with the configured sample count.
    ///
    /// Nothing else runs meanwhile; call it before [`Self::run`].
    pub async fn calibrate<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<CalibrationOffset, SensorError> {
        motion::calibrate(&mut self.mpu, delay, &self.config.calibration).await
    }

    /// Capture the gyro bias and enable orientation ticks.
    ///
    /// Does nothing when the orientation period is configured off.
    pub async fn init_orientation(&mut self) -> Result<(), SensorError> {
        if self.config.orientation_period_ms.is_none() {
            info!("Orientation tracking disabled");
            return Ok(());
        }
        self.orientation = Some(OrientationIntegrator::new(&mut self.mpu).await?);
        Ok(())
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn orientation(&self) -> Option<OrientationState> {
        self.orientation.as_ref().map(OrientationIntegrator::state)
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn mpu_mut(&mut self) -> &mut Mpu6050<I> {
        &mut self.mpu
    }

    /// Ask the status source whether the alarm should be armed.
    ///
    /// On failure the armed flag and the indicator keep their last value.
    pub async fn poll_status(&mut self) -> Result<bool, MonitorError> {
        self.stats.status_polls = self.stats.status_polls.saturating_add(1);
        let status = self.status.poll().await?;
        let armed = status.as_str() == self.config.armed_sentinel.as_str();

        if armed != self.armed {
            info!(
                "Alarm {} (status {:?})",
                if armed { "armed" } else { "disarmed" },
                status.as_str()
            );
        }
        self.armed = armed;
        self.indicator.set(if armed {
            IndicatorColor::Armed
        } else {
            IndicatorColor::Off
        });

        Ok(armed)
    }

    /// When armed, read acceleration and raise an alert if any axis is over
    /// its limit.
    ///
    /// Every poll decides on its own: a device that keeps moving alerts on
    /// every poll, and the indicator stays on the alert colour until the next
    /// status poll repaints it.
    pub async fn poll_motion(&mut self) -> Result<MotionOutcome, MonitorError> {
        self.stats.motion_polls = self.stats.motion_polls.saturating_add(1);
        if !self.armed {
            return Ok(MotionOutcome::Disarmed);
        }

        let sample = self.mpu.read_acceleration().await?;
        debug!(
            "Acceleration: x={:.4} y={:.4} z={:.4}",
            sample.x, sample.y, sample.z
        );

        if !self.config.threshold.exceeded_by(&sample) {
            return Ok(MotionOutcome::Still(sample));
        }

        info!(
            "Motion detected: x={:.4} y={:.4} z={:.4}",
            sample.x, sample.y, sample.z
        );
        self.indicator.set(IndicatorColor::Alert);
        self.alerts.send(AlertPayload::from(sample)).await?;
        self.stats.alerts_sent = self.stats.alerts_sent.saturating_add(1);

        Ok(MotionOutcome::Alerted(sample))
    }

    /// Integrate one gyro sample. `None` when orientation tracking is off.
    pub async fn tick_orientation(&mut self) -> Result<Option<OrientationState>, MonitorError> {
        let Some(integrator) = self.orientation.as_mut() else {
            return Ok(None);
        };
        let state = integrator.tick(&mut self.mpu).await?;
        self.stats.orientation_ticks = self.stats.orientation_ticks.saturating_add(1);
        Ok(Some(state))
    }

    /// Poll status once, then serve the three periodic tasks forever.
    pub async fn run(&mut self) -> ! {
        let timeout = self.config.collaborator_timeout();

        // no unarmed window of a full status period after boot
        self.status_tick(timeout).await;

        let mut status = Cadence::starting_now(self.config.status_period());
        let mut motion = Cadence::starting_now(self.config.motion_period());
        let mut orientation = match (&self.orientation, self.config.orientation_period()) {
            (Some(_), Some(period)) => Some(Cadence::starting_now(period)),
            _ => None,
        };

        info!(
            "Monitor running: status every {} ms, motion every {} ms, orientation {:?} ms",
            self.config.status_period_ms,
            self.config.motion_period_ms,
            self.config.orientation_period_ms
        );

        loop {
            let due = select3(
                status.due(),
                motion.due(),
                next_orientation_tick(&orientation),
            )
            .await;

            match due {
                Either3::First(()) => {
                    self.status_tick(timeout).await;
                    status.advance();
                }
                Either3::Second(()) => {
                    self.motion_tick(timeout).await;
                    motion.advance();
                }
                Either3::Third(()) => {
                    self.orientation_tick().await;
                    if let Some(orientation) = orientation.as_mut() {
                        orientation.advance();
                    }
                }
            }
        }
    }

    async fn status_tick(&mut self, timeout: Duration) {
        let result = with_timeout(timeout, self.poll_status()).await;
        match result {
            Ok(Ok(_)) => debug!("{:?}", self.stats),
            Ok(Err(e)) => self.tick_failed("status", e),
            Err(_) => self.tick_failed(
                "status",
                CollaboratorError::Timeout {
                    collaborator: "status source",
                }
                .into(),
            ),
        }
    }

    async fn motion_tick(&mut self, timeout: Duration) {
        let result = with_timeout(timeout, self.poll_motion()).await;
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => self.tick_failed("motion", e),
            Err(_) => self.tick_failed(
                "motion",
                CollaboratorError::Timeout {
                    collaborator: "motion poll",
                }
                .into(),
            ),
        }
    }

    async fn orientation_tick(&mut self) {
        let result = self.tick_orientation().await;
        if let Err(e) = result {
            self.tick_failed("orientation", e);
        }
    }

    fn tick_failed(&mut self, task: &'static str, error: MonitorError) {
        self.stats.failed_ticks = self.stats.failed_ticks.saturating_add(1);
        self.stats.last_failure = Some(error);
        warn!("{} tick lost: {}", task, error);
    }
}

/// Fixed-rate deadline for one periodic task
///
/// The next deadline is taken once the task's work has finished. A task that
/// missed several deadlines fires once, right away, and a task whose work
/// overran its own period waits a full period before running again.
struct Cadence {
    period: Duration,
    next: Instant,
}

impl Cadence {
    fn starting_now(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    fn due(&self) -> Timer {
        Timer::at(self.next)
    }

    fn advance(&mut self) {
        let now = Instant::now();
        self.next = self.next + self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
    }
}

async fn next_orientation_tick(cadence: &Option<Cadence>) {
    match cadence {
        Some(cadence) => cadence.due().await,
        None => core::future::pending().await,
    }
}
