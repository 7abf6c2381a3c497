//! Runtime configuration
//!
//! `MonitorConfig` carries the scheduler timing, the alarm threshold and the
//! calibration parameters. `Config` carries the network endpoints and is
//! borrowed from wherever the firmware keeps its secrets.

use core::str::FromStr;

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

use crate::collaborators::StatusValue;
use crate::motion::MotionThreshold;

/// Status value that arms the alarm
pub const DEFAULT_ARMED_SENTINEL: &str = "ACTIVATE";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Number of acceleration reads averaged into the offset
    pub samples: u32,
    /// Pause after every read
    pub inter_sample_delay_ms: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: 100,
            inter_sample_delay_ms: 25,
        }
    }
}

/// Timing and thresholds for [`crate::scheduler::MotionMonitor`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub status_period_ms: u64,
    pub motion_period_ms: u64,
    /// `None` turns the orientation tick off entirely
    pub orientation_period_ms: Option<u64>,
    /// Upper bound on one status or motion tick, network round trip included
    pub collaborator_timeout_ms: u64,
    pub threshold: MotionThreshold,
    pub armed_sentinel: StatusValue,
    pub calibration: CalibrationConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            status_period_ms: 30_000,
            motion_period_ms: 2_000,
            orientation_period_ms: Some(100),
            collaborator_timeout_ms: 10_000,
            threshold: MotionThreshold::default(),
            // fits: sentinel is shorter than the status capacity
            armed_sentinel: StatusValue::from_str(DEFAULT_ARMED_SENTINEL).unwrap_or_default(),
            calibration: CalibrationConfig::default(),
        }
    }
}

impl MonitorConfig {
    pub fn status_period(&self) -> Duration {
        Duration::from_millis(self.status_period_ms)
    }

    pub fn motion_period(&self) -> Duration {
        Duration::from_millis(self.motion_period_ms)
    }

    pub fn orientation_period(&self) -> Option<Duration> {
        self.orientation_period_ms.map(Duration::from_millis)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct Config<'a> {
    pub internet: InternetConfig<'a>,
    pub status: StatusEndpoint<'a>,
    pub alert: AlertEndpoint<'a>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct InternetConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
}

/// ThingSpeak channel holding the arm/disarm switch in `field1`
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct StatusEndpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub channel_id: u32,
    pub api_key: &'a str,
}

impl Default for StatusEndpoint<'_> {
    fn default() -> Self {
        Self {
            host: "api.thingspeak.com",
            port: 80,
            channel_id: 0,
            api_key: "",
        }
    }
}

/// IFTTT webhook fired on motion
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct AlertEndpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub event: &'a str,
    pub key: &'a str,
}

impl Default for AlertEndpoint<'_> {
    fn default() -> Self {
        Self {
            host: "maker.ifttt.com",
            port: 80,
            event: "motion_detect",
            key: "",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = MonitorConfig::default();
        assert_eq!(config.status_period(), Duration::from_secs(30));
        assert_eq!(config.motion_period(), Duration::from_secs(2));
        assert_eq!(config.orientation_period(), Some(Duration::from_millis(100)));
        assert_eq!(config.threshold, MotionThreshold::uniform(0.45));
        assert_eq!(config.armed_sentinel.as_str(), "ACTIVATE");
        assert_eq!(config.calibration.samples, 100);
        assert_eq!(config.calibration.inter_sample_delay_ms, 25);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = serde_json::from_str::<MonitorConfig>(
            r#"{"motion_period_ms":500,"orientation_period_ms":null,"armed_sentinel":"ON"}"#,
        )
        .unwrap();

        assert_eq!(config.motion_period_ms, 500);
        assert_eq!(config.orientation_period(), None);
        assert_eq!(config.armed_sentinel.as_str(), "ON");
        assert_eq!(config.status_period_ms, 30_000);
        assert_eq!(config.calibration, CalibrationConfig::default());
    }

    #[test]
    fn test_endpoint_config_borrows_from_input() {
        let json = r#"{
            "internet": {"ssid": "lab", "password": "hunter2"},
            "status": {"host": "api.thingspeak.com", "port": 80, "channel_id": 3203294, "api_key": "KEY"},
            "alert": {"host": "maker.ifttt.com", "port": 80, "event": "motion_detect", "key": "SECRET"}
        }"#;
        let config = serde_json::from_str::<Config<'_>>(json).unwrap();

        assert_eq!(config.internet.ssid, "lab");
        assert_eq!(config.status.channel_id, 3203294);
        assert_eq!(config.alert.key, "SECRET");
    }
}
