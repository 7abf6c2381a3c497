//! Interfaces to the world outside the sensor
//!
//! The scheduler only talks to the network and the status LED through these
//! traits. The firmware implements them over embassy-net sockets and a
//! NeoPixel; tests and the simulator plug in recording fakes.

use thiserror_no_std::Error;

use crate::sensors::PhysicalSample;

/// Maximum length of a remote status string
pub const STATUS_CAPACITY: usize = 32;

/// Raw status string returned by the remote status source
pub type StatusValue = heapless::String<STATUS_CAPACITY>;

/// Colour shown on the status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    /// Disarmed
    Off,
    /// Armed, waiting for motion
    Armed,
    /// Motion detected while armed
    Alert,
}

impl IndicatorColor {
    /// RGB triple for a single addressable LED
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Off => (0, 0, 0),
            Self::Armed => (0, 255, 0),
            Self::Alert => (255, 0, 0),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Armed => "armed",
            Self::Alert => "alert",
        }
    }
}

/// The acceleration triple that tripped the alarm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPayload {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<PhysicalSample> for AlertPayload {
    fn from(sample: PhysicalSample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
            z: sample.z,
        }
    }
}

/// Error types for remote collaborators
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The remote end could not be reached or answered with garbage
    #[error("{collaborator} unavailable: {details}")]
    Unavailable {
        collaborator: &'static str,
        details: &'static str,
    },

    /// No answer within the configured collaborator timeout
    #[error("{collaborator} timed out")]
    Timeout { collaborator: &'static str },
}

/// Remote arm/disarm switch
pub trait StatusSource {
    /// Fetch the latest status value.
    fn poll(&mut self) -> impl Future<Output = Result<StatusValue, CollaboratorError>>;
}

/// Fire-and-forget motion alert
pub trait AlertSink {
    /// Deliver an alert. Any response body is ignored.
    fn send(&mut self, payload: AlertPayload) -> impl Future<Output = Result<(), CollaboratorError>>;
}

/// Single-colour status light
pub trait IndicatorOutput {
    fn set(&mut self, color: IndicatorColor);
}
