//! Hardware-independent core library for tremor
//!
//! This crate contains all platform-agnostic logic for the tremor motion
//! alarm: MPU-6050 register decoding and driver, acceleration calibration,
//! gyro integration, the collaborator traits (status source, alert sink,
//! indicator), and the cooperative scheduler tying them together.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod collaborators;
pub mod config;
pub mod http;
pub mod motion;
pub mod scheduler;
pub mod sensors;

#[cfg(test)]
pub(crate) mod testing;
