//! ESP32 firmware-specific modules for tremor
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: peripheral bring-up, the NeoPixel driver, WiFi and the socket
//! implementations of the tremor-core collaborators.

#![no_std]

extern crate alloc;

pub mod hardware;
pub mod http_client;
pub mod network;
pub mod wifi_secrets;
