//! Peripheral bring-up for the Feather-style ESP32 board
//!
//! | Function          | Pin    |
//! |-------------------|--------|
//! | I2C SCL           | GPIO14 |
//! | I2C SDA           | GPIO22 |
//! | NeoPixel power    | GPIO2  |
//! | NeoPixel data     | GPIO0  |

use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, I2c};
use esp_hal::rmt::{Channel, PulseCode, Rmt, Tx, TxChannelConfig, TxChannelCreator};
use esp_hal::time::Rate;
use esp_hal::{Async, Blocking};
use log::{info, warn};
use thiserror_no_std::Error;
use tremor_core::collaborators::{IndicatorColor, IndicatorOutput};

/// RMT source clock; one tick is 12.5 ns
const RMT_CLOCK_MHZ: u32 = 80;

// WS2812 bit timings in RMT ticks
const T0H: u16 = 32; // 0.40 µs
const T0L: u16 = 68; // 0.85 µs
const T1H: u16 = 64; // 0.80 µs
const T1L: u16 = 36; // 0.45 µs

/// 24 colour bits plus the end marker
const FRAME_LEN: usize = 25;

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("I2C configuration rejected")]
    I2c,
    #[error("RMT peripheral unavailable")]
    Rmt,
}

/// Create the sensor I2C bus at 400 kHz.
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO22<'static>,
    scl: esp_hal::peripherals::GPIO14<'static>,
) -> Result<I2c<'static, Async>, HardwareError> {
    let bus = I2c::new(i2c0, I2cConfig::default().with_frequency(Rate::from_khz(400)))
        .map_err(|_| HardwareError::I2c)?
        .with_sda(sda)
        .with_scl(scl)
        .into_async();
    Ok(bus)
}

/// Single on-board WS2812 driven through an RMT channel.
pub struct NeoPixel {
    // keeps the LED powered for as long as the driver lives
    _power: Output<'static>,
    channel: Option<Channel<'static, Blocking, Tx>>,
}

impl NeoPixel {
    /// Power the LED and attach its data line to RMT channel 0.
    pub fn new(
        rmt: esp_hal::peripherals::RMT<'static>,
        data: esp_hal::peripherals::GPIO0<'static>,
        power: esp_hal::peripherals::GPIO2<'static>,
    ) -> Result<Self, HardwareError> {
        let power = Output::new(power, Level::High, OutputConfig::default());

        let rmt = Rmt::new(rmt, Rate::from_mhz(RMT_CLOCK_MHZ)).map_err(|_| HardwareError::Rmt)?;
        let channel = rmt
            .channel0
            .configure_tx(
                data,
                TxChannelConfig::default()
                    .with_clk_divider(1)
                    .with_idle_output_level(Level::Low)
                    .with_idle_output(true),
            )
            .map_err(|_| HardwareError::Rmt)?;

        info!("NeoPixel ready");
        Ok(Self {
            _power: power,
            channel: Some(channel),
        })
    }

    fn write(&mut self, (r, g, b): (u8, u8, u8)) {
        let Some(channel) = self.channel.take() else {
            return;
        };

        let frame = encode_grb(r, g, b);
        let channel = match channel.transmit(&frame) {
            Ok(transaction) => match transaction.wait() {
                Ok(channel) => channel,
                Err((e, channel)) => {
                    warn!("NeoPixel transfer failed: {:?}", e);
                    channel
                }
            },
            Err((e, channel)) => {
                warn!("NeoPixel transfer rejected: {:?}", e);
                channel
            }
        };
        self.channel = Some(channel);
    }
}

impl IndicatorOutput for NeoPixel {
    fn set(&mut self, color: IndicatorColor) {
        self.write(color.rgb());
    }
}

/// One WS2812 frame, green first, most significant bit first.
fn encode_grb(r: u8, g: u8, b: u8) -> [PulseCode; FRAME_LEN] {
    let one = PulseCode::new(Level::High, T1H, Level::Low, T1L);
    let zero = PulseCode::new(Level::High, T0H, Level::Low, T0L);

    let mut frame = [PulseCode::end_marker(); FRAME_LEN];
    let bits = u32::from(g) << 16 | u32::from(r) << 8 | u32::from(b);
    for (i, pulse) in frame.iter_mut().take(24).enumerate() {
        *pulse = if bits & (1 << (23 - i)) != 0 { one } else { zero };
    }
    frame
}
