#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use alloc::string::ToString;

use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};

use tremor_core::collaborators::{IndicatorColor, IndicatorOutput};
use tremor_core::config::MonitorConfig;
use tremor_core::scheduler::MotionMonitor;
use tremor_core::sensors::{Mpu6050, scan};
use tremor_firmware::hardware::{NeoPixel, create_i2c_bus};
use tremor_firmware::http_client::{HttpClient, IftttAlert, ThingSpeakStatus};
use tremor_firmware::network::{WifiCredentials, start_wifi};
use tremor_firmware::wifi_secrets;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Log a fatal startup error and park forever.
async fn halt(reason: &str) -> ! {
    error!("Startup failed: {}", reason);
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 98768);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let Some(settings) = wifi_secrets::config() else {
        halt("invalid build-time configuration").await
    };
    let monitor_config = MonitorConfig::default();

    // 1. Network
    let rng = Rng::new();
    let seed = u64::from(rng.random()) << 32 | u64::from(rng.random());
    let credentials = WifiCredentials {
        ssid: settings.internet.ssid.to_string(),
        password: settings.internet.password.to_string(),
    };
    let stack = match start_wifi(spawner, peripherals.WIFI, credentials, seed).await {
        Ok(stack) => stack,
        Err(e) => {
            error!("{}", e);
            halt("network").await
        }
    };

    // 2. Status light, off until the first status poll
    let mut indicator = match NeoPixel::new(peripherals.RMT, peripherals.GPIO0, peripherals.GPIO2) {
        Ok(indicator) => indicator,
        Err(e) => {
            error!("{}", e);
            halt("indicator").await
        }
    };
    indicator.set(IndicatorColor::Off);

    // 3. Sensor bus and MPU-6050
    let mut i2c = match create_i2c_bus(peripherals.I2C0, peripherals.GPIO22, peripherals.GPIO14) {
        Ok(i2c) => i2c,
        Err(e) => {
            error!("{}", e);
            halt("i2c").await
        }
    };
    let found = scan(&mut i2c).await;
    info!("I2C devices: {:?}", found.as_slice());
    let Some(&address) = found.first() else {
        halt("no I2C device found").await
    };
    let mpu = match Mpu6050::new(i2c, address).await {
        Ok(mpu) => mpu,
        Err(e) => {
            error!("{}", e);
            halt("mpu6050").await
        }
    };

    // 4. Collaborators and monitor
    let client = HttpClient::new(stack, monitor_config.collaborator_timeout());
    let status = ThingSpeakStatus::new(client, settings.status);
    let alerts = IftttAlert::new(client, settings.alert);
    let mut monitor = MotionMonitor::new(mpu, status, alerts, indicator, monitor_config);

    match monitor.mpu_mut().read_who_am_i().await {
        Ok(id) => info!("WHO_AM_I: {:#04x}", id),
        Err(e) => warn!("WHO_AM_I read failed: {}", e),
    }
    match monitor.mpu_mut().read_temperature().await {
        Ok(fahrenheit) => info!("Die temperature: {:.1} °F", fahrenheit),
        Err(e) => warn!("Temperature read failed: {}", e),
    }

    // 5. Calibration blocks everything; the board must sit still
    info!("Calibrating, keep the board still");
    if let Err(e) = monitor.calibrate(&mut Delay).await {
        error!("{}", e);
        halt("calibration").await
    }
    if let Err(e) = monitor.init_orientation().await {
        error!("{}", e);
        halt("gyro bias").await
    }

    monitor.run().await
}
