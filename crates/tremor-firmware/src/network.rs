//! WiFi station bring-up and the embassy-net stack
//!
//! ```text
//! 1. Initialize the radio (esp-radio) and the WiFi controller
//! 2. Create the embassy-net stack on the station interface (DHCP)
//! 3. Spawn the connection task (joins, rejoins after a drop) and the net task
//! 4. Wait for link and DHCP lease
//! ```

use alloc::string::String;

use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Runner, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState,
};
use log::{info, warn};
use static_cell::StaticCell;
use thiserror_no_std::Error;

/// Pause before retrying a failed join
const REJOIN_DELAY: Duration = Duration::from_secs(5);

/// Sockets in use at once: one TCP exchange plus DHCP and DNS
const STACK_SOCKETS: usize = 3;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Radio initialization failed")]
    Radio,
    #[error("WiFi controller initialization failed")]
    Controller,
    #[error("Network task could not be spawned")]
    Spawn,
}

/// Credentials for the station interface
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

/// Bring WiFi up and return the network stack once it has an address.
pub async fn start_wifi(
    spawner: Spawner,
    wifi: esp_hal::peripherals::WIFI<'static>,
    credentials: WifiCredentials,
    seed: u64,
) -> Result<Stack<'static>, NetworkError> {
    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    let radio = RADIO.init(esp_radio::init().map_err(|_| NetworkError::Radio)?);

    let (controller, interfaces) = esp_radio::wifi::new(radio, wifi, Default::default())
        .map_err(|_| NetworkError::Controller)?;

    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );

    info!("Connecting to {}", credentials.ssid);
    spawner.spawn(connection_task(controller, credentials).map_err(|_| NetworkError::Spawn)?);
    spawner.spawn(net_task(runner).map_err(|_| NetworkError::Spawn)?);

    stack.wait_link_up().await;
    info!("Link is up, waiting for DHCP");
    stack.wait_config_up().await;

    if let Some(config) = stack.config_v4() {
        info!("IP address: {}", config.address.address());
    }

    Ok(stack)
}

/// Keep the station joined, rejoining after every disconnect.
#[embassy_executor::task]
async fn connection_task(mut controller: WifiController<'static>, credentials: WifiCredentials) {
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("WiFi disconnected");
            Timer::after(REJOIN_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let mode = ModeConfig::Client(
                ClientConfig::default()
                    .with_ssid(credentials.ssid.clone())
                    .with_password(credentials.password.clone()),
            );
            if let Err(e) = controller.set_config(&mode) {
                warn!("WiFi configuration rejected: {:?}", e);
                Timer::after(REJOIN_DELAY).await;
                continue;
            }
            if let Err(e) = controller.start_async().await {
                warn!("WiFi start failed: {:?}", e);
                Timer::after(REJOIN_DELAY).await;
                continue;
            }
        }

        match controller.connect_async().await {
            Ok(()) => info!("WiFi connected"),
            Err(e) => {
                warn!("WiFi join failed: {:?}", e);
                Timer::after(REJOIN_DELAY).await;
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
