//! Credentials baked in at build time by `build.rs`

use log::error;
use tremor_core::config::{AlertEndpoint, Config, InternetConfig, StatusEndpoint};

const WIFI_SSID: &str = env!("TREMOR_WIFI_SSID");
const WIFI_PASSWORD: &str = env!("TREMOR_WIFI_PASSWORD");
const STATUS_CHANNEL: &str = env!("TREMOR_STATUS_CHANNEL");
const STATUS_KEY: &str = env!("TREMOR_STATUS_KEY");
const ALERT_EVENT: &str = env!("TREMOR_ALERT_EVENT");
const ALERT_KEY: &str = env!("TREMOR_ALERT_KEY");

/// Build the network configuration from the baked-in values.
///
/// `None` when the status channel id is not a number.
pub fn config() -> Option<Config<'static>> {
    let channel_id = match STATUS_CHANNEL.parse::<u32>() {
        Ok(id) => id,
        Err(_) => {
            error!("TREMOR_STATUS_CHANNEL {:?} is not a number", STATUS_CHANNEL);
            return None;
        }
    };

    Some(Config {
        internet: InternetConfig {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
        },
        status: StatusEndpoint {
            channel_id,
            api_key: STATUS_KEY,
            ..StatusEndpoint::default()
        },
        alert: AlertEndpoint {
            event: ALERT_EVENT,
            key: ALERT_KEY,
            ..AlertEndpoint::default()
        },
    })
}
