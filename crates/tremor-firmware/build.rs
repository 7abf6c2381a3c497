//! Bakes network credentials from `.env` (or the build environment) into the
//! firmware as `env!` constants.

/// Variables forwarded to rustc, with the value used when unset
const FORWARDED: &[(&str, &str)] = &[
    ("TREMOR_WIFI_SSID", ""),
    ("TREMOR_WIFI_PASSWORD", ""),
    ("TREMOR_STATUS_CHANNEL", "0"),
    ("TREMOR_STATUS_KEY", ""),
    ("TREMOR_ALERT_EVENT", "motion_detect"),
    ("TREMOR_ALERT_KEY", ""),
];

fn main() {
    println!("cargo:rerun-if-changed=.env");

    // A missing .env is fine, the variables may come from the shell
    let _ = dotenvy::dotenv();

    for (name, fallback) in FORWARDED {
        println!("cargo:rerun-if-env-changed={name}");
        let value = match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                println!("cargo:warning={name} is not set, using {fallback:?}");
                (*fallback).to_string()
            }
        };
        println!("cargo:rustc-env={name}={value}");
    }
}
