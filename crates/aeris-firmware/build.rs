//! Links the esp-hal runtime and bakes the deployment settings into the
//! binary.
//!
//! Settings come from the environment or a `.env` file next to this crate:
//!
//! | Variable                | Example             | Default             |
//! |-------------------------|---------------------|---------------------|
//! | `AERIS_PEER_MAC`        | `24:6F:28:AB:BC:49` | core `DEFAULT_PEER` |
//! | `AERIS_CHANNEL`         | `4`                 | core `DEFAULT_CHANNEL` |
//! | `AERIS_REPORT_HUMIDITY` | `false`             | `true`              |

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use aeris_core::{NodeConfig, PeerAddress};

const PEER_VAR: &str = "AERIS_PEER_MAC";
const CHANNEL_VAR: &str = "AERIS_CHANNEL";
const HUMIDITY_VAR: &str = "AERIS_REPORT_HUMIDITY";

fn main() {
    println!("cargo:rustc-link-arg=-Tlinkall.x");

    // A missing .env is fine, everything has a default.
    let _ = dotenvy::dotenv();
    println!("cargo:rerun-if-changed=.env");
    for var in [PEER_VAR, CHANNEL_VAR, HUMIDITY_VAR] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    let mut generated = String::new();

    match env::var(PEER_VAR) {
        Ok(mac) => {
            let peer: PeerAddress = mac
                .parse()
                .unwrap_or_else(|e| panic!("{PEER_VAR}={mac:?} is not a MAC address: {e}"));
            let octets: Vec<String> = peer.as_bytes().iter().map(|b| format!("0x{b:02X}")).collect();
            let _ = writeln!(
                generated,
                "pub const PEER_ADDRESS: PeerAddress = PeerAddress::new([{}]);",
                octets.join(", ")
            );
        }
        Err(_) => generated
            .push_str("pub const PEER_ADDRESS: PeerAddress = aeris_core::config::DEFAULT_PEER;\n"),
    }

    match env::var(CHANNEL_VAR) {
        Ok(raw) => {
            let channel: u8 = raw
                .trim()
                .parse()
                .unwrap_or_else(|e| panic!("{CHANNEL_VAR}={raw:?} is not a number: {e}"));
            assert!(
                NodeConfig::is_valid_channel(channel),
                "{CHANNEL_VAR}={channel} is outside the ESP-NOW channel range 1-14"
            );
            let _ = writeln!(generated, "pub const CHANNEL: u8 = {channel};");
        }
        Err(_) => generated.push_str("pub const CHANNEL: u8 = aeris_core::config::DEFAULT_CHANNEL;\n"),
    }

    let report_humidity = match env::var(HUMIDITY_VAR) {
        Ok(raw) => parse_flag(&raw)
            .unwrap_or_else(|| panic!("{HUMIDITY_VAR}={raw:?} must be true or false")),
        Err(_) => true,
    };
    let _ = writeln!(generated, "pub const REPORT_HUMIDITY: bool = {report_humidity};");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("node_config.rs"), generated).expect("failed to write node_config.rs");
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
