//! Deployment settings baked in by the build script.

use aeris_core::{NodeConfig, PeerAddress};

include!(concat!(env!("OUT_DIR"), "/node_config.rs"));

pub const NODE_CONFIG: NodeConfig = NodeConfig {
    peer: PEER_ADDRESS,
    channel: CHANNEL,
    report_humidity: REPORT_HUMIDITY,
    ..NodeConfig::DEFAULT
};
