//! Compile-time node configuration.

use embassy_time::Duration;

use crate::radio::PeerAddress;

/// Receiver this node reports to unless the firmware build overrides it.
pub const DEFAULT_PEER: PeerAddress = PeerAddress::new([0x24, 0x6F, 0x28, 0xAB, 0xBC, 0x49]);

/// Wi-Fi channel shared with the receiver.
pub const DEFAULT_CHANNEL: u8 = 4;

/// Base deep sleep between wake cycles (15 minutes).
pub const BASE_SLEEP: Duration = Duration::from_secs(15 * 60);

/// Longest time after wake that the node waits for send completion.
pub const SEND_TIMEOUT: Duration = Duration::from_millis(245);

/// Upper bound of the random sleep offset, in whole seconds.
pub const MAX_JITTER_SECS: u32 = 127;

/// Raw ADC counts per volt of the battery divider.
pub const BATTERY_ADC_DIVISOR: f32 = 216.0;

/// Highest channel number ESP-NOW accepts.
pub const MAX_CHANNEL: u8 = 14;

/// Everything a wake cycle needs to know about its deployment.
///
/// Values are fixed when the firmware is built; nothing here is tunable at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeConfig {
    pub peer: PeerAddress,
    pub channel: u8,
    pub base_sleep: Duration,
    pub send_timeout: Duration,
    pub max_jitter_secs: u32,
    pub battery_divisor: f32,
    /// When disabled the humidity field is transmitted as `0.0`.
    pub report_humidity: bool,
}

impl NodeConfig {
    pub const DEFAULT: Self = Self {
        peer: DEFAULT_PEER,
        channel: DEFAULT_CHANNEL,
        base_sleep: BASE_SLEEP,
        send_timeout: SEND_TIMEOUT,
        max_jitter_secs: MAX_JITTER_SECS,
        battery_divisor: BATTERY_ADC_DIVISOR,
        report_humidity: true,
    };

    /// Whether `channel` is a usable ESP-NOW channel.
    pub const fn is_valid_channel(channel: u8) -> bool {
        channel >= 1 && channel <= MAX_CHANNEL
    }

    /// Longest a node may stay asleep between two wakes.
    pub const fn max_sleep(&self) -> Duration {
        Duration::from_secs(self.base_sleep.as_secs() + self.max_jitter_secs as u64)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = NodeConfig::default();

        assert_eq!(config.base_sleep.as_secs(), 900);
        assert_eq!(config.send_timeout.as_millis(), 245);
        assert_eq!(config.channel, 4);
        assert!(NodeConfig::is_valid_channel(config.channel));
    }

    #[test]
    fn test_channel_bounds() {
        assert!(!NodeConfig::is_valid_channel(0));
        assert!(NodeConfig::is_valid_channel(1));
        assert!(NodeConfig::is_valid_channel(14));
        assert!(!NodeConfig::is_valid_channel(15));
    }

    #[test]
    fn test_max_sleep() {
        assert_eq!(NodeConfig::DEFAULT.max_sleep().as_secs(), 900 + 127);
    }
}
