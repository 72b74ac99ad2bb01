//! Radio transport capability and send acknowledgment.
//!
//! The transport reports completion of a send asynchronously. The only state
//! shared between that completion path and the wake cycle is the [`AckSignal`],
//! a single-slot signal written once per send and read by the controller.

use core::fmt;
use core::future::Future;
use core::str::FromStr;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use thiserror_no_std::Error;

use crate::reading::WIRE_SIZE;

/// Hardware (MAC) address of an ESP-NOW peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl From<[u8; 6]> for PeerAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Address has fewer than six octets")]
    TooFewOctets,
    #[error("Address has more than six octets")]
    TooManyOctets,
    #[error("Octet {index} is not a hex byte")]
    InvalidOctet { index: usize },
}

/// Parses six hex octets separated by `:` or `-`, e.g. `24:6F:28:AB:BC:49`.
impl FromStr for PeerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split([':', '-']);

        for (index, byte) in bytes.iter_mut().enumerate() {
            let part = parts.next().ok_or(AddressParseError::TooFewOctets)?;
            // from_str_radix alone would accept a sign prefix
            if !(1..=2).contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(AddressParseError::InvalidOctet { index });
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| AddressParseError::InvalidOctet { index })?;
        }
        if parts.next().is_some() {
            return Err(AddressParseError::TooManyOctets);
        }

        Ok(Self(bytes))
    }
}

/// Completion status reported by the transport for one send.
///
/// This is a link-level status, not a confirmation from the receiver
/// application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Delivered,
    Failed,
}

/// Single-slot acknowledgment shared between the send completion path and
/// the cycle controller.
pub type AckSignal = Signal<CriticalSectionRawMutex, SendStatus>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    #[error("Radio initialization failed at {stage}: {details}")]
    InitFailed {
        stage: &'static str,
        details: &'static str,
    },
    #[error("Channel {0} is not a valid ESP-NOW channel")]
    InvalidChannel(u8),
    #[error("Failed to register peer: {details}")]
    PeerRejected { details: &'static str },
    #[error("Radio used before initialization")]
    NotInitialized,
}

/// Wireless transport used by the wake cycle.
///
/// Implementations talk to a single fixed peer; there is no peer list
/// management and no receive path.
pub trait RadioTransport {
    /// Bring up the wireless stack on `channel`.
    fn init(&mut self, channel: u8) -> impl Future<Output = Result<(), RadioError>>;

    /// Register the fixed destination.
    fn add_peer(&mut self, peer: &PeerAddress, channel: u8) -> Result<(), RadioError>;

    /// Transmit `payload` to `peer`.
    ///
    /// The returned future issues the transmission when first polled and
    /// resolves once the radio reports completion. It may never resolve if
    /// the radio never reports back; callers bound the wait themselves.
    fn send<'a>(
        &'a mut self,
        peer: &'a PeerAddress,
        payload: &'a [u8; WIRE_SIZE],
    ) -> impl Future<Output = SendStatus> + 'a;

    /// Hardware address of this node once the radio is up.
    fn local_address(&self) -> Option<PeerAddress> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::format;

    #[test]
    fn test_peer_address_display() {
        let peer = PeerAddress::new([0x24, 0x6F, 0x28, 0xAB, 0xBC, 0x49]);
        assert_eq!(format!("{peer}"), "24:6f:28:ab:bc:49");
    }

    #[test]
    fn test_peer_address_parse() {
        let expected = PeerAddress::new([0x24, 0x6F, 0x28, 0xAB, 0xBC, 0x49]);

        assert_eq!("24:6F:28:AB:BC:49".parse::<PeerAddress>(), Ok(expected));
        assert_eq!("24-6f-28-ab-bc-49".parse::<PeerAddress>(), Ok(expected));
        assert_eq!(" 24:6f:28:ab:bc:49\n".parse::<PeerAddress>(), Ok(expected));
    }

    #[test]
    fn test_peer_address_parse_display_agree() {
        let peer = PeerAddress::new([0x02, 0xAE, 0x21, 0x00, 0x0F, 0xFF]);
        assert_eq!(format!("{peer}").parse::<PeerAddress>(), Ok(peer));
    }

    #[test]
    fn test_peer_address_wrong_octet_count() {
        assert_eq!(
            "24:6F:28:AB:BC".parse::<PeerAddress>(),
            Err(AddressParseError::TooFewOctets)
        );
        assert_eq!(
            "24:6F:28:AB:BC:49:00".parse::<PeerAddress>(),
            Err(AddressParseError::TooManyOctets)
        );
        assert_eq!("".parse::<PeerAddress>(), Err(AddressParseError::InvalidOctet { index: 0 }));
    }

    #[test]
    fn test_peer_address_bad_hex() {
        assert_eq!(
            "24:6F:2G:AB:BC:49".parse::<PeerAddress>(),
            Err(AddressParseError::InvalidOctet { index: 2 })
        );
        assert_eq!(
            "24:6F:28:ABC:BC:49".parse::<PeerAddress>(),
            Err(AddressParseError::InvalidOctet { index: 3 })
        );
        assert_eq!(
            "24:6F::AB:BC:49".parse::<PeerAddress>(),
            Err(AddressParseError::InvalidOctet { index: 2 })
        );
        assert_eq!(
            "24:6F:+8:AB:BC:49".parse::<PeerAddress>(),
            Err(AddressParseError::InvalidOctet { index: 2 })
        );
    }

    #[test]
    fn test_ack_signal_holds_single_status() {
        let ack = AckSignal::new();
        assert!(!ack.signaled());

        ack.signal(SendStatus::Failed);
        ack.signal(SendStatus::Delivered);

        assert_eq!(ack.try_take(), Some(SendStatus::Delivered));
        assert_eq!(ack.try_take(), None);
    }
}
