//! ESP-NOW transport on top of esp-radio.

use aeris_core::{NodeConfig, PeerAddress, RadioError, RadioTransport, SendStatus, WIRE_SIZE};
use esp_hal::peripherals::WIFI;
use esp_radio::Controller;
use esp_radio::esp_now::{EspNow, EspNowWifiInterface, PeerInfo};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController};
use log::{error, warn};
use static_cell::StaticCell;

static RADIO: StaticCell<Controller<'static>> = StaticCell::new();

/// Send-only ESP-NOW link to the fixed receiver.
///
/// The Wi-Fi stack runs in station mode without joining a network; ESP-NOW
/// frames go out on the configured channel.
pub struct EspNowRadio {
    wifi: Option<WIFI<'static>>,
    // Dropping the controller stops Wi-Fi, so it lives as long as the transport.
    _controller: Option<WifiController<'static>>,
    esp_now: Option<EspNow<'static>>,
    local: Option<PeerAddress>,
}

impl EspNowRadio {
    pub fn new(wifi: WIFI<'static>) -> Self {
        Self {
            wifi: Some(wifi),
            _controller: None,
            esp_now: None,
            local: None,
        }
    }
}

impl RadioTransport for EspNowRadio {
    async fn init(&mut self, channel: u8) -> Result<(), RadioError> {
        if !NodeConfig::is_valid_channel(channel) {
            return Err(RadioError::InvalidChannel(channel));
        }

        let wifi = self.wifi.take().ok_or(RadioError::InitFailed {
            stage: "wifi",
            details: "radio already initialized this wake",
        })?;

        let radio = esp_radio::init().map_err(|e| {
            error!("esp-radio init failed: {:?}", e);
            RadioError::InitFailed {
                stage: "esp-radio",
                details: "radio controller unavailable",
            }
        })?;
        let radio = RADIO.init(radio);

        let (mut controller, interfaces) =
            esp_radio::wifi::new(radio, wifi, esp_radio::wifi::Config::default()).map_err(|e| {
                error!("Wi-Fi peripheral init failed: {:?}", e);
                RadioError::InitFailed {
                    stage: "wifi",
                    details: "peripheral init failed",
                }
            })?;

        controller
            .set_config(&ModeConfig::Client(ClientConfig::default()))
            .map_err(|e| {
                error!("Wi-Fi station mode failed: {:?}", e);
                RadioError::InitFailed {
                    stage: "wifi",
                    details: "could not enter station mode",
                }
            })?;
        controller.start_async().await.map_err(|e| {
            error!("Wi-Fi start failed: {:?}", e);
            RadioError::InitFailed {
                stage: "wifi",
                details: "could not start",
            }
        })?;

        let local = PeerAddress::new(interfaces.sta.mac_address());
        let mut esp_now = interfaces.esp_now;
        esp_now.set_channel(channel).map_err(|e| {
            error!("ESP-NOW channel {} rejected: {:?}", channel, e);
            RadioError::InitFailed {
                stage: "esp-now",
                details: "channel rejected",
            }
        })?;

        self.local = Some(local);
        self._controller = Some(controller);
        self.esp_now = Some(esp_now);

        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerAddress, channel: u8) -> Result<(), RadioError> {
        let esp_now = self.esp_now.as_mut().ok_or(RadioError::NotInitialized)?;

        esp_now
            .add_peer(PeerInfo {
                interface: EspNowWifiInterface::Sta,
                peer_address: *peer.as_bytes(),
                lmk: None,
                channel: Some(channel),
                encrypt: false,
            })
            .map_err(|e| {
                error!("ESP-NOW add_peer {} failed: {:?}", peer, e);
                RadioError::PeerRejected {
                    details: "driver refused peer",
                }
            })
    }

    fn send<'a>(
        &'a mut self,
        peer: &'a PeerAddress,
        payload: &'a [u8; WIRE_SIZE],
    ) -> impl Future<Output = SendStatus> + 'a {
        async move {
            let Some(esp_now) = self.esp_now.as_mut() else {
                error!("ESP-NOW send before init");
                return SendStatus::Failed;
            };

            match esp_now.send_async(peer.as_bytes(), payload).await {
                Ok(()) => SendStatus::Delivered,
                Err(e) => {
                    warn!("ESP-NOW send to {} failed: {:?}", peer, e);
                    SendStatus::Failed
                }
            }
        }
    }

    fn local_address(&self) -> Option<PeerAddress> {
        self.local
    }
}
