//! Desktop simulator for the aeris sensor node.
//!
//! Runs consecutive wake cycles of `aeris-core` against simulated hardware:
//! a BME280 with slowly drifting weather, a discharging battery and an
//! ESP-NOW link that sometimes fails to come up, drops frames or never
//! reports completion. Every frame that reaches the simulated receiver is
//! decoded with the receiver's fixed layout.
//!
//! Deep sleep is time-compressed: the chosen sleep length only advances the
//! simulated weather clock. The send timeout runs in real time.
//!
//! # Usage
//!
//! ```text
//! aeris-simulator [CYCLES] [SEED]
//! ```
//!
//! Set `RUST_LOG=debug` to see the phase transitions of each cycle.

use std::cell::RefCell;
use std::future::pending;
use std::rc::Rc;

use embassy_futures::block_on;
use embassy_time::{Duration, Timer};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use aeris_core::config::BATTERY_ADC_DIVISOR;
use aeris_core::{
    AckSignal, BatteryMonitor, CycleController, CycleOutcome, Environment, EnvironmentSensor,
    NodeConfig, PeerAddress, RadioError, RadioTransport, Reading, SendStatus, SensorError,
    WIRE_SIZE,
};

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

const DEFAULT_CYCLES: u32 = 12;
const DEFAULT_SEED: u64 = 0xAE21_5EED;

/// Probability that the sensor does not answer during a wake.
const SENSOR_FAILURE_RATE: f64 = 0.05;

/// Probability that the wireless stack fails to start.
const RADIO_INIT_FAILURE_RATE: f64 = 0.05;

/// Probability that a frame is reported as failed by the link layer.
const SEND_FAILURE_RATE: f64 = 0.08;

/// Probability that the send completion never arrives.
const SILENT_SEND_RATE: f64 = 0.05;

/// Link-layer completion latency range in milliseconds.
const SEND_LATENCY_MS: core::ops::RangeInclusive<u64> = 2..=60;

/// Battery voltage lost per hour of operation.
const BATTERY_DRAIN_V_PER_HOUR: f64 = 0.002;

// ---------------------------------------------------------------------------
// Simulated hardware
// ---------------------------------------------------------------------------

/// Weather clock shared by the simulated sensor and battery.
type SimClock = Rc<RefCell<f64>>;

struct SimulatedBme280 {
    clock: SimClock,
    rng: ChaCha8Rng,
}

impl EnvironmentSensor for SimulatedBme280 {
    async fn measure(&mut self) -> Result<Environment, SensorError> {
        if self.rng.gen_bool(SENSOR_FAILURE_RATE) {
            return Err(SensorError::InitializationFailed {
                sensor: "BME280",
                details: "simulated bus timeout",
            });
        }

        let t = *self.clock.borrow();

        // Daily temperature swing around 12 °C, slower pressure systems.
        let temperature = 12.0 + 6.0 * (t / 86_400.0 * core::f64::consts::TAU).sin();
        let humidity = 70.0 - 15.0 * (t / 86_400.0 * core::f64::consts::TAU).sin();
        let pressure = 101_325.0 + 900.0 * (t / 302_400.0).sin();
        let noise = self.rng.gen_range(-0.05..0.05);

        Ok(Environment {
            temperature_celsius: (temperature + noise) as f32,
            humidity_percent: humidity as f32,
            pressure_pascal: pressure as f32,
        })
    }
}

struct SimulatedBattery {
    clock: SimClock,
    full_voltage: f64,
}

impl BatteryMonitor for SimulatedBattery {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let hours = *self.clock.borrow() / 3_600.0;
        let voltage = (self.full_voltage - hours * BATTERY_DRAIN_V_PER_HOUR).max(0.0);
        Ok((voltage * BATTERY_ADC_DIVISOR as f64).round() as u16)
    }
}

/// What the simulated link does with one frame.
#[derive(Debug, Clone, Copy)]
enum LinkFate {
    Delivered { latency_ms: u64 },
    Failed { latency_ms: u64 },
    Silent,
}

struct SimulatedEspNow {
    rng: ChaCha8Rng,
    local: PeerAddress,
    peer: Option<PeerAddress>,
    up: bool,
    /// Frames the receiver got, in arrival order
    receiver_inbox: Vec<Vec<u8>>,
}

impl SimulatedEspNow {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            local: PeerAddress::new([0x02, 0xAE, 0x21, 0x00, 0x00, 0x01]),
            peer: None,
            up: false,
            receiver_inbox: Vec::new(),
        }
    }

    /// Device reset: the radio comes back down and forgets its peer.
    fn reset(&mut self) {
        self.up = false;
        self.peer = None;
    }
}

impl RadioTransport for SimulatedEspNow {
    async fn init(&mut self, channel: u8) -> Result<(), RadioError> {
        if !NodeConfig::is_valid_channel(channel) {
            return Err(RadioError::InvalidChannel(channel));
        }
        if self.rng.gen_bool(RADIO_INIT_FAILURE_RATE) {
            return Err(RadioError::InitFailed {
                stage: "esp-now",
                details: "simulated driver error",
            });
        }
        self.up = true;
        Ok(())
    }

    fn add_peer(&mut self, peer: &PeerAddress, _channel: u8) -> Result<(), RadioError> {
        if !self.up {
            return Err(RadioError::NotInitialized);
        }
        self.peer = Some(*peer);
        Ok(())
    }

    fn send<'a>(
        &'a mut self,
        peer: &'a PeerAddress,
        payload: &'a [u8; WIRE_SIZE],
    ) -> impl Future<Output = SendStatus> + 'a {
        let roll: f64 = self.rng.r#gen();
        let latency_ms = self.rng.gen_range(SEND_LATENCY_MS);
        let fate = if !self.up || self.peer != Some(*peer) {
            LinkFate::Failed { latency_ms }
        } else if roll < SILENT_SEND_RATE {
            // The frame may still arrive; only the completion is lost.
            self.receiver_inbox.push(payload.to_vec());
            LinkFate::Silent
        } else if roll < SILENT_SEND_RATE + SEND_FAILURE_RATE {
            LinkFate::Failed { latency_ms }
        } else {
            self.receiver_inbox.push(payload.to_vec());
            LinkFate::Delivered { latency_ms }
        };

        async move {
            match fate {
                LinkFate::Delivered { latency_ms } => {
                    Timer::after(Duration::from_millis(latency_ms)).await;
                    SendStatus::Delivered
                }
                LinkFate::Failed { latency_ms } => {
                    Timer::after(Duration::from_millis(latency_ms)).await;
                    SendStatus::Failed
                }
                LinkFate::Silent => pending().await,
            }
        }
    }

    fn local_address(&self) -> Option<PeerAddress> {
        self.up.then_some(self.local)
    }
}

// ---------------------------------------------------------------------------
// Receiver model
// ---------------------------------------------------------------------------

/// Decode every frame waiting at the receiver.
fn drain_receiver(inbox: &mut Vec<Vec<u8>>) -> usize {
    let mut decoded = 0;
    for frame in inbox.drain(..) {
        match Reading::try_from(frame.as_slice()) {
            Ok(reading) => {
                decoded += 1;
                info!(
                    "receiver: {:.2} °C, {:.1} %RH, {:.2} hPa, {:.2} V",
                    reading.temperature, reading.humidity, reading.pressure, reading.battery_voltage
                );
            }
            Err(e) => warn!("receiver: dropped frame: {}", e),
        }
    }
    decoded
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tally {
    delivered: u32,
    failed: u32,
    timeouts: u32,
    radio_down: u32,
    degraded: u32,
    received: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let cycles = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_CYCLES);
    let seed = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    info!("Simulating {} wake cycles (seed {:#x})", cycles, seed);

    let config = NodeConfig::DEFAULT;
    let clock: SimClock = Rc::new(RefCell::new(0.0));
    let mut sensor = SimulatedBme280 {
        clock: clock.clone(),
        rng: ChaCha8Rng::seed_from_u64(seed ^ 0x5E45),
    };
    let mut battery = SimulatedBattery {
        clock: clock.clone(),
        full_voltage: 4.15,
    };
    let mut radio = SimulatedEspNow::new(seed ^ 0x4AD1);
    let mut jitter = ChaCha8Rng::seed_from_u64(seed);
    let ack = AckSignal::new();
    let mut tally = Tally::default();

    for wake in 1..=cycles {
        info!("--- wake {} ---", wake);
        radio.reset();

        let controller = CycleController::new(
            &config,
            &mut sensor,
            &mut battery,
            &mut radio,
            &mut jitter,
            &ack,
        );
        let report = block_on(controller.run_cycle());

        if report.sample.is_degraded() {
            tally.degraded += 1;
        }
        match report.outcome {
            CycleOutcome::Acknowledged(SendStatus::Delivered) => tally.delivered += 1,
            CycleOutcome::Acknowledged(SendStatus::Failed) => tally.failed += 1,
            CycleOutcome::SendTimeout => tally.timeouts += 1,
            CycleOutcome::RadioInitFailed(_) => tally.radio_down += 1,
        }
        tally.received += drain_receiver(&mut radio.receiver_inbox);

        *clock.borrow_mut() += report.sleep.as_secs() as f64;
    }

    info!(
        "Done after {:.1} simulated hours: {:?}",
        *clock.borrow() / 3_600.0,
        tally
    );
}
