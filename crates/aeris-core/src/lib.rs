//! Hardware-independent core library for aeris
//!
//! This crate contains the platform-agnostic logic of the aeris ESP-NOW
//! sensor node: the wire format of a reading, node configuration, the sensor
//! and radio capability traits, the wake cycle state machine and the sleep
//! scheduler.
//!
//! It is `#![no_std]` so it compiles on both the ESP32-S3 firmware and
//! desktop hosts (for the simulator and tests).

#![no_std]

pub mod config;
pub mod cycle;
pub mod radio;
pub mod reading;
pub mod sensors;
pub mod sleep;

pub use config::NodeConfig;
pub use cycle::{CycleController, CycleOutcome, CyclePhase, CycleReport};
pub use radio::{
    AckSignal, AddressParseError, PeerAddress, RadioError, RadioTransport, SendStatus,
};
pub use reading::{Reading, WIRE_SIZE};
pub use sensors::{
    BatteryMonitor, Environment, EnvironmentSensor, Sample, SensorError, SensorReader,
};
pub use sleep::{DeepSleep, compute_sleep_duration, enter_sleep};
