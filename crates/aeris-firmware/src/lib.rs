//! ESP32-S3 firmware-specific modules for aeris
//!
//! This crate contains the hardware-specific code that cannot compile on
//! desktop targets: peripheral setup, the BME280 and battery ADC drivers,
//! the ESP-NOW transport and the RTC deep sleep.

#![no_std]

pub mod config;
pub mod hardware;
pub mod power;
pub mod radio;
pub mod sensors;
