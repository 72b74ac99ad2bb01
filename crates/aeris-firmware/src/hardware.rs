//! Peripheral setup for the sensor node
//!
//! Wiring (ESP32-S3):
//!
//! | Signal      | GPIO   |
//! |-------------|--------|
//! | BME280 SDA  | GPIO8  |
//! | BME280 SCL  | GPIO9  |
//! | Battery ADC | GPIO1  |

use esp_hal::i2c::master::{Config as I2cConfig, ConfigError, I2c};
use esp_hal::peripherals::{GPIO8, GPIO9, I2C0};
use esp_hal::time::Rate;
use esp_hal::Async;

/// I2C clock for the environmental sensor.
const I2C_FREQUENCY_KHZ: u32 = 400;

/// Create the async I2C bus the BME280 sits on.
pub fn create_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO8<'static>,
    scl: GPIO9<'static>,
) -> Result<I2c<'static, Async>, ConfigError> {
    let bus = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
    )?
    .with_sda(sda)
    .with_scl(scl)
    .into_async();

    Ok(bus)
}
