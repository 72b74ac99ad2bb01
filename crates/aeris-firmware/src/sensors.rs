//! Concrete sensors: BME280 over I2C and the battery divider on the ADC.

use aeris_core::{BatteryMonitor, Environment, EnvironmentSensor, SensorError};
use bme280::i2c::AsyncBME280;
use embedded_hal_async::i2c::I2c;
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO1};
use esp_hal::Blocking;
use log::{error, info};

/// BME280 at its primary address (0x76).
///
/// The driver's default configuration is forced mode with 1x oversampling
/// for temperature, pressure and humidity, so every measurement is a single
/// conversion after which the sensor returns to sleep.
pub struct Bme280Sensor<I> {
    sensor: AsyncBME280<I>,
    initialized: bool,
}

impl<I: I2c> Bme280Sensor<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            sensor: AsyncBME280::new_primary(i2c),
            initialized: false,
        }
    }

    async fn initialize(&mut self) -> Result<(), SensorError> {
        self.sensor
            .init(&mut embassy_time::Delay)
            .await
            .map_err(|e| {
                error!("BME280 init failed: {:?}", e);
                SensorError::InitializationFailed {
                    sensor: "BME280",
                    details: "chip not responding or calibration read failed",
                }
            })?;

        info!("BME280 init ok");
        self.initialized = true;

        Ok(())
    }
}

impl<I: I2c> EnvironmentSensor for Bme280Sensor<I> {
    async fn measure(&mut self) -> Result<Environment, SensorError> {
        if !self.initialized {
            self.initialize().await?;
        }

        let measurement = self
            .sensor
            .measure(&mut embassy_time::Delay)
            .await
            .map_err(|e| {
                error!("BME280 measurement failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: "BME280",
                    operation: "forced measurement",
                    details: "I2C communication error or invalid data",
                }
            })?;

        Ok(Environment {
            temperature_celsius: measurement.temperature,
            humidity_percent: measurement.humidity,
            pressure_pascal: measurement.pressure,
        })
    }
}

/// Battery voltage divider on GPIO1.
pub struct AdcBattery<'d> {
    adc: Adc<'d, ADC1<'d>, Blocking>,
    pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
}

impl<'d> AdcBattery<'d> {
    pub fn new(adc1: ADC1<'d>, pin: GPIO1<'d>) -> Self {
        let mut config = AdcConfig::new();
        let pin = config.enable_pin(pin, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        Self { adc, pin }
    }
}

impl BatteryMonitor for AdcBattery<'_> {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        nb::block!(self.adc.read_oneshot(&mut self.pin)).map_err(|e| {
            error!("Battery ADC conversion failed: {:?}", e);
            SensorError::ReadFailed {
                sensor: "ADC1",
                operation: "oneshot conversion",
                details: "conversion did not complete",
            }
        })
    }
}
