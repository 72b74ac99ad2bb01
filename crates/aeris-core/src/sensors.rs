//! Sensor capabilities and the once-per-cycle sensor reader.

use core::future::Future;

use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::config::NodeConfig;
use crate::reading::Reading;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} read failed during {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
}

/// One measurement from the environmental sensor, in driver units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub temperature_celsius: f32,
    pub humidity_percent: f32,
    pub pressure_pascal: f32,
}

/// Environmental sensor sampled once per wake cycle.
pub trait EnvironmentSensor {
    /// Configure the sensor and take a single forced-mode measurement.
    fn measure(&mut self) -> impl Future<Output = Result<Environment, SensorError>>;
}

/// Analog supply voltage input.
pub trait BatteryMonitor {
    /// Raw ADC counts of the battery divider.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Result of sampling the sensors for one cycle.
///
/// A reading is always produced. Fields whose source failed are `NaN` and
/// the first failure is kept in `degraded`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub reading: Reading,
    pub degraded: Option<SensorError>,
}

impl Sample {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Samples the environmental sensor and battery input into a [`Reading`].
///
/// Sensor failures never abort the cycle: degraded data is sent rather than
/// nothing at all.
pub struct SensorReader {
    battery_divisor: f32,
    report_humidity: bool,
}

impl SensorReader {
    pub const fn new(config: &NodeConfig) -> Self {
        Self {
            battery_divisor: config.battery_divisor,
            report_humidity: config.report_humidity,
        }
    }

    /// Read every sensor once.
    pub async fn read_environment<S, B>(&self, sensor: &mut S, battery: &mut B) -> Sample
    where
        S: EnvironmentSensor,
        B: BatteryMonitor,
    {
        let mut reading = Reading::default();
        let mut degraded = None;

        match sensor.measure().await {
            Ok(environment) => {
                reading.temperature = environment.temperature_celsius;
                reading.pressure = environment.pressure_pascal / 100.0;
                if self.report_humidity {
                    reading.humidity = environment.humidity_percent;
                }
            }
            Err(e) => {
                error!("Environment sensor unavailable, sending degraded reading: {}", e);
                reading.temperature = f32::NAN;
                reading.pressure = f32::NAN;
                if self.report_humidity {
                    reading.humidity = f32::NAN;
                }
                degraded = Some(e);
            }
        }

        match battery.read_raw() {
            Ok(raw) => reading.battery_voltage = raw as f32 / self.battery_divisor,
            Err(e) => {
                warn!("Battery voltage unavailable: {}", e);
                reading.battery_voltage = f32::NAN;
                degraded.get_or_insert(e);
            }
        }

        info!(
            "temp={:.2}, humidity={:.2}, pressure={:.2}, voltage={:.2}",
            reading.temperature, reading.humidity, reading.pressure, reading.battery_voltage
        );

        Sample { reading, degraded }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sensors shared by the unit tests of this crate.

    use super::*;

    pub struct ScriptedSensor {
        pub result: Result<Environment, SensorError>,
        pub reads: usize,
    }

    impl ScriptedSensor {
        pub fn ok(temperature_celsius: f32, humidity_percent: f32, pressure_pascal: f32) -> Self {
            Self {
                result: Ok(Environment {
                    temperature_celsius,
                    humidity_percent,
                    pressure_pascal,
                }),
                reads: 0,
            }
        }

        pub fn failing() -> Self {
            Self {
                result: Err(SensorError::InitializationFailed {
                    sensor: "BME280",
                    details: "chip id mismatch",
                }),
                reads: 0,
            }
        }
    }

    impl EnvironmentSensor for ScriptedSensor {
        async fn measure(&mut self) -> Result<Environment, SensorError> {
            self.reads += 1;
            self.result
        }
    }

    pub struct ScriptedBattery(pub Result<u16, SensorError>);

    impl BatteryMonitor for ScriptedBattery {
        fn read_raw(&mut self) -> Result<u16, SensorError> {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{ScriptedBattery, ScriptedSensor};
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn test_reading_units() {
        let reader = SensorReader::new(&NodeConfig::DEFAULT);
        let mut sensor = ScriptedSensor::ok(22.5, 41.0, 101_325.0);
        let mut battery = ScriptedBattery(Ok(864));

        let sample = block_on(reader.read_environment(&mut sensor, &mut battery));

        assert!(!sample.is_degraded());
        assert_eq!(sample.reading.temperature, 22.5);
        assert_eq!(sample.reading.humidity, 41.0);
        assert_eq!(sample.reading.pressure, 1013.25);
        assert_eq!(sample.reading.battery_voltage, 4.0);
        assert_eq!(sensor.reads, 1);
    }

    #[test]
    fn test_failed_sensor_still_produces_reading() {
        let reader = SensorReader::new(&NodeConfig::DEFAULT);
        let mut sensor = ScriptedSensor::failing();
        let mut battery = ScriptedBattery(Ok(432));

        let sample = block_on(reader.read_environment(&mut sensor, &mut battery));

        assert!(matches!(
            sample.degraded,
            Some(SensorError::InitializationFailed { sensor: "BME280", .. })
        ));
        assert!(sample.reading.temperature.is_nan());
        assert!(sample.reading.humidity.is_nan());
        assert!(sample.reading.pressure.is_nan());
        assert_eq!(sample.reading.battery_voltage, 2.0);
    }

    #[test]
    fn test_failed_battery_keeps_environment() {
        let reader = SensorReader::new(&NodeConfig::DEFAULT);
        let mut sensor = ScriptedSensor::ok(18.0, 60.0, 99_000.0);
        let mut battery = ScriptedBattery(Err(SensorError::ReadFailed {
            sensor: "ADC",
            operation: "oneshot conversion",
            details: "conversion did not complete",
        }));

        let sample = block_on(reader.read_environment(&mut sensor, &mut battery));

        assert!(sample.is_degraded());
        assert_eq!(sample.reading.temperature, 18.0);
        assert_eq!(sample.reading.pressure, 990.0);
        assert!(sample.reading.battery_voltage.is_nan());
    }

    #[test]
    fn test_humidity_disabled_sends_zero() {
        let config = NodeConfig {
            report_humidity: false,
            ..NodeConfig::DEFAULT
        };
        let reader = SensorReader::new(&config);

        let mut sensor = ScriptedSensor::ok(20.0, 55.0, 100_000.0);
        let sample = block_on(reader.read_environment(&mut sensor, &mut ScriptedBattery(Ok(0))));
        assert_eq!(sample.reading.humidity, 0.0);

        let mut sensor = ScriptedSensor::failing();
        let sample = block_on(reader.read_environment(&mut sensor, &mut ScriptedBattery(Ok(0))));
        assert_eq!(sample.reading.humidity, 0.0);
    }
}
