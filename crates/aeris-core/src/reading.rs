//! Sensor reading and its wire format.
//!
//! The receiver decodes the payload with an identical fixed layout, so the
//! byte representation is a compatibility contract:
//!
//! Binary format (little-endian, 16 bytes, no padding):
//! - temperature: 4 bytes (f32, °C)
//! - humidity: 4 bytes (f32, %RH)
//! - pressure: 4 bytes (f32, hPa)
//! - battery_voltage: 4 bytes (f32, V)

use thiserror_no_std::Error;

/// Size of an encoded [`Reading`] in bytes.
pub const WIRE_SIZE: usize = 16;

/// One environmental sample, produced once per wake cycle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    /// Temperature in degrees Celsius
    pub temperature: f32,
    /// Relative humidity in percent
    pub humidity: f32,
    /// Barometric pressure in hectopascal
    pub pressure: f32,
    /// Approximate supply voltage in volts
    pub battery_voltage: f32,
}

const _: () = assert!(core::mem::size_of::<Reading>() == WIRE_SIZE);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("payload is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
}

impl Reading {
    /// Returns the size of the encoded payload in bytes (16).
    pub const fn size() -> usize {
        WIRE_SIZE
    }

    /// Encodes the reading into its wire representation.
    pub fn to_bytes(&self) -> [u8; WIRE_SIZE] {
        let mut bytes = [0u8; WIRE_SIZE];

        let fields = [
            self.temperature,
            self.humidity,
            self.pressure,
            self.battery_voltage,
        ];
        for (i, value) in fields.iter().enumerate() {
            let offset = i * 4;
            bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }

        bytes
    }

    /// Decodes a reading from its wire representation.
    pub fn from_bytes(bytes: &[u8; WIRE_SIZE]) -> Self {
        let field = |index: usize| {
            let offset = index * 4;
            let mut value_bytes = [0u8; 4];
            value_bytes.copy_from_slice(&bytes[offset..offset + 4]);
            f32::from_le_bytes(value_bytes)
        };

        Self {
            temperature: field(0),
            humidity: field(1),
            pressure: field(2),
            battery_voltage: field(3),
        }
    }
}

impl TryFrom<&[u8]> for Reading {
    type Error = WireError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let exact: &[u8; WIRE_SIZE] = bytes.try_into().map_err(|_| WireError::Length {
            expected: WIRE_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self::from_bytes(exact))
    }
}
