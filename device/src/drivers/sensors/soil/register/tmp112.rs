//! TMP112 temperature sensor behind the bridge.

use crate::traits::bridge::{I2cAddress, RegisterBridge};

pub const ADDR: I2cAddress = I2cAddress::new(0x48);

const TEMPERATURE: u16 = 0x00;
const CONFIGURATION: u16 = 0x01;

/// Degrees Celsius per LSB of the 12-bit result.
pub const RESOLUTION: f32 = 0.0625;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    one_shot: bool,
    shutdown: bool,
}

impl Configuration {
    /// Stop continuous conversions; the sensor only wakes for one-shots.
    pub fn shutdown() -> Self {
        Self {
            one_shot: false,
            shutdown: true,
        }
    }

    /// Start a single conversion, then return to shutdown.
    pub fn one_shot() -> Self {
        Self {
            one_shot: true,
            shutdown: true,
        }
    }

    pub fn write<B: RegisterBridge>(self, bridge: &mut B) -> Result<(), B::Error> {
        let bytes: [u8; 2] = self.into();
        bridge.memory_write(ADDR, CONFIGURATION, &bytes)
    }
}

impl From<Configuration> for [u8; 2] {
    fn from(c: Configuration) -> [u8; 2] {
        let mut msb = 0;
        if c.one_shot {
            msb |= 0x80;
        }
        if c.shutdown {
            msb |= 0x01;
        }
        // 4 Hz conversion rate, normal mode
        [msb, 0x80]
    }
}

pub struct Temp;

impl Temp {
    /// Read the 12-bit two's complement result, right aligned.
    pub fn read<B: RegisterBridge>(bridge: &mut B) -> Result<i16, B::Error> {
        let mut buf = [0; 2];
        bridge.memory_read(ADDR, TEMPERATURE, &mut buf)?;
        Ok(i16::from_be_bytes(buf) >> 4)
    }
}

pub fn to_celsius(raw: i16) -> f32 {
    raw as f32 * RESOLUTION
}
