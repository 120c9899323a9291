//! ZSSC3123 capacitance-to-digital converter behind the bridge.

use crate::traits::bridge::{I2cAddress, RegisterBridge};

pub const ADDR: I2cAddress = I2cAddress::new(0x28);

/// Measurement Request command.
const MEASURE: u8 = 0x00;

const STATUS_SHIFT: u16 = 14;
const DATA_MASK: u16 = 0x3FFF;

/// Status bits reported with every result.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Valid,
    /// Data already fetched since the last conversion.
    Stale,
    CommandMode,
    Diagnostic,
}

impl From<u16> for Status {
    fn from(word: u16) -> Status {
        match word >> STATUS_SHIFT {
            0b00 => Status::Valid,
            0b01 => Status::Stale,
            0b10 => Status::CommandMode,
            _ => Status::Diagnostic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub status: Status,
    pub value: u16,
}

impl From<[u8; 2]> for Measurement {
    fn from(buf: [u8; 2]) -> Measurement {
        let word = u16::from_be_bytes(buf);
        Measurement {
            status: word.into(),
            value: word & DATA_MASK,
        }
    }
}

pub struct Capacitance;

impl Capacitance {
    pub fn request<B: RegisterBridge>(bridge: &mut B) -> Result<(), B::Error> {
        bridge.write(ADDR, &[MEASURE])
    }

    pub fn read<B: RegisterBridge>(bridge: &mut B) -> Result<Measurement, B::Error> {
        let mut buf = [0; 2];
        bridge.read(ADDR, &mut buf)?;
        Ok(buf.into())
    }
}
