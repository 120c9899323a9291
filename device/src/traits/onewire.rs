//! 1-Wire bus transport.
//!
//! The soil sensor sits behind a DS28E17 bridge on a 1-Wire bus. This
//! module describes what the driver needs from the bus itself: resets,
//! device search and the 1-Wire CRC-16. Bit-level timing is left to the
//! implementor.

use core::fmt::{Debug, Formatter};
use crc::{Crc, CRC_16_ARC};

/// CRC-16 as used by 1-Wire devices (x^16 + x^15 + x^2 + 1, reflected,
/// seed 0). Devices transmit the inverted value; callers comparing against
/// on-wire CRCs must invert themselves.
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// Family code of a 1-Wire device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    Ds28e17 = 0x19,
}

impl Family {
    pub fn from_u8(code: u8) -> Option<Family> {
        match code {
            0x19 => Some(Family::Ds28e17),
            _ => None,
        }
    }
}

/// 64-bit ROM identifier of a 1-Wire device, in bus order (family code
/// first, CRC-8 last).
#[derive(Copy, Clone, Default, Eq, PartialEq)]
pub struct Identifier([u8; 8]);

impl Identifier {
    pub const fn new(rom: [u8; 8]) -> Self {
        Self(rom)
    }

    /// All-zero identifier; never a valid device.
    pub const fn zero() -> Self {
        Self([0; 8])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 8]
    }

    pub fn family_code(&self) -> u8 {
        self.0[0]
    }

    /// Returns the family (or `None` if the family is unrecognized).
    pub fn family(&self) -> Option<Family> {
        Family::from_u8(self.family_code())
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for Identifier {
    fn from(rom: [u8; 8]) -> Self {
        Self(rom)
    }
}

impl From<Identifier> for u64 {
    fn from(id: Identifier) -> u64 {
        u64::from_le_bytes(id.0)
    }
}

impl Debug for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Identifier {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(f, "{=[u8]:x}", &self.0[..]);
    }
}

/// A 1-Wire bus master.
///
/// Search follows the usual ROM search state machine: `reset_search`
/// forgets previous branch decisions, `target_search` primes the next
/// search to start at the given family, and `search` walks the tree once,
/// returning the next identifier found (or `None` when nothing answered or
/// the search is exhausted).
pub trait OneWireBus {
    /// Issue a reset pulse. Returns whether a presence pulse was seen.
    fn reset(&mut self) -> bool;

    fn reset_search(&mut self);

    fn target_search(&mut self, family: Family);

    fn search(&mut self) -> Option<Identifier>;

    fn crc16(&self, data: &[u8]) -> u16 {
        CRC16.checksum(data)
    }
}
