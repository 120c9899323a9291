//! 1-Wire to I2C register bridge.
//!
//! The bridge (a DS28E17 on the soil sensor module) is addressed over
//! 1-Wire and forwards I2C transactions to the devices behind it. The
//! driver only relies on the byte-level operations below.

use super::onewire::Identifier;

/// 7-bit I2C address of a device behind the bridge.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cAddress(u8);

impl I2cAddress {
    pub const fn new(address: u8) -> Self {
        Self(address)
    }
}

impl From<I2cAddress> for u8 {
    fn from(address: I2cAddress) -> u8 {
        address.0
    }
}

impl From<u8> for I2cAddress {
    fn from(address: u8) -> Self {
        Self(address)
    }
}

/// Power state of the bridge.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Active,
    Sleep,
}

/// Register level access to I2C devices through a 1-Wire bridge.
///
/// `memory_*` operations address a register (or EEPROM cell) inside the
/// target device; the plain `read`/`write` operations move raw bytes
/// without a register pointer.
pub trait RegisterBridge {
    type Error;

    /// Select the bridge that subsequent transactions go through.
    fn set_address(&mut self, address: Identifier);

    fn write(&mut self, device: I2cAddress, data: &[u8]) -> Result<(), Self::Error>;

    fn read(&mut self, device: I2cAddress, buf: &mut [u8]) -> Result<(), Self::Error>;

    fn memory_write(
        &mut self,
        device: I2cAddress,
        register: u16,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    fn memory_read(
        &mut self,
        device: I2cAddress,
        register: u16,
        buf: &mut [u8],
    ) -> Result<(), Self::Error>;

    fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Self::Error>;
}
