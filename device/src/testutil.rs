//! Simulated 1-Wire bus and bridge for exercising the driver off-target.
//!
//! [`SimulatedBridge`] emulates the three devices behind the probe's
//! bridge (EEPROM, TMP112 and ZSSC3123) and records every transaction so
//! tests can assert on bus traffic as well as on results.

use crate::drivers::sensors::soil::calibration::{LABEL_LEN, POINTS, RECORD_LEN};
use crate::drivers::sensors::soil::eeprom::{self, HEADER_LEN};
use crate::drivers::sensors::soil::register::{tmp112, zssc3123};
use crate::traits::bridge::{I2cAddress, PowerMode, RegisterBridge};
use crate::traits::onewire::{Family, Identifier, OneWireBus, CRC16};
use embedded_hal::delay::DelayNs;
use std::vec::Vec;

/// Size of the emulated EEPROM: three banks of 128 bytes.
pub const EEPROM_SIZE: usize = 0x180;

/// Length of one stored copy: header plus record.
pub const IMAGE_LEN: usize = HEADER_LEN + RECORD_LEN;

/// A bus with at most one device that shows up after a number of searches.
pub struct SimulatedBus {
    device: Option<Identifier>,
    hidden_for: usize,
    pub resets: usize,
    pub search_resets: usize,
    pub searches: usize,
    pub targeted: Vec<Family>,
}

impl SimulatedBus {
    /// Nothing on the bus; every search comes back empty.
    pub fn empty() -> Self {
        Self::with_device_after(Identifier::zero(), usize::MAX)
    }

    pub fn with_device(device: Identifier) -> Self {
        Self::with_device_after(device, 0)
    }

    /// `device` answers only once `searches` searches have come back empty.
    pub fn with_device_after(device: Identifier, searches: usize) -> Self {
        Self {
            device: Some(device),
            hidden_for: searches,
            resets: 0,
            search_resets: 0,
            searches: 0,
            targeted: Vec::new(),
        }
    }
}

impl OneWireBus for SimulatedBus {
    fn reset(&mut self) -> bool {
        self.resets += 1;
        self.device.map(|d| !d.is_zero()).unwrap_or(false)
    }

    fn reset_search(&mut self) {
        self.search_resets += 1;
    }

    fn target_search(&mut self, family: Family) {
        self.targeted.push(family);
    }

    fn search(&mut self) -> Option<Identifier> {
        self.searches += 1;
        if self.searches > self.hidden_for {
            self.device
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimulatedError {
    Nack,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Transaction {
    SetAddress(Identifier),
    Write {
        device: I2cAddress,
        data: Vec<u8>,
    },
    Read {
        device: I2cAddress,
        len: usize,
    },
    MemoryWrite {
        device: I2cAddress,
        register: u16,
        data: Vec<u8>,
    },
    MemoryRead {
        device: I2cAddress,
        register: u16,
        len: usize,
    },
    Power(PowerMode),
}

/// The probe as seen through its bridge.
pub struct SimulatedBridge {
    pub address: Option<Identifier>,
    pub eeprom: [u8; EEPROM_SIZE],
    pub temperature: [u8; 2],
    pub tmp112_config: [u8; 2],
    pub capacitance: [u8; 2],
    pub power: PowerMode,
    pub transactions: Vec<Transaction>,
    failing: Vec<(I2cAddress, Option<u16>)>,
}

impl Default for SimulatedBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBridge {
    /// A probe with an erased EEPROM.
    pub fn new() -> Self {
        Self {
            address: None,
            eeprom: [0xFF; EEPROM_SIZE],
            temperature: [0; 2],
            tmp112_config: [0x60, 0xA0],
            capacitance: [0; 2],
            power: PowerMode::Active,
            transactions: Vec::new(),
            failing: Vec::new(),
        }
    }

    /// A probe with `image` written to all three banks.
    pub fn with_image(image: &[u8; IMAGE_LEN]) -> Self {
        let mut bridge = Self::new();
        for bank in [eeprom::BANK_A, eeprom::BANK_B, eeprom::BANK_C] {
            bridge.bank_mut(bank)[..IMAGE_LEN].copy_from_slice(image);
        }
        bridge
    }

    /// The 128 bytes of the bank starting at `bank`.
    pub fn bank_mut(&mut self, bank: u16) -> &mut [u8] {
        let start = bank as usize;
        &mut self.eeprom[start..start + 0x80]
    }

    /// Every transaction to `device` fails.
    pub fn fail(&mut self, device: I2cAddress) {
        self.failing.push((device, None));
    }

    /// Memory transactions to `device` at exactly `register` fail.
    pub fn fail_register(&mut self, device: I2cAddress, register: u16) {
        self.failing.push((device, Some(register)));
    }

    /// Load the TMP112 result register with a right aligned 12-bit value.
    pub fn set_temperature_raw(&mut self, raw: i16) {
        self.temperature = (raw << 4).to_be_bytes();
    }

    /// Load the ZSSC3123 output with two status bits and 14 data bits.
    pub fn set_capacitance(&mut self, status: u8, value: u16) {
        let word = (u16::from(status & 0b11) << 14) | (value & 0x3FFF);
        self.capacitance = word.to_be_bytes();
    }

    /// Transactions other than power mode and address selection.
    pub fn i2c_transactions(&self) -> usize {
        self.transactions
            .iter()
            .filter(|t| !matches!(t, Transaction::SetAddress(_) | Transaction::Power(_)))
            .count()
    }

    fn check(&self, device: I2cAddress, register: Option<u16>) -> Result<(), SimulatedError> {
        let failed = self.failing.iter().any(|(d, r)| {
            *d == device
                && match r {
                    None => true,
                    Some(r) => Some(*r) == register,
                }
        });
        if failed || self.address.is_none() {
            Err(SimulatedError::Nack)
        } else {
            Ok(())
        }
    }
}

impl RegisterBridge for SimulatedBridge {
    type Error = SimulatedError;

    fn set_address(&mut self, address: Identifier) {
        self.transactions.push(Transaction::SetAddress(address));
        self.address = Some(address);
    }

    fn write(&mut self, device: I2cAddress, data: &[u8]) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::Write {
            device,
            data: data.to_vec(),
        });
        self.check(device, None)?;
        if device == zssc3123::ADDR {
            Ok(())
        } else {
            Err(SimulatedError::Nack)
        }
    }

    fn read(&mut self, device: I2cAddress, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::Read {
            device,
            len: buf.len(),
        });
        self.check(device, None)?;
        if device == zssc3123::ADDR && buf.len() <= 2 {
            buf.copy_from_slice(&self.capacitance[..buf.len()]);
            Ok(())
        } else {
            Err(SimulatedError::Nack)
        }
    }

    fn memory_write(
        &mut self,
        device: I2cAddress,
        register: u16,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::MemoryWrite {
            device,
            register,
            data: data.to_vec(),
        });
        self.check(device, Some(register))?;
        match (device, register) {
            (d, 0x01) if d == tmp112::ADDR && data.len() == 2 => {
                self.tmp112_config.copy_from_slice(data);
                Ok(())
            }
            (d, r) if d == eeprom::ADDR && r as usize + data.len() <= EEPROM_SIZE => {
                let r = r as usize;
                self.eeprom[r..r + data.len()].copy_from_slice(data);
                Ok(())
            }
            _ => Err(SimulatedError::Nack),
        }
    }

    fn memory_read(
        &mut self,
        device: I2cAddress,
        register: u16,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::MemoryRead {
            device,
            register,
            len: buf.len(),
        });
        self.check(device, Some(register))?;
        match (device, register) {
            (d, 0x00) if d == tmp112::ADDR && buf.len() == 2 => {
                buf.copy_from_slice(&self.temperature);
                Ok(())
            }
            (d, 0x01) if d == tmp112::ADDR && buf.len() == 2 => {
                buf.copy_from_slice(&self.tmp112_config);
                Ok(())
            }
            (d, r) if d == eeprom::ADDR && r as usize + buf.len() <= EEPROM_SIZE => {
                let r = r as usize;
                buf.copy_from_slice(&self.eeprom[r..r + buf.len()]);
                Ok(())
            }
            _ => Err(SimulatedError::Nack),
        }
    }

    fn set_power_mode(&mut self, mode: PowerMode) -> Result<(), Self::Error> {
        self.transactions.push(Transaction::Power(mode));
        self.power = mode;
        Ok(())
    }
}

/// Serialize a calibration record and its header the way the factory
/// writes it into each bank.
pub fn image(
    product: u8,
    revision: u16,
    label: &str,
    points: &[u16; POINTS],
) -> [u8; IMAGE_LEN] {
    let mut record = [0u8; RECORD_LEN];
    record[0] = product;
    record[1..3].copy_from_slice(&revision.to_le_bytes());
    let label = label.as_bytes();
    let n = label.len().min(LABEL_LEN);
    record[3..3 + n].copy_from_slice(&label[..n]);
    let offset = 3 + LABEL_LEN + 1;
    for (i, point) in points.iter().enumerate() {
        record[offset + 2 * i..offset + 2 * i + 2].copy_from_slice(&point.to_le_bytes());
    }

    let mut out = [0u8; IMAGE_LEN];
    out[0..4].copy_from_slice(&eeprom::SIGNATURE.to_le_bytes());
    out[4] = eeprom::VERSION;
    out[5] = RECORD_LEN as u8;
    out[6..8].copy_from_slice(&CRC16.checksum(&record).to_le_bytes());
    out[HEADER_LEN..].copy_from_slice(&record);
    out
}

/// A delay that only keeps count.
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls += 1;
        self.total_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ms) * 1_000_000;
    }
}
