//! Triple redundant calibration storage.
//!
//! The EEPROM holds three copies of a header followed by the calibration
//! record, one per bank. Reads fetch the same span from every bank and
//! rebuild each byte by bitwise majority, so any single bank may be
//! corrupted without losing the record. The rebuilt header and CRC then
//! decide whether the record is trusted; if not, the evenly spaced default
//! curve is used instead.

use super::calibration::{CalibrationRecord, RECORD_LEN};
use crate::traits::bridge::{I2cAddress, RegisterBridge};
use crate::traits::onewire::OneWireBus;
use heapless::Vec;

pub const ADDR: I2cAddress = I2cAddress::new(0x51);

pub const BANK_A: u16 = 0x000;
pub const BANK_B: u16 = 0x080;
pub const BANK_C: u16 = 0x100;

pub const SIGNATURE: u32 = 0xDEAD_BEEF;
pub const VERSION: u8 = 1;

pub const HEADER_LEN: usize = 8;

// Largest transfer issued to the bridge per bank.
const CHUNK: usize = 8;

const MAX_FAULTS: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError<E> {
    /// The span would reach into the next bank.
    OutOfBounds { address: u16, length: usize },
    Bridge(E),
}

impl<E> From<E> for EepromError<E> {
    fn from(e: E) -> EepromError<E> {
        EepromError::Bridge(e)
    }
}

/// A reason the stored calibration was not trusted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromFault {
    HeaderTransport,
    BadSignature(u32),
    BadVersion(u8),
    BadLength(u8),
    PayloadTransport,
    ChecksumMismatch { stored: u16, computed: u16 },
    NonMonotonic,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    pub signature: u32,
    pub version: u8,
    pub length: u8,
    pub crc: u16,
}

impl From<[u8; HEADER_LEN]> for Header {
    fn from(buf: [u8; HEADER_LEN]) -> Header {
        Header {
            signature: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            version: buf[4],
            length: buf[5],
            crc: u16::from_le_bytes([buf[6], buf[7]]),
        }
    }
}

impl Header {
    fn check(&self, faults: &mut Vec<EepromFault, MAX_FAULTS>) {
        if self.signature != SIGNATURE {
            let _ = faults.push(EepromFault::BadSignature(self.signature));
        }
        if self.version != VERSION {
            let _ = faults.push(EepromFault::BadVersion(self.version));
        }
        if self.length as usize != RECORD_LEN {
            let _ = faults.push(EepromFault::BadLength(self.length));
        }
    }
}

/// Outcome of loading the calibration at start-up.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromLoad {
    pub calibration: CalibrationRecord,
    pub faults: Vec<EepromFault, MAX_FAULTS>,
}

impl EepromLoad {
    /// Whether the stored record passed every check.
    pub fn is_valid(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Bitwise majority of three copies of a byte.
pub fn vote(a: u8, b: u8, c: u8) -> u8 {
    (a & b) | (a & c) | (b & c)
}

/// Read `buf.len()` bytes at `address` (relative to a bank) from all three
/// banks and rebuild them by majority.
///
/// Spans reaching the start of bank B are refused before touching the bus.
pub fn read<B: RegisterBridge>(
    bridge: &mut B,
    address: u16,
    buf: &mut [u8],
) -> Result<(), EepromError<B::Error>> {
    if BANK_A as usize + address as usize + buf.len() >= BANK_B as usize {
        return Err(EepromError::OutOfBounds {
            address,
            length: buf.len(),
        });
    }

    let mut a = [0; CHUNK];
    let mut b = [0; CHUNK];
    let mut c = [0; CHUNK];

    for (i, out) in buf.chunks_mut(CHUNK).enumerate() {
        let len = out.len();
        let offset = address + (i * CHUNK) as u16;

        bridge.memory_read(ADDR, BANK_A + offset, &mut a[..len])?;
        bridge.memory_read(ADDR, BANK_B + offset, &mut b[..len])?;
        bridge.memory_read(ADDR, BANK_C + offset, &mut c[..len])?;

        for (j, byte) in out.iter_mut().enumerate() {
            *byte = vote(a[j], b[j], c[j]);
        }
    }

    Ok(())
}

/// Load the calibration record, falling back to the uncalibrated curve.
///
/// Every check runs even after an earlier one failed, so the returned
/// faults list all problems found. The CRC primitive comes from the 1-Wire
/// transport.
pub fn load<B: RegisterBridge, W: OneWireBus>(bridge: &mut B, bus: &W) -> EepromLoad {
    let mut faults = Vec::new();

    let mut buf = [0; HEADER_LEN];
    let header = match read(bridge, 0, &mut buf) {
        Ok(_) => {
            let header = Header::from(buf);
            trace!(
                "eeprom header: signature {:x} version {} length {} crc {:x}",
                header.signature,
                header.version,
                header.length,
                header.crc
            );
            header.check(&mut faults);
            Some(header)
        }
        Err(_) => {
            let _ = faults.push(EepromFault::HeaderTransport);
            None
        }
    };

    let mut payload = [0; RECORD_LEN];
    let mut record = None;
    match read(bridge, HEADER_LEN as u16, &mut payload) {
        Ok(_) => {
            let computed = bus.crc16(&payload);
            if let Some(header) = header {
                if header.crc != computed {
                    let _ = faults.push(EepromFault::ChecksumMismatch {
                        stored: header.crc,
                        computed,
                    });
                }
            }

            let decoded = CalibrationRecord::from(payload);
            if !decoded.is_monotonic() {
                let _ = faults.push(EepromFault::NonMonotonic);
            }
            record.replace(decoded);
        }
        Err(_) => {
            let _ = faults.push(EepromFault::PayloadTransport);
        }
    }

    for fault in faults.iter() {
        warn!("eeprom: {:?}", fault);
    }

    let calibration = match record {
        Some(record) if faults.is_empty() => {
            debug!(
                "eeprom: product {} revision {:x} label {}",
                record.product(),
                record.revision(),
                record.label()
            );
            record
        }
        _ => {
            warn!("eeprom: using uncalibrated curve");
            CalibrationRecord::uncalibrated()
        }
    };

    EepromLoad {
        calibration,
        faults,
    }
}
