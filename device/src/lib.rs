#![macro_use]
#![cfg_attr(not(feature = "std"), no_std)]
//! Driver for a capacitive soil moisture and temperature probe reached over
//! 1-Wire through a DS28E17 bridge.
//!
//! The driver is transport agnostic: implement [`traits::onewire::OneWireBus`]
//! for the bus master and [`traits::bridge::RegisterBridge`] for the bridge,
//! then drive a [`SoilSensor`].
//!
//! # Example
//!
//! ```ignore
//! let mut sensor = SoilSensor::new();
//! sensor.begin(&mut bus, &mut bridge)?;
//!
//! let moisture = sensor.read_moisture(&mut bridge)?;
//! let temperature = sensor.read_temperature_celsius(&mut bridge, &mut delay)?;
//! ```
//!
//! Calibration is read once in `begin` from the probe EEPROM. A probe with a
//! damaged or missing calibration still works with an evenly spaced curve;
//! [`SoilSensor::is_factory_calibrated`] tells the two apart.

pub(crate) mod fmt;

pub mod traits;

pub mod drivers;
pub use drivers::sensors::soil::{Config, SoilSensor, SoilSensorError};

pub mod domain;

#[cfg(feature = "std")]
pub mod testutil;
