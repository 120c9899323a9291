//! Soil moisture and temperature sensor.
//!
//! The probe carries a DS28E17 1-Wire to I2C bridge with three devices
//! behind it: a ZSSC3123 capacitance converter for moisture, a TMP112 for
//! soil temperature and an EEPROM holding the per-probe calibration curve.
//!
//! [`SoilSensor`] holds the per-probe state (bridge identifier and
//! calibration). The bus and bridge are borrowed per call, so several
//! probes can share one bus.

pub mod calibration;
pub mod eeprom;
pub mod register;

use crate::domain::temperature::{Celsius, Fahrenheit, Kelvin, Temperature};
use crate::domain::SoilAcquisition;
use crate::traits::bridge::{PowerMode, RegisterBridge};
use crate::traits::onewire::{Family, Identifier, OneWireBus};
use calibration::{CalibrationError, CalibrationRecord};
use eeprom::{EepromFault, EepromLoad};
use embedded_hal::delay::DelayNs;
use register::tmp112::{self, Configuration, Temp};
use register::zssc3123::{Capacitance, Status};

/// Search attempts before giving up on discovery.
pub const SEARCH_TIMEOUT: u8 = 50;

/// Time given to the TMP112 and the bridge to finish a one-shot conversion.
pub const CONVERSION_DELAY_MS: u32 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub search_timeout: u8,
    pub conversion_delay_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_timeout: SEARCH_TIMEOUT,
            conversion_delay_ms: CONVERSION_DELAY_MS,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SoilSensorError<E> {
    Bridge(E),
    /// No bridge answered the search within the configured attempts.
    NotFound,
    /// `begin` has not completed successfully.
    NotInitialized,
    /// The capacitance converter reported a non-valid status.
    NotReady(Status),
    Calibration(CalibrationError),
}

impl<E> From<E> for SoilSensorError<E> {
    fn from(e: E) -> SoilSensorError<E> {
        SoilSensorError::Bridge(e)
    }
}

struct Session {
    address: Identifier,
    eeprom: EepromLoad,
}

pub struct SoilSensor {
    config: Config,
    session: Option<Session>,
    power: PowerMode,
}

impl Default for SoilSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilSensor {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            session: None,
            power: PowerMode::Active,
        }
    }

    /// Find the probe on the bus, load its calibration and put the
    /// temperature sensor into shutdown.
    ///
    /// A missing or corrupted calibration is not an error: the
    /// uncalibrated curve is used and the faults are available through
    /// [`SoilSensor::calibration_faults`].
    pub fn begin<W: OneWireBus, B: RegisterBridge>(
        &mut self,
        bus: &mut W,
        bridge: &mut B,
    ) -> Result<Identifier, SoilSensorError<B::Error>> {
        self.session = None;

        // A search left half way by a previous run needs two resets to
        // reliably bring every device back.
        bus.reset();
        bus.reset();

        let address = self.discover(bus).ok_or(SoilSensorError::NotFound)?;
        info!("soil sensor found at {:?}", address);

        bridge.set_address(address);

        let eeprom = eeprom::load(bridge, bus);
        if !eeprom.is_valid() {
            warn!("soil sensor {:?} is not calibrated", address);
        }

        Configuration::shutdown().write(bridge)?;

        self.session = Some(Session { address, eeprom });
        Ok(address)
    }

    fn discover<W: OneWireBus>(&self, bus: &mut W) -> Option<Identifier> {
        for attempt in 1..=self.config.search_timeout {
            bus.reset_search();
            bus.target_search(Family::Ds28e17);

            match bus.search() {
                Some(id) if !id.is_zero() && id.family() == Some(Family::Ds28e17) => {
                    return Some(id)
                }
                Some(id) => {
                    trace!("search attempt {}: skipping {:?}", attempt, id);
                }
                None => {
                    trace!("search attempt {}: nothing found", attempt);
                }
            }
        }

        warn!(
            "soil sensor not found after {} attempts",
            self.config.search_timeout
        );
        None
    }

    fn ready<E>(&self) -> Result<&Session, SoilSensorError<E>> {
        self.session.as_ref().ok_or(SoilSensorError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// Identifier of the probe's bridge, once found.
    pub fn address(&self) -> Option<Identifier> {
        self.session.as_ref().map(|s| s.address)
    }

    /// Calibration in use, once initialized.
    pub fn calibration(&self) -> Option<&CalibrationRecord> {
        self.session.as_ref().map(|s| &s.eeprom.calibration)
    }

    /// Problems found with the stored calibration; empty when it was used.
    pub fn calibration_faults(&self) -> &[EepromFault] {
        match &self.session {
            Some(s) => &s.eeprom.faults[..],
            None => &[],
        }
    }

    /// Whether the calibration comes from the probe EEPROM.
    pub fn is_factory_calibrated(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.eeprom.is_valid())
            .unwrap_or(false)
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power
    }

    pub fn wake_up<B: RegisterBridge>(&mut self, bridge: &mut B) -> Result<(), B::Error> {
        bridge.set_power_mode(PowerMode::Active)?;
        self.power = PowerMode::Active;
        Ok(())
    }

    pub fn sleep<B: RegisterBridge>(&mut self, bridge: &mut B) -> Result<(), B::Error> {
        bridge.set_power_mode(PowerMode::Sleep)?;
        self.power = PowerMode::Sleep;
        Ok(())
    }

    /// Raw 14-bit capacitance reading.
    pub fn read_moisture_raw<B: RegisterBridge>(
        &mut self,
        bridge: &mut B,
    ) -> Result<u16, SoilSensorError<B::Error>> {
        self.ready::<B::Error>()?;

        Capacitance::request(bridge)?;
        let measurement = Capacitance::read(bridge)?;
        trace!("capacitance: {:?}", measurement);

        match measurement.status {
            Status::Valid => Ok(measurement.value),
            status => {
                debug!("capacitance not ready: {:?}", status);
                Err(SoilSensorError::NotReady(status))
            }
        }
    }

    /// Moisture mapped onto `[min, max]` through the calibration curve.
    pub fn read_moisture_interval<B: RegisterBridge>(
        &mut self,
        bridge: &mut B,
        min: u16,
        max: u16,
    ) -> Result<u16, SoilSensorError<B::Error>> {
        let raw = self.read_moisture_raw(bridge)?;
        self.ready::<B::Error>()?
            .eeprom
            .calibration
            .map(raw, min, max)
            .map_err(SoilSensorError::Calibration)
    }

    /// Moisture in percent.
    pub fn read_moisture<B: RegisterBridge>(
        &mut self,
        bridge: &mut B,
    ) -> Result<u8, SoilSensorError<B::Error>> {
        Ok(self.read_moisture_interval(bridge, 0, 100)? as u8)
    }

    /// Trigger a one-shot conversion and read the result.
    pub fn read_temperature_celsius<B: RegisterBridge, D: DelayNs>(
        &mut self,
        bridge: &mut B,
        delay: &mut D,
    ) -> Result<Temperature<Celsius>, SoilSensorError<B::Error>> {
        self.ready::<B::Error>()?;

        Configuration::one_shot().write(bridge)?;
        delay.delay_ms(self.config.conversion_delay_ms);

        let raw = Temp::read(bridge)?;
        trace!("temperature raw: {}", raw);

        Ok(tmp112::to_celsius(raw).into())
    }

    pub fn read_temperature_kelvin<B: RegisterBridge, D: DelayNs>(
        &mut self,
        bridge: &mut B,
        delay: &mut D,
    ) -> Result<Temperature<Kelvin>, SoilSensorError<B::Error>> {
        Ok(self.read_temperature_celsius(bridge, delay)?.into_kelvin())
    }

    pub fn read_temperature_fahrenheit<B: RegisterBridge, D: DelayNs>(
        &mut self,
        bridge: &mut B,
        delay: &mut D,
    ) -> Result<Temperature<Fahrenheit>, SoilSensorError<B::Error>> {
        Ok(self.read_temperature_celsius(bridge, delay)?.into_fahrenheit())
    }

    /// Read temperature and moisture in one go.
    pub fn read<B: RegisterBridge, D: DelayNs>(
        &mut self,
        bridge: &mut B,
        delay: &mut D,
    ) -> Result<SoilAcquisition<Celsius>, SoilSensorError<B::Error>> {
        let temperature = self.read_temperature_celsius(bridge, delay)?;
        let moisture = self.read_moisture(bridge)?;
        Ok(SoilAcquisition {
            temperature,
            moisture,
        })
    }
}
