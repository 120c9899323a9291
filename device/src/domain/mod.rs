pub mod temperature;

use core::fmt::{Debug, Formatter};
use temperature::*;

/// One combined reading of the soil sensor.
#[derive(Copy, Clone)]
pub struct SoilAcquisition<S: TemperatureScale> {
    pub temperature: Temperature<S>,
    /// Volumetric moisture in percent, as mapped by the sensor calibration.
    pub moisture: u8,
}

impl<S: TemperatureScale> Debug for SoilAcquisition<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SoilAcquisition")
            .field("temperature", &self.temperature)
            .field("moisture", &self.moisture)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<S: TemperatureScale> defmt::Format for SoilAcquisition<S> {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(
            f,
            "SoilAcquisition(temperature: {}, moisture: {}%)",
            &self.temperature,
            &self.moisture
        );
    }
}
