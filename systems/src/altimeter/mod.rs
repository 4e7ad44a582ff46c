use crate::simulation::{SimulationElement, SimulatorWriter, UpdateContext};
use log::info;
use thiserror::Error;
use uom::si::{f64::*, length::foot, pressure::hectopascal};

#[derive(Debug, Error, PartialEq)]
pub enum AltimeterCommandError {
    #[error("altimeter setting {0} hPa is outside 745 to 1100 hPa")]
    OutOfRange(f64),
}

/// Corrects the pressure altitude for the selected barometric reference.
pub struct Altimeter {
    setting: Pressure,
    altitude: Length,
}
impl Altimeter {
    pub const STANDARD_HECTOPASCALS: f64 = 1013.25;
    const MINIMUM_HECTOPASCALS: f64 = 745.;
    const MAXIMUM_HECTOPASCALS: f64 = 1100.;
    const FEET_PER_HECTOPASCAL: f64 = 27.3;

    pub fn new() -> Self {
        Self {
            setting: Pressure::new::<hectopascal>(Altimeter::STANDARD_HECTOPASCALS),
            altitude: Length::new::<foot>(0.),
        }
    }

    pub fn set(&mut self, hectopascals: f64) -> Result<(), AltimeterCommandError> {
        if !(Altimeter::MINIMUM_HECTOPASCALS..=Altimeter::MAXIMUM_HECTOPASCALS)
            .contains(&hectopascals)
        {
            return Err(AltimeterCommandError::OutOfRange(hectopascals));
        }

        info!("Altimeter set to {:.0} hPa.", hectopascals);
        self.setting = Pressure::new::<hectopascal>(hectopascals);
        Ok(())
    }

    pub fn set_standard(&mut self) {
        self.setting = Pressure::new::<hectopascal>(Altimeter::STANDARD_HECTOPASCALS);
    }

    pub fn update(&mut self, context: &UpdateContext) {
        let correction = (self.setting.get::<hectopascal>() - Altimeter::STANDARD_HECTOPASCALS)
            * Altimeter::FEET_PER_HECTOPASCAL;
        self.altitude = context.indicated_altitude() + Length::new::<foot>(correction);
    }

    pub fn setting(&self) -> Pressure {
        self.setting
    }

    pub fn altitude(&self) -> Length {
        self.altitude
    }
}
impl SimulationElement for Altimeter {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("BARO_SETTING", self.setting.get::<hectopascal>());
        writer.write_f64("BARO_ALTITUDE", self.altitude.get::<foot>());
    }
}
impl Default for Altimeter {
    fn default() -> Self {
        Self::new()
    }
}
