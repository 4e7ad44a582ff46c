//! Wheel brakes with an autobrake selector and a parking brake. Brake pressure is
//! limited by what the hydraulic system can deliver.
use crate::{
    shared::calculate_towards_target_temperature,
    simulation::{SimulationElement, SimulatorWriter, UpdateContext},
};
use log::info;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use thiserror::Error;
use uom::si::{
    f64::*, pressure::psi, ratio::ratio, thermodynamic_temperature::degree_celsius, velocity::knot,
};

#[derive(Clone, Copy, Debug, PartialEq, FromPrimitive)]
pub enum AutobrakeMode {
    Off = 0,
    Low = 1,
    Medium = 2,
    Max = 3,
}
impl AutobrakeMode {
    fn deceleration_command(&self) -> f64 {
        match self {
            AutobrakeMode::Off => 0.,
            AutobrakeMode::Low => 0.3,
            AutobrakeMode::Medium => 0.6,
            AutobrakeMode::Max => 1.,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BrakeCommandError {
    #[error("autobrake level {0} does not exist")]
    InvalidAutobrakeLevel(u8),
}

pub struct Brakes {
    autobrake: AutobrakeMode,
    parking_brake: bool,
    command: Ratio,
    pressure: Pressure,
    temperature: ThermodynamicTemperature,
}
impl Brakes {
    const MAXIMUM_PRESSURE_PSI: f64 = 3000.;
    const AUTOBRAKE_MINIMUM_SPEED_KNOTS: f64 = 40.;
    const HEATING_DEGREES_CELSIUS_PER_KNOT_SECOND: f64 = 0.05;
    const COOLING_DEGREES_CELSIUS_PER_SECOND: f64 = 0.5;
    pub const HOT_DEGREES_CELSIUS: f64 = 300.;

    pub fn new() -> Self {
        Self {
            autobrake: AutobrakeMode::Off,
            parking_brake: false,
            command: Ratio::new::<ratio>(0.),
            pressure: Pressure::new::<psi>(0.),
            temperature: ThermodynamicTemperature::new::<degree_celsius>(15.),
        }
    }

    pub fn set_autobrake_level(&mut self, level: u8) -> Result<(), BrakeCommandError> {
        let mode = AutobrakeMode::from_u8(level)
            .ok_or(BrakeCommandError::InvalidAutobrakeLevel(level))?;
        if mode != self.autobrake {
            info!("Autobrake set to {:?}.", mode);
        }
        self.autobrake = mode;

        Ok(())
    }

    pub fn set_parking_brake(&mut self, engaged: bool) {
        self.parking_brake = engaged;
    }

    pub fn update(&mut self, context: &UpdateContext, hydraulic_authority: Ratio) {
        let airspeed = context.indicated_airspeed().get::<knot>().max(0.);
        let command = if self.parking_brake {
            1.
        } else if context.is_on_ground() && airspeed > Brakes::AUTOBRAKE_MINIMUM_SPEED_KNOTS {
            self.autobrake.deceleration_command()
        } else {
            0.
        };

        let authority = hydraulic_authority.get::<ratio>().max(0.).min(1.);
        self.command = Ratio::new::<ratio>(command);
        self.pressure = Pressure::new::<psi>(Brakes::MAXIMUM_PRESSURE_PSI * authority * command);

        let applied = authority * command;
        let rolling_speed = if context.is_on_ground() { airspeed } else { 0. };
        let heated = self.temperature.get::<degree_celsius>()
            + Brakes::HEATING_DEGREES_CELSIUS_PER_KNOT_SECOND
                * applied
                * rolling_speed
                * context.delta_as_secs_f64();

        self.temperature = calculate_towards_target_temperature(
            ThermodynamicTemperature::new::<degree_celsius>(heated),
            context.ambient_temperature(),
            Brakes::COOLING_DEGREES_CELSIUS_PER_SECOND,
            context.delta(),
        );
    }

    pub fn autobrake(&self) -> AutobrakeMode {
        self.autobrake
    }

    pub fn is_parking_brake_engaged(&self) -> bool {
        self.parking_brake
    }

    /// What the brakes ask of the hydraulic system.
    pub fn hydraulic_demand(&self) -> Ratio {
        self.command
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    pub fn temperature(&self) -> ThermodynamicTemperature {
        self.temperature
    }

    pub fn is_hot(&self) -> bool {
        self.temperature
            > ThermodynamicTemperature::new::<degree_celsius>(Brakes::HOT_DEGREES_CELSIUS)
    }
}
impl SimulationElement for Brakes {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("AUTOBRAKE_LEVEL", self.autobrake as u8 as f64);
        writer.write_bool("PARKING_BRAKE", self.parking_brake);
        writer.write_f64("BRAKE_COMMAND", self.command.get::<ratio>());
        writer.write_f64("BRAKE_PRESSURE", self.pressure.get::<psi>());
        writer.write_f64(
            "BRAKE_TEMPERATURE",
            self.temperature.get::<degree_celsius>(),
        );
    }
}
impl Default for Brakes {
    fn default() -> Self {
        Self::new()
    }
}
