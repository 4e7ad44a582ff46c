//! The auxiliary power unit. Its turbine moves through `Shutdown → Starting → Running
//! → Stopping`; once running it supplies bleed air and drives its generator.
use self::turbine::Shutdown;
use crate::{
    electrical::PowerSource,
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    pneumatic::{BleedAirSource, BleedAirValve, Valve},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use log::{debug, info};
use thiserror::Error;
use uom::si::{
    f64::*, mass_rate::kilogram_per_second, ratio::percent, ratio::ratio,
    thermodynamic_temperature::degree_celsius,
};

mod turbine;

#[derive(Debug, Error, PartialEq)]
pub enum ApuCommandError {
    #[error("the APU cannot start without electrical power")]
    NoElectricalPower,
    #[error("the APU cannot start without fuel")]
    NoFuel,
    #[error("the APU fire push button is released")]
    FirePushButtonReleased,
    #[error("the APU is already running")]
    AlreadyRunning,
}

/// Signals to the APU turbine whether it should start or stop.
pub trait TurbineController {
    fn should_start(&self) -> bool;
    fn should_stop(&self) -> bool;
}

pub trait Turbine {
    fn update(
        self: Box<Self>,
        context: &UpdateContext,
        apu_bleed_is_used: bool,
        apu_gen_is_used: bool,
        controller: &dyn TurbineController,
    ) -> Box<dyn Turbine>;
    fn n(&self) -> Ratio;
    fn egt(&self) -> ThermodynamicTemperature;
    fn state(&self) -> TurbineState;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurbineState {
    Shutdown,
    Starting,
    Running,
    Stopping,
}

pub struct ApuUpdateArguments {
    bleed_push_button_is_on: bool,
    has_fuel: bool,
    fire_push_button_released: bool,
}
impl ApuUpdateArguments {
    pub fn new(
        bleed_push_button_is_on: bool,
        has_fuel: bool,
        fire_push_button_released: bool,
    ) -> Self {
        Self {
            bleed_push_button_is_on,
            has_fuel,
            fire_push_button_released,
        }
    }
}

/// Decides whether the turbine should start or stop based on the pilot's requests
/// and the conditions the APU runs under.
struct ElectronicControlBox {
    start_requested: bool,
    stop_requested: bool,
    has_fuel: bool,
    fire_push_button_released: bool,
}
impl ElectronicControlBox {
    fn new() -> Self {
        Self {
            start_requested: false,
            stop_requested: false,
            has_fuel: true,
            fire_push_button_released: false,
        }
    }

    fn update(&mut self, arguments: &ApuUpdateArguments) {
        self.has_fuel = arguments.has_fuel;
        self.fire_push_button_released = arguments.fire_push_button_released;
    }

    fn update_turbine_state(&mut self, state: TurbineState) {
        match state {
            TurbineState::Shutdown => self.stop_requested = false,
            _ => self.start_requested = false,
        }
    }
}
impl TurbineController for ElectronicControlBox {
    fn should_start(&self) -> bool {
        self.start_requested && self.has_fuel && !self.fire_push_button_released
    }

    fn should_stop(&self) -> bool {
        self.stop_requested || !self.has_fuel || self.fire_push_button_released
    }
}

pub struct ApuGenerator {
    output_id: String,
    n: Ratio,
    failure: Failure,
}
impl ApuGenerator {
    pub const CAPACITY: f64 = 0.5;
    const POWERED_N: f64 = 95.;

    fn new(recovery: RecoveryPolicy) -> Self {
        Self {
            output_id: "ELEC_APU_GEN_OUTPUT".to_owned(),
            n: Ratio::new::<percent>(0.),
            failure: Failure::new(FailureId::ApuGenerator, recovery),
        }
    }

    fn update(&mut self, n: Ratio) {
        self.n = n;
    }

    fn is_turning_fast_enough(&self) -> bool {
        self.n >= Ratio::new::<percent>(ApuGenerator::POWERED_N)
    }
}
impl PowerSource for ApuGenerator {
    fn output(&self) -> Ratio {
        if self.is_turning_fast_enough() && !self.failure.is_active() {
            Ratio::new::<ratio>(ApuGenerator::CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }

    fn is_failed(&self) -> bool {
        self.failure.is_active()
    }
}
impl Failable for ApuGenerator {
    fn failure(&self) -> &Failure {
        &self.failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.failure
    }

    fn failure_exposure(&self) -> f64 {
        if self.is_turning_fast_enough() {
            1.
        } else {
            0.
        }
    }
}
impl SimulationElement for ApuGenerator {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.output_id, self.output().get::<ratio>());
    }
}

pub struct AuxiliaryPowerUnit {
    turbine: Option<Box<dyn Turbine>>,
    generator: ApuGenerator,
    ecb: ElectronicControlBox,
    bleed_air_valve: BleedAirValve,
}
impl AuxiliaryPowerUnit {
    pub const BLEED_AIR_CAPACITY: f64 = 0.5;
    const BLEED_AIR_AVAILABLE_N: f64 = 95.;
    const RUNNING_FUEL_FLOW_KG_PER_SECOND: f64 = 0.03;

    pub fn new(generator_recovery: RecoveryPolicy) -> Self {
        Self::new_with_turbine(Box::new(Shutdown::new()), generator_recovery)
    }

    fn new_with_turbine(turbine: Box<dyn Turbine>, generator_recovery: RecoveryPolicy) -> Self {
        AuxiliaryPowerUnit {
            turbine: Some(turbine),
            generator: ApuGenerator::new(generator_recovery),
            ecb: ElectronicControlBox::new(),
            bleed_air_valve: BleedAirValve::new(),
        }
    }

    /// Requests an APU start. Starting clears a failure of the APU generator.
    pub fn start(
        &mut self,
        has_electrical_power: bool,
        has_fuel: bool,
        fire_push_button_released: bool,
    ) -> Result<(), ApuCommandError> {
        let result = if fire_push_button_released {
            Err(ApuCommandError::FirePushButtonReleased)
        } else if matches!(self.state(), TurbineState::Starting | TurbineState::Running)
            || self.ecb.start_requested
        {
            Err(ApuCommandError::AlreadyRunning)
        } else if !has_electrical_power {
            Err(ApuCommandError::NoElectricalPower)
        } else if !has_fuel {
            Err(ApuCommandError::NoFuel)
        } else {
            Ok(())
        };

        match result {
            Ok(()) => {
                info!("APU start requested.");
                self.ecb.start_requested = true;
                self.ecb.stop_requested = false;
                self.generator.failure.clear();
                Ok(())
            }
            Err(error) => {
                debug!("Rejected APU start request: {}.", error);
                Err(error)
            }
        }
    }

    pub fn stop(&mut self) {
        if self.state() != TurbineState::Shutdown || self.ecb.start_requested {
            info!("APU stop requested.");
        }

        self.ecb.start_requested = false;
        self.ecb.stop_requested = true;
    }

    pub fn update(&mut self, context: &UpdateContext, arguments: &ApuUpdateArguments) {
        self.ecb.update(arguments);

        if let Some(turbine) = self.turbine.take() {
            let previous_state = turbine.state();
            let updated_turbine = turbine.update(
                context,
                self.bleed_air_valve.is_open(),
                self.generator.is_supplying(),
                &self.ecb,
            );

            if previous_state != updated_turbine.state() {
                info!(
                    "APU transitioned from {:?} to {:?}.",
                    previous_state,
                    updated_turbine.state()
                );
            }

            self.ecb.update_turbine_state(updated_turbine.state());
            self.turbine = Some(updated_turbine);
        }

        self.bleed_air_valve.open_when(
            arguments.bleed_push_button_is_on
                && self.n() >= Ratio::new::<percent>(AuxiliaryPowerUnit::BLEED_AIR_AVAILABLE_N),
        );
        self.generator.update(self.n());
    }

    pub fn n(&self) -> Ratio {
        self.turbine
            .as_ref()
            .map_or(Ratio::new::<percent>(0.), |turbine| turbine.n())
    }

    pub fn egt(&self) -> ThermodynamicTemperature {
        self.turbine.as_ref().map_or(
            ThermodynamicTemperature::new::<degree_celsius>(0.),
            |turbine| turbine.egt(),
        )
    }

    pub fn state(&self) -> TurbineState {
        self.turbine
            .as_ref()
            .map_or(TurbineState::Shutdown, |turbine| turbine.state())
    }

    pub fn is_available(&self) -> bool {
        self.state() == TurbineState::Running
    }

    pub fn is_running_or_starting(&self) -> bool {
        matches!(self.state(), TurbineState::Starting | TurbineState::Running)
    }

    pub fn generator(&self) -> &ApuGenerator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut ApuGenerator {
        &mut self.generator
    }

    pub fn fuel_flow(&self) -> MassRate {
        MassRate::new::<kilogram_per_second>(if self.is_running_or_starting() {
            AuxiliaryPowerUnit::RUNNING_FUEL_FLOW_KG_PER_SECOND
        } else {
            0.
        })
    }
}
impl BleedAirSource for AuxiliaryPowerUnit {
    fn bleed_air_output(&self) -> Ratio {
        if self.bleed_air_valve.is_open() {
            Ratio::new::<ratio>(AuxiliaryPowerUnit::BLEED_AIR_CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }
}
impl SimulationElement for AuxiliaryPowerUnit {
    fn accept<V: SimulationElementVisitor>(&mut self, visitor: &mut V) {
        self.generator.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("APU_N", self.n().get::<percent>());
        writer.write_f64("APU_EGT", self.egt().get::<degree_celsius>());
        writer.write_bool("APU_AVAILABLE", self.is_available());
        writer.write_bool("APU_BLEED_AIR_VALVE_OPEN", self.bleed_air_valve.is_open());
    }
}
