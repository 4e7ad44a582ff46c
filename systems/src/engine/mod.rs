//! Engine start sequencing and running engine behaviour.
//!
//! The engine core moves through `Off → Spooling → Idle → Running`. Spooling needs
//! starter air from the bleed duct for its whole duration and aborts when the air is lost.
//! A running engine flames out on sustained inlet icing, an oil temperature limit breach
//! or fuel starvation, after which only a new start request brings it back.
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    pneumatic::BleedAirSource,
    shared::{calculate_towards_target, calculate_towards_target_temperature, DelayedTrueLogicGate},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use log::{debug, info};
use std::time::Duration;
use thiserror::Error;
use uom::si::{
    f64::*, mass_rate::kilogram_per_second, pressure::psi, ratio::percent, ratio::ratio,
    thermodynamic_temperature::degree_celsius,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EngineState {
    Off,
    Spooling,
    Idle,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlameoutCause {
    Icing,
    OilTemperature,
    FuelStarvation,
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineCommandError {
    #[error("engine {0} cannot start: insufficient bleed air for the starter")]
    InsufficientBleedAir(usize),
    #[error("engine {0} is already started")]
    AlreadyStarted(usize),
    #[error("engine {0} fire push button is released")]
    FirePushButtonReleased(usize),
}

pub struct EngineUpdateArguments {
    starter_air_pressure: Pressure,
    inlet_ice: Ratio,
    has_fuel: bool,
    fire_push_button_released: bool,
}
impl EngineUpdateArguments {
    pub fn new(
        starter_air_pressure: Pressure,
        inlet_ice: Ratio,
        has_fuel: bool,
        fire_push_button_released: bool,
    ) -> Self {
        Self {
            starter_air_pressure,
            inlet_ice,
            has_fuel,
            fire_push_button_released,
        }
    }

    fn has_starter_air(&self) -> bool {
        self.starter_air_pressure >= Pressure::new::<psi>(Engine::MINIMUM_STARTER_AIR_PRESSURE_PSI)
    }
}

trait EngineCore {
    fn update(
        self: Box<Self>,
        context: &UpdateContext,
        arguments: &EngineUpdateArguments,
        throttle: Ratio,
    ) -> Box<dyn EngineCore>;
    fn n2(&self) -> Ratio;
    fn state(&self) -> EngineState;
}

struct Off {
    n2: Ratio,
}
impl Off {
    fn new(n2: Ratio) -> Self {
        Self { n2 }
    }
}
impl EngineCore for Off {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: &EngineUpdateArguments,
        _: Ratio,
    ) -> Box<dyn EngineCore> {
        self.n2 = Ratio::new::<percent>(calculate_towards_target(
            self.n2.get::<percent>(),
            0.,
            Engine::SPOOL_DOWN_RATE_PERCENT_PER_SECOND,
            context.delta(),
        ));

        self
    }

    fn n2(&self) -> Ratio {
        self.n2
    }

    fn state(&self) -> EngineState {
        EngineState::Off
    }
}

struct Spooling {
    since: Duration,
    n2: Ratio,
}
impl Spooling {
    fn new(n2: Ratio) -> Self {
        Self {
            since: Duration::from_secs(0),
            n2,
        }
    }
}
impl EngineCore for Spooling {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        arguments: &EngineUpdateArguments,
        _: Ratio,
    ) -> Box<dyn EngineCore> {
        if !arguments.has_starter_air() || !arguments.has_fuel {
            return Box::new(Off::new(self.n2));
        }

        self.since += context.delta();
        self.n2 = Ratio::new::<percent>(calculate_towards_target(
            self.n2.get::<percent>(),
            Engine::IDLE_N2_PERCENT,
            Engine::IDLE_N2_PERCENT / Engine::MINIMUM_SPOOLING_DURATION.as_secs_f64(),
            context.delta(),
        ));

        if self.since >= Engine::MINIMUM_SPOOLING_DURATION {
            Box::new(Idle::new())
        } else {
            self
        }
    }

    fn n2(&self) -> Ratio {
        self.n2
    }

    fn state(&self) -> EngineState {
        EngineState::Spooling
    }
}

struct Idle {
    since: Duration,
}
impl Idle {
    fn new() -> Self {
        Self {
            since: Duration::from_secs(0),
        }
    }
}
impl EngineCore for Idle {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: &EngineUpdateArguments,
        _: Ratio,
    ) -> Box<dyn EngineCore> {
        self.since += context.delta();

        if self.since >= Engine::STABILIZATION_DURATION {
            Box::new(Running::new())
        } else {
            self
        }
    }

    fn n2(&self) -> Ratio {
        Ratio::new::<percent>(Engine::IDLE_N2_PERCENT)
    }

    fn state(&self) -> EngineState {
        EngineState::Idle
    }
}

struct Running {
    n2: Ratio,
}
impl Running {
    fn new() -> Self {
        Self {
            n2: Ratio::new::<percent>(Engine::IDLE_N2_PERCENT),
        }
    }
}
impl EngineCore for Running {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: &EngineUpdateArguments,
        throttle: Ratio,
    ) -> Box<dyn EngineCore> {
        let throttle = throttle.get::<ratio>();
        let target = Engine::IDLE_N2_PERCENT + (100. - Engine::IDLE_N2_PERCENT) * throttle;

        self.n2 = Ratio::new::<percent>(calculate_towards_target(
            self.n2.get::<percent>(),
            target,
            Engine::SPOOL_RATE_PERCENT_PER_SECOND,
            context.delta(),
        ));

        self
    }

    fn n2(&self) -> Ratio {
        self.n2
    }

    fn state(&self) -> EngineState {
        EngineState::Running
    }
}

pub struct Engine {
    number: usize,
    state_id: String,
    n2_id: String,
    oil_temperature_id: String,
    thrust_factor_id: String,
    flameout_id: String,
    throttle_id: String,

    core: Option<Box<dyn EngineCore>>,
    throttle: Ratio,
    inlet_ice: Ratio,
    oil_temperature: ThermodynamicTemperature,
    oil_failure: Failure,
    icing_flameout: DelayedTrueLogicGate,
    flameout: Option<FlameoutCause>,
}
impl Engine {
    pub const IDLE_N2_PERCENT: f64 = 60.;
    pub const MINIMUM_STARTER_AIR_PRESSURE_PSI: f64 = 20.;
    pub const MINIMUM_SPOOLING_DURATION: Duration = Duration::from_secs(30);
    pub const STABILIZATION_DURATION: Duration = Duration::from_secs(5);
    const SPOOL_RATE_PERCENT_PER_SECOND: f64 = 10.;
    const SPOOL_DOWN_RATE_PERCENT_PER_SECOND: f64 = 5.;
    const FLAMEOUT_ICE_THRESHOLD: f64 = 0.6;
    const FLAMEOUT_ICE_DURATION: Duration = Duration::from_secs(10);
    pub const OIL_TEMPERATURE_LIMIT_DEGREES_CELSIUS: f64 = 155.;
    const OIL_FAILED_TEMPERATURE_DEGREES_CELSIUS: f64 = 180.;
    const OIL_TEMPERATURE_RATE: f64 = 2.;
    const ICE_THRUST_LOSS: f64 = 0.3;
    pub const BLEED_AIR_CAPACITY: f64 = 0.5;
    const IDLE_FUEL_FLOW_KG_PER_SECOND: f64 = 0.1;
    const MAXIMUM_FUEL_FLOW_KG_PER_SECOND: f64 = 1.;

    pub fn new(number: usize) -> Self {
        Self {
            number,
            state_id: format!("ENGINE_{}_STATE", number),
            n2_id: format!("ENGINE_{}_N2", number),
            oil_temperature_id: format!("ENGINE_{}_OIL_TEMPERATURE", number),
            thrust_factor_id: format!("ENGINE_{}_THRUST_FACTOR", number),
            flameout_id: format!("ENGINE_{}_FLAMEOUT", number),
            throttle_id: format!("ENGINE_{}_THROTTLE", number),

            core: Some(Box::new(Off::new(Ratio::new::<percent>(0.)))),
            throttle: Ratio::new::<ratio>(0.),
            inlet_ice: Ratio::new::<ratio>(0.),
            oil_temperature: ThermodynamicTemperature::new::<degree_celsius>(15.),
            oil_failure: Failure::new(FailureId::EngineOilSystem(number), RecoveryPolicy::Manual),
            icing_flameout: DelayedTrueLogicGate::new(Engine::FLAMEOUT_ICE_DURATION),
            flameout: None,
        }
    }

    /// Requests an engine start. The start is rejected without changing the engine state
    /// when the bleed duct doesn't provide enough pressure to drive the starter.
    pub fn start(
        &mut self,
        starter_air_pressure: Pressure,
        fire_push_button_released: bool,
    ) -> Result<(), EngineCommandError> {
        let result = if fire_push_button_released {
            Err(EngineCommandError::FirePushButtonReleased(self.number))
        } else if self.state() != EngineState::Off {
            Err(EngineCommandError::AlreadyStarted(self.number))
        } else if starter_air_pressure
            < Pressure::new::<psi>(Engine::MINIMUM_STARTER_AIR_PRESSURE_PSI)
        {
            Err(EngineCommandError::InsufficientBleedAir(self.number))
        } else {
            Ok(())
        };

        match result {
            Ok(()) => {
                self.core = Some(Box::new(Spooling::new(self.n2())));
                self.flameout = None;
                self.icing_flameout.reset();
                self.oil_failure.clear();
                info!("Engine {} start initiated.", self.number);
                Ok(())
            }
            Err(error) => {
                debug!("Rejected start request: {}.", error);
                Err(error)
            }
        }
    }

    pub fn stop(&mut self) {
        if self.state() != EngineState::Off {
            info!("Engine {} shut down.", self.number);
            self.core = Some(Box::new(Off::new(self.n2())));
        }
    }

    pub fn set_throttle(&mut self, throttle: Ratio) {
        self.throttle = Ratio::new::<ratio>(throttle.get::<ratio>().max(0.).min(1.));
    }

    pub fn update(&mut self, context: &UpdateContext, arguments: &EngineUpdateArguments) {
        self.inlet_ice = arguments.inlet_ice;

        if arguments.fire_push_button_released {
            self.stop();
        }

        if let Some(core) = self.core.take() {
            let previous_state = core.state();
            let updated_core = core.update(context, arguments, self.throttle);
            if previous_state != updated_core.state() {
                info!(
                    "Engine {} transitioned from {:?} to {:?}.",
                    self.number,
                    previous_state,
                    updated_core.state()
                );
            }

            self.core = Some(updated_core);
        }

        self.icing_flameout.update(
            context,
            self.state() == EngineState::Running
                && arguments.inlet_ice.get::<ratio>() > Engine::FLAMEOUT_ICE_THRESHOLD,
        );
        self.update_oil_temperature(context);

        if self.state() == EngineState::Running {
            if let Some(cause) = self.flameout_cause(arguments) {
                info!("Engine {} flamed out: {:?}.", self.number, cause);
                self.flameout = Some(cause);
                self.core = Some(Box::new(Off::new(self.n2())));
                self.icing_flameout.reset();
            }
        }
    }

    fn flameout_cause(&self, arguments: &EngineUpdateArguments) -> Option<FlameoutCause> {
        if self.icing_flameout.output() {
            Some(FlameoutCause::Icing)
        } else if self.oil_temperature
            > ThermodynamicTemperature::new::<degree_celsius>(
                Engine::OIL_TEMPERATURE_LIMIT_DEGREES_CELSIUS,
            )
        {
            Some(FlameoutCause::OilTemperature)
        } else if !arguments.has_fuel {
            Some(FlameoutCause::FuelStarvation)
        } else {
            None
        }
    }

    fn update_oil_temperature(&mut self, context: &UpdateContext) {
        let target = if self.oil_failure.is_active() && self.is_producing_power() {
            ThermodynamicTemperature::new::<degree_celsius>(
                Engine::OIL_FAILED_TEMPERATURE_DEGREES_CELSIUS,
            )
        } else if self.is_producing_power() {
            ThermodynamicTemperature::new::<degree_celsius>(
                90. + 30. * self.throttle.get::<ratio>(),
            )
        } else {
            context.ambient_temperature()
        };

        self.oil_temperature = calculate_towards_target_temperature(
            self.oil_temperature,
            target,
            Engine::OIL_TEMPERATURE_RATE,
            context.delta(),
        );
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn state(&self) -> EngineState {
        self.core
            .as_ref()
            .map_or(EngineState::Off, |core| core.state())
    }

    pub fn n2(&self) -> Ratio {
        self.core
            .as_ref()
            .map_or(Ratio::new::<percent>(0.), |core| core.n2())
    }

    pub fn throttle(&self) -> Ratio {
        self.throttle
    }

    pub fn oil_temperature(&self) -> ThermodynamicTemperature {
        self.oil_temperature
    }

    /// Idle and running engines drive their generator, pumps and bleed ports.
    pub fn is_producing_power(&self) -> bool {
        matches!(self.state(), EngineState::Idle | EngineState::Running)
    }

    pub fn is_spooling(&self) -> bool {
        self.state() == EngineState::Spooling
    }

    pub fn flameout(&self) -> Option<FlameoutCause> {
        self.flameout
    }

    /// The fraction of nominal thrust available, reduced by ice accreted on the inlet.
    pub fn thrust_factor(&self) -> Ratio {
        Ratio::new::<ratio>(1. - Engine::ICE_THRUST_LOSS * self.inlet_ice.get::<ratio>().min(1.))
    }

    pub fn fuel_flow(&self) -> MassRate {
        let flow = match self.state() {
            EngineState::Off => 0.,
            EngineState::Spooling => Engine::IDLE_FUEL_FLOW_KG_PER_SECOND / 2.,
            EngineState::Idle => Engine::IDLE_FUEL_FLOW_KG_PER_SECOND,
            EngineState::Running => {
                Engine::IDLE_FUEL_FLOW_KG_PER_SECOND
                    + (Engine::MAXIMUM_FUEL_FLOW_KG_PER_SECOND
                        - Engine::IDLE_FUEL_FLOW_KG_PER_SECOND)
                        * self.throttle.get::<ratio>()
            }
        };

        MassRate::new::<kilogram_per_second>(flow)
    }
}
impl BleedAirSource for Engine {
    fn bleed_air_output(&self) -> Ratio {
        if self.is_producing_power() {
            Ratio::new::<ratio>(Engine::BLEED_AIR_CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }
}
impl Failable for Engine {
    fn failure(&self) -> &Failure {
        &self.oil_failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.oil_failure
    }

    fn failure_exposure(&self) -> f64 {
        if self.is_producing_power() {
            1.
        } else {
            0.
        }
    }
}
impl SimulationElement for Engine {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.oil_failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.state_id, self.state() as u8 as f64);
        writer.write_f64(&self.n2_id, self.n2().get::<percent>());
        writer.write_f64(
            &self.oil_temperature_id,
            self.oil_temperature.get::<degree_celsius>(),
        );
        writer.write_f64(&self.thrust_factor_id, self.thrust_factor().get::<ratio>());
        writer.write_bool(&self.flameout_id, self.flameout.is_some());
        writer.write_f64(&self.throttle_id, self.throttle.get::<ratio>());
    }
}
