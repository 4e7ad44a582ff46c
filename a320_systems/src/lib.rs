use log::trace;
use systems::{
    altimeter::{Altimeter, AltimeterCommandError},
    anti_ice::{AntiIce, AntiIceUpdateArguments, AntiIceZone},
    apu::{ApuCommandError, ApuUpdateArguments, AuxiliaryPowerUnit},
    autoflight::{Autopilot, AutopilotUpdateArguments, ModeRejection},
    brakes::{BrakeCommandError, Brakes},
    electrical::{Battery, ElectricalBus, EmergencyGenerator, EngineGenerator, PowerSource},
    engine::{Engine, EngineCommandError, EngineState, EngineUpdateArguments},
    failures::{Failable, FailureConfiguration, FailureInjector},
    fire::{FireCommandError, FireProtection, FireUpdateArguments, FireZoneId},
    flight_controls::{FlightControls, FlightControlsCommandError},
    fuel::{FuelSystem, FuelUpdateArguments},
    hydraulic::{HydraulicPump, HydraulicSystem, HydraulicUpdateArguments, PumpKind},
    landing_gear::{LandingGear, LandingGearCommandError},
    navigation::{FlightPlan, FlightPlanError},
    overhead::{AutoOffPushButton, OnOffPushButton},
    pneumatic::{BleedDemand, BleedManifold},
    pressurization::Pressurization,
    shared::{topological_order, DependencyCycle},
    simulation::{
        Aircraft, SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext,
    },
    tcas::TrafficCollisionAvoidance,
    warning::{WarningAggregator, Warnings},
};
use thiserror::Error;
use uom::si::{
    f64::*, length::foot, mass::kilogram, ratio::ratio, velocity::foot_per_minute,
    velocity::knot,
};

mod commands;
mod power_consumption;
mod warnings;
use power_consumption::A320PowerConsumption;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct A320Configuration {
    pub failures: FailureConfiguration,
    pub initial_fuel_per_tank: Mass,
}
impl Default for A320Configuration {
    fn default() -> Self {
        Self {
            failures: FailureConfiguration::default(),
            initial_fuel_per_tank: Mass::new::<kilogram>(5000.),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum A320CommandError {
    #[error("there is no engine {0}")]
    UnknownEngine(usize),
    #[error(transparent)]
    Engine(#[from] EngineCommandError),
    #[error(transparent)]
    Apu(#[from] ApuCommandError),
    #[error(transparent)]
    FlightPlan(#[from] FlightPlanError),
    #[error(transparent)]
    Mode(#[from] ModeRejection),
    #[error(transparent)]
    Fire(#[from] FireCommandError),
    #[error(transparent)]
    Brakes(#[from] BrakeCommandError),
    #[error(transparent)]
    LandingGear(#[from] LandingGearCommandError),
    #[error(transparent)]
    FlightControls(#[from] FlightControlsCommandError),
    #[error(transparent)]
    Altimeter(#[from] AltimeterCommandError),
}

/// The kinds of systems the A320 updates. Each kind is updated after all of
/// the kinds it depends on within the same tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum A320SystemKind {
    Failures,
    Engines,
    Apu,
    Generators,
    EmergencyGenerator,
    Battery,
    ElectricalBus,
    BleedManifold,
    Hydraulic,
    Pressurization,
    AntiIce,
    Fuel,
    Brakes,
    Fire,
    FlightPlan,
    Autopilot,
    FlightControls,
    LandingGear,
    Altimeter,
    Tcas,
}
impl A320SystemKind {
    const ALL: [A320SystemKind; 20] = [
        A320SystemKind::Failures,
        A320SystemKind::Engines,
        A320SystemKind::Apu,
        A320SystemKind::Generators,
        A320SystemKind::EmergencyGenerator,
        A320SystemKind::Battery,
        A320SystemKind::ElectricalBus,
        A320SystemKind::BleedManifold,
        A320SystemKind::Hydraulic,
        A320SystemKind::Pressurization,
        A320SystemKind::AntiIce,
        A320SystemKind::Fuel,
        A320SystemKind::Brakes,
        A320SystemKind::Fire,
        A320SystemKind::FlightPlan,
        A320SystemKind::Autopilot,
        A320SystemKind::FlightControls,
        A320SystemKind::LandingGear,
        A320SystemKind::Altimeter,
        A320SystemKind::Tcas,
    ];

    /// Values read from kinds which are not listed here are those of the previous tick.
    fn dependencies(self) -> Vec<A320SystemKind> {
        match self {
            A320SystemKind::Failures => vec![],
            A320SystemKind::Engines => vec![A320SystemKind::Failures],
            A320SystemKind::Apu => vec![A320SystemKind::Failures],
            A320SystemKind::Generators => vec![A320SystemKind::Engines, A320SystemKind::Apu],
            A320SystemKind::EmergencyGenerator => vec![A320SystemKind::Generators],
            A320SystemKind::Battery => vec![
                A320SystemKind::Generators,
                A320SystemKind::EmergencyGenerator,
            ],
            A320SystemKind::ElectricalBus => vec![
                A320SystemKind::Generators,
                A320SystemKind::EmergencyGenerator,
                A320SystemKind::Battery,
            ],
            A320SystemKind::BleedManifold => vec![A320SystemKind::Engines, A320SystemKind::Apu],
            A320SystemKind::Hydraulic => vec![
                A320SystemKind::Engines,
                A320SystemKind::ElectricalBus,
                A320SystemKind::EmergencyGenerator,
            ],
            A320SystemKind::Pressurization => vec![A320SystemKind::BleedManifold],
            A320SystemKind::AntiIce => vec![A320SystemKind::BleedManifold],
            A320SystemKind::Fuel => vec![A320SystemKind::Engines, A320SystemKind::Apu],
            A320SystemKind::Brakes => vec![A320SystemKind::Hydraulic],
            A320SystemKind::Fire => vec![
                A320SystemKind::ElectricalBus,
                A320SystemKind::Engines,
                A320SystemKind::Apu,
            ],
            A320SystemKind::FlightPlan => vec![A320SystemKind::Failures],
            A320SystemKind::Autopilot => vec![
                A320SystemKind::Hydraulic,
                A320SystemKind::FlightPlan,
            ],
            A320SystemKind::FlightControls => vec![A320SystemKind::Hydraulic],
            A320SystemKind::LandingGear => vec![
                A320SystemKind::Hydraulic,
                A320SystemKind::FlightControls,
            ],
            A320SystemKind::Altimeter => vec![],
            A320SystemKind::Tcas => vec![],
        }
    }
}

/// The state of the aircraft as reported by the flight dynamics engine during the last tick.
struct FlightState {
    indicated_airspeed: Velocity,
    altitude_above_ground: Length,
    vertical_speed: Velocity,
    on_ground: bool,
}
impl FlightState {
    fn new() -> Self {
        Self {
            indicated_airspeed: Velocity::new::<knot>(0.),
            altitude_above_ground: Length::new::<foot>(0.),
            vertical_speed: Velocity::new::<foot_per_minute>(0.),
            on_ground: true,
        }
    }

    fn update(&mut self, context: &UpdateContext) {
        self.indicated_airspeed = context.indicated_airspeed();
        self.altitude_above_ground = context.altitude_above_ground();
        self.vertical_speed = context.vertical_speed();
        self.on_ground = context.is_on_ground();
    }
}

pub struct A320 {
    update_order: Vec<A320SystemKind>,
    flight_state: FlightState,
    failure_injector: FailureInjector,

    engines: [Engine; 2],
    engine_generators: [EngineGenerator; 2],
    apu: AuxiliaryPowerUnit,
    apu_bleed_push_button: OnOffPushButton,
    emergency_generator: EmergencyGenerator,
    battery: Battery,
    electrical_bus: ElectricalBus,
    power_consumption: A320PowerConsumption,

    bleed_manifold: BleedManifold,
    packs_push_button: OnOffPushButton,
    hydraulic: HydraulicSystem,
    electric_pump_push_button: AutoOffPushButton,
    pressurization: Pressurization,
    wing_anti_ice_push_button: OnOffPushButton,
    engine_anti_ice_push_buttons: [OnOffPushButton; 2],
    anti_ice: AntiIce,
    fuel: FuelSystem,

    brakes: Brakes,
    fire: FireProtection,

    flight_plan: FlightPlan,
    autopilot: Autopilot,

    flight_controls: FlightControls,
    landing_gear: LandingGear,
    altimeter: Altimeter,
    tcas: TrafficCollisionAvoidance,
}
impl A320 {
    pub fn new(configuration: &A320Configuration) -> Result<A320, DependencyCycle> {
        let update_order =
            topological_order(&A320SystemKind::ALL, A320SystemKind::dependencies)?;
        trace!("A320 update order: {:?}.", update_order);

        Ok(A320 {
            update_order,
            flight_state: FlightState::new(),
            failure_injector: FailureInjector::new(&configuration.failures),

            engines: [Engine::new(1), Engine::new(2)],
            engine_generators: [
                EngineGenerator::new(1, configuration.failures.generator_recovery),
                EngineGenerator::new(2, configuration.failures.generator_recovery),
            ],
            apu: AuxiliaryPowerUnit::new(configuration.failures.generator_recovery),
            apu_bleed_push_button: OnOffPushButton::new_off("APU_BLEED"),
            emergency_generator: EmergencyGenerator::new(),
            battery: Battery::full(),
            electrical_bus: ElectricalBus::new("MAIN"),
            power_consumption: A320PowerConsumption::new(),

            bleed_manifold: BleedManifold::new(),
            packs_push_button: OnOffPushButton::new_on("PACKS"),
            hydraulic: HydraulicSystem::new(configuration.failures.pump_recovery),
            electric_pump_push_button: AutoOffPushButton::new_auto("HYD_ELEC_PUMP"),
            pressurization: Pressurization::new(),
            wing_anti_ice_push_button: OnOffPushButton::new_off("ANTI_ICE_WING"),
            engine_anti_ice_push_buttons: [
                OnOffPushButton::new_off("ANTI_ICE_ENG_1"),
                OnOffPushButton::new_off("ANTI_ICE_ENG_2"),
            ],
            anti_ice: AntiIce::new(),
            fuel: FuelSystem::new(configuration.initial_fuel_per_tank),

            brakes: Brakes::new(),
            fire: FireProtection::new(),

            flight_plan: FlightPlan::new(),
            autopilot: Autopilot::new(),

            flight_controls: FlightControls::new(),
            landing_gear: LandingGear::new_down(),
            altimeter: Altimeter::new(),
            tcas: TrafficCollisionAvoidance::new(),
        })
    }

    fn engine_index(number: usize) -> Result<usize, A320CommandError> {
        if (1..=2).contains(&number) {
            Ok(number - 1)
        } else {
            Err(A320CommandError::UnknownEngine(number))
        }
    }

    pub fn update_order(&self) -> &[A320SystemKind] {
        &self.update_order
    }

    fn update_system(&mut self, kind: A320SystemKind, context: &UpdateContext) {
        trace!("Updating {:?}.", kind);

        match kind {
            A320SystemKind::Failures => self.update_failures(context),
            A320SystemKind::Engines => {
                let starter_air_pressure = self.bleed_manifold.duct_pressure();
                for engine in self.engines.iter_mut() {
                    let number = engine.number();
                    engine.update(
                        context,
                        &EngineUpdateArguments::new(
                            starter_air_pressure,
                            self.anti_ice.engine_inlet_ice(number),
                            self.fuel.has_fuel_for_engine(number),
                            self.fire.is_push_button_released(FireZoneId::Engine(number)),
                        ),
                    );
                }
            }
            A320SystemKind::Apu => self.apu.update(
                context,
                &ApuUpdateArguments::new(
                    self.apu_bleed_push_button.is_on(),
                    self.fuel.has_fuel_for_apu(),
                    self.fire.is_push_button_released(FireZoneId::Apu),
                ),
            ),
            A320SystemKind::Generators => {
                for (generator, engine) in self
                    .engine_generators
                    .iter_mut()
                    .zip(self.engines.iter())
                {
                    generator.update(context, engine.n2());
                }
            }
            A320SystemKind::EmergencyGenerator => self.emergency_generator.update(
                context,
                &[
                    &self.engine_generators[0],
                    &self.engine_generators[1],
                    self.apu.generator(),
                ],
            ),
            A320SystemKind::Battery => {
                let any_engine_running =
                    self.engines.iter().any(|engine| engine.is_producing_power());
                self.power_consumption.update(context, any_engine_running);
                let generator_capacity = self.generator_capacity();
                self.battery
                    .update(context, generator_capacity, self.power_consumption.load());
            }
            A320SystemKind::ElectricalBus => {
                let emergency_configuration =
                    self.emergency_generator.is_deployed() && !self.any_main_generator_supplying();
                self.electrical_bus.update(
                    &[
                        &self.engine_generators[0],
                        &self.engine_generators[1],
                        self.apu.generator(),
                        &self.emergency_generator,
                        &self.battery,
                    ],
                    self.power_consumption.load(),
                    emergency_configuration,
                );
            }
            A320SystemKind::BleedManifold => {
                let demand = self.bleed_demand();
                self.bleed_manifold
                    .update(&[&self.engines[0], &self.engines[1], &self.apu], &demand);
            }
            A320SystemKind::Hydraulic => {
                let demand = self.hydraulic_demand();
                self.hydraulic.update(
                    context,
                    &HydraulicUpdateArguments::new(
                        [
                            self.engines[0].is_producing_power(),
                            self.engines[1].is_producing_power(),
                        ],
                        self.electrical_bus.capacity(),
                        self.electric_pump_push_button.is_auto(),
                        self.emergency_generator.is_deployed(),
                        demand,
                    ),
                );
            }
            A320SystemKind::Pressurization => {
                let supply_ratio = if self.packs_push_button.is_on() {
                    self.bleed_manifold.supply_ratio()
                } else {
                    Ratio::new::<ratio>(0.)
                };
                self.pressurization.update(context, supply_ratio);
            }
            A320SystemKind::AntiIce => self.anti_ice.update(
                context,
                &AntiIceUpdateArguments::new(
                    self.wing_anti_ice_push_button.is_on(),
                    [
                        self.engine_anti_ice_push_buttons[0].is_on(),
                        self.engine_anti_ice_push_buttons[1].is_on(),
                    ],
                    self.bleed_manifold.supply_ratio(),
                ),
            ),
            A320SystemKind::Fuel => self.fuel.update(
                context,
                &FuelUpdateArguments::new(
                    [self.engines[0].fuel_flow(), self.engines[1].fuel_flow()],
                    self.apu.fuel_flow(),
                ),
            ),
            A320SystemKind::Brakes => self.brakes.update(context, self.hydraulic.authority()),
            A320SystemKind::Fire => self.fire.update(&FireUpdateArguments::new(
                self.electrical_bus.is_powered(),
                [
                    self.engines[0].state() != EngineState::Off,
                    self.engines[1].state() != EngineState::Off,
                ],
                self.apu.is_running_or_starting(),
            )),
            A320SystemKind::FlightPlan => self.flight_plan.update(context),
            A320SystemKind::Autopilot => self.autopilot.update(
                context,
                &AutopilotUpdateArguments::new(
                    self.hydraulic.authority(),
                    self.flight_plan.guidance(),
                    self.flight_plan.vertical_constraint(),
                ),
            ),
            A320SystemKind::FlightControls => self
                .flight_controls
                .update(context, self.hydraulic.authority()),
            A320SystemKind::LandingGear => self.landing_gear.update(
                context,
                self.hydraulic.authority(),
                self.flight_controls.scheduled_gear_down(),
            ),
            A320SystemKind::Altimeter => self.altimeter.update(context),
            A320SystemKind::Tcas => self.tcas.update(context),
        }
    }

    fn update_failures(&mut self, context: &UpdateContext) {
        let mut elements: Vec<&mut dyn Failable> = Vec::new();
        for generator in self.engine_generators.iter_mut() {
            elements.push(generator);
        }
        elements.push(self.apu.generator_mut());
        elements.push(&mut self.battery);
        for engine in self.engines.iter_mut() {
            elements.push(engine);
        }
        for pump in self.hydraulic.pumps_mut() {
            elements.push(pump);
        }
        for zone in self.anti_ice.zones_mut() {
            elements.push(zone);
        }
        for zone in self.fire.zones_mut() {
            elements.push(zone);
        }

        self.failure_injector.update(context, &mut elements);
    }

    fn generator_capacity(&self) -> Ratio {
        let sources: [&dyn PowerSource; 4] = [
            &self.engine_generators[0],
            &self.engine_generators[1],
            self.apu.generator(),
            &self.emergency_generator,
        ];

        sources
            .iter()
            .fold(Ratio::new::<ratio>(0.), |total, source| total + source.output())
    }

    fn any_main_generator_supplying(&self) -> bool {
        self.engine_generators
            .iter()
            .any(|generator| generator.is_supplying())
            || self.apu.generator().is_supplying()
    }

    fn bleed_demand(&self) -> BleedDemand {
        BleedDemand {
            packs: self.packs_push_button.is_on(),
            wing_anti_ice: self.wing_anti_ice_push_button.is_on(),
            engine_anti_ice: self
                .engine_anti_ice_push_buttons
                .iter()
                .filter(|push_button| push_button.is_on())
                .count(),
            engine_starts: self
                .engines
                .iter()
                .filter(|engine| engine.is_spooling())
                .count(),
        }
    }

    /// Brake usage and autopilot surface activity of the previous tick.
    fn hydraulic_demand(&self) -> Ratio {
        let demand = self.brakes.hydraulic_demand().get::<ratio>()
            + self.autopilot.aileron_command().abs()
            + self.autopilot.elevator_command().abs();

        Ratio::new::<ratio>(demand.min(1.))
    }

    /// Fault lights show the state of the system behind each push button.
    fn update_push_button_faults(&mut self) {
        self.wing_anti_ice_push_button.set_fault(
            self.anti_ice
                .zone(AntiIceZone::Wing)
                .map_or(false, |zone| zone.is_valve_failed()),
        );
        for (index, push_button) in self.engine_anti_ice_push_buttons.iter_mut().enumerate() {
            push_button.set_fault(
                self.anti_ice
                    .zone(AntiIceZone::EngineInlet(index + 1))
                    .map_or(false, |zone| zone.is_valve_failed()),
            );
        }
        self.electric_pump_push_button.set_fault(
            self.hydraulic
                .pump(PumpKind::Electric)
                .map_or(false, HydraulicPump::is_failed),
        );
    }

    /// The throttle goes to the flight dynamics engine at the end of the tick.
    fn apply_autothrottle(&mut self) {
        if self.autopilot.autothrottle().is_engaged() {
            let throttle = self.autopilot.autothrottle().throttle();
            for engine in self.engines.iter_mut() {
                engine.set_throttle(throttle);
            }
        }
    }


    pub fn engine(&self, number: usize) -> Option<&Engine> {
        A320::engine_index(number)
            .ok()
            .map(|index| &self.engines[index])
    }

    pub fn engine_generator(&self, number: usize) -> Option<&EngineGenerator> {
        A320::engine_index(number)
            .ok()
            .map(|index| &self.engine_generators[index])
    }

    pub fn apu(&self) -> &AuxiliaryPowerUnit {
        &self.apu
    }

    pub fn emergency_generator(&self) -> &EmergencyGenerator {
        &self.emergency_generator
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn electrical_bus(&self) -> &ElectricalBus {
        &self.electrical_bus
    }

    pub fn bleed_manifold(&self) -> &BleedManifold {
        &self.bleed_manifold
    }

    pub fn hydraulic(&self) -> &HydraulicSystem {
        &self.hydraulic
    }

    pub fn pressurization(&self) -> &Pressurization {
        &self.pressurization
    }

    pub fn anti_ice(&self) -> &AntiIce {
        &self.anti_ice
    }

    pub fn fuel(&self) -> &FuelSystem {
        &self.fuel
    }

    pub fn brakes(&self) -> &Brakes {
        &self.brakes
    }

    pub fn fire(&self) -> &FireProtection {
        &self.fire
    }

    pub fn flight_plan(&self) -> &FlightPlan {
        &self.flight_plan
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.autopilot
    }

    pub fn flight_controls(&self) -> &FlightControls {
        &self.flight_controls
    }

    pub fn landing_gear(&self) -> &LandingGear {
        &self.landing_gear
    }

    pub fn altimeter(&self) -> &Altimeter {
        &self.altimeter
    }

    pub fn tcas(&self) -> &TrafficCollisionAvoidance {
        &self.tcas
    }

    pub fn wing_anti_ice_push_button(&self) -> &OnOffPushButton {
        &self.wing_anti_ice_push_button
    }

    pub fn engine_anti_ice_push_button(&self, number: usize) -> Option<&OnOffPushButton> {
        A320::engine_index(number)
            .ok()
            .map(|index| &self.engine_anti_ice_push_buttons[index])
    }

    pub fn electric_pump_push_button(&self) -> &AutoOffPushButton {
        &self.electric_pump_push_button
    }

    pub fn failure_injector(&self) -> &FailureInjector {
        &self.failure_injector
    }

    pub fn warnings(&self) -> Warnings {
        WarningAggregator::compute(self)
    }
}
impl Aircraft for A320 {
    fn update(&mut self, context: &UpdateContext) {
        self.flight_state.update(context);

        for index in 0..self.update_order.len() {
            let kind = self.update_order[index];
            self.update_system(kind, context);
        }

        self.update_push_button_faults();
        self.apply_autothrottle();
    }
}
impl SimulationElement for A320 {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.failure_injector.accept(visitor);
        for engine in self.engines.iter_mut() {
            engine.accept(visitor);
        }
        for generator in self.engine_generators.iter_mut() {
            generator.accept(visitor);
        }
        self.apu.accept(visitor);
        self.apu_bleed_push_button.accept(visitor);
        self.emergency_generator.accept(visitor);
        self.battery.accept(visitor);
        self.electrical_bus.accept(visitor);
        self.power_consumption.accept(visitor);
        self.bleed_manifold.accept(visitor);
        self.packs_push_button.accept(visitor);
        self.hydraulic.accept(visitor);
        self.electric_pump_push_button.accept(visitor);
        self.pressurization.accept(visitor);
        self.wing_anti_ice_push_button.accept(visitor);
        for push_button in self.engine_anti_ice_push_buttons.iter_mut() {
            push_button.accept(visitor);
        }
        self.anti_ice.accept(visitor);
        self.fuel.accept(visitor);
        self.brakes.accept(visitor);
        self.fire.accept(visitor);
        self.flight_plan.accept(visitor);
        self.autopilot.accept(visitor);
        self.flight_controls.accept(visitor);
        self.landing_gear.accept(visitor);
        self.altimeter.accept(visitor);
        self.tcas.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        let warnings = self.warnings();
        writer.write_bool("WARNING_MASTER_WARNING", warnings.master_warning());
        writer.write_bool("WARNING_MASTER_CAUTION", warnings.master_caution());
        writer.write_f64("WARNING_ACTIVE_COUNT", warnings.active().len() as f64);
    }
}
