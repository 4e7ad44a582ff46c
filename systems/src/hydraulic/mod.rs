//! Hydraulic pressure generation. Pumps are gated by the availability of whatever drives
//! them. The resulting pressure determines the authority of the flight controls and brakes.
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use uom::si::{f64::*, pressure::psi, ratio::ratio};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PumpKind {
    EngineDriven(usize),
    Electric,
    Rat,
}
impl PumpKind {
    fn rated_output(&self) -> f64 {
        match self {
            PumpKind::EngineDriven(_) => 1.,
            PumpKind::Electric => 0.8,
            PumpKind::Rat => 0.6,
        }
    }

    fn failure_id(&self) -> FailureId {
        match self {
            PumpKind::EngineDriven(number) => FailureId::HydraulicPump(*number),
            PumpKind::Electric => FailureId::HydraulicPump(3),
            PumpKind::Rat => FailureId::HydraulicPump(4),
        }
    }

    fn name(&self) -> String {
        match self {
            PumpKind::EngineDriven(number) => format!("EDP_{}", number),
            PumpKind::Electric => "ELEC".to_owned(),
            PumpKind::Rat => "RAT".to_owned(),
        }
    }
}

pub trait PressureSource {
    fn output(&self) -> Ratio;
}

pub struct HydraulicPump {
    output_id: String,
    kind: PumpKind,
    driven: bool,
    demand: Ratio,
    failure: Failure,
}
impl HydraulicPump {
    pub fn new(kind: PumpKind, recovery: RecoveryPolicy) -> Self {
        Self {
            output_id: format!("HYD_{}_PUMP_OUTPUT", kind.name()),
            kind,
            driven: false,
            demand: Ratio::new::<ratio>(0.),
            failure: Failure::new(kind.failure_id(), recovery),
        }
    }

    /// Updates whether the pump's drive (engine, electrical bus or ram air turbine)
    /// is available and how much is being asked of the system.
    fn update(&mut self, driven: bool, demand: Ratio) {
        self.driven = driven;
        self.demand = demand;
    }

    pub fn kind(&self) -> PumpKind {
        self.kind
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_active()
    }
}
impl PressureSource for HydraulicPump {
    fn output(&self) -> Ratio {
        if self.driven && !self.failure.is_active() {
            Ratio::new::<ratio>(self.kind.rated_output())
        } else {
            Ratio::new::<ratio>(0.)
        }
    }
}
impl Failable for HydraulicPump {
    fn failure(&self) -> &Failure {
        &self.failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.failure
    }

    /// Pumps working against a high demand wear faster.
    fn failure_exposure(&self) -> f64 {
        if self.driven {
            1. + 2. * self.demand.get::<ratio>().max(0.).min(1.)
        } else {
            0.
        }
    }
}
impl SimulationElement for HydraulicPump {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.output_id, self.output().get::<ratio>());
    }
}

pub struct HydraulicUpdateArguments {
    engine_driving_pump: [bool; 2],
    electrical_capacity: Ratio,
    electric_pump_push_button_is_on: bool,
    rat_deployed: bool,
    demand: Ratio,
}
impl HydraulicUpdateArguments {
    pub fn new(
        engine_driving_pump: [bool; 2],
        electrical_capacity: Ratio,
        electric_pump_push_button_is_on: bool,
        rat_deployed: bool,
        demand: Ratio,
    ) -> Self {
        Self {
            engine_driving_pump,
            electrical_capacity,
            electric_pump_push_button_is_on,
            rat_deployed,
            demand,
        }
    }
}

pub struct HydraulicSystem {
    engine_driven_pumps: [HydraulicPump; 2],
    electric_pump: HydraulicPump,
    rat_pump: HydraulicPump,
    pressure: Pressure,
}
impl HydraulicSystem {
    pub const NOMINAL_PRESSURE_PSI: f64 = 3000.;
    const PRESSURE_PER_PUMP_OUTPUT_PSI: f64 = 1500.;
    const ELECTRIC_PUMP_MINIMUM_CAPACITY: f64 = 0.3;
    pub const LOW_PRESSURE_PSI: f64 = 1450.;

    pub fn new(pump_recovery: RecoveryPolicy) -> Self {
        Self {
            engine_driven_pumps: [
                HydraulicPump::new(PumpKind::EngineDriven(1), pump_recovery),
                HydraulicPump::new(PumpKind::EngineDriven(2), pump_recovery),
            ],
            electric_pump: HydraulicPump::new(PumpKind::Electric, pump_recovery),
            rat_pump: HydraulicPump::new(PumpKind::Rat, pump_recovery),
            pressure: Pressure::new::<psi>(0.),
        }
    }

    pub fn update(&mut self, _: &UpdateContext, arguments: &HydraulicUpdateArguments) {
        for (pump, driven) in self
            .engine_driven_pumps
            .iter_mut()
            .zip(arguments.engine_driving_pump.iter())
        {
            pump.update(*driven, arguments.demand);
        }

        self.electric_pump.update(
            arguments.electric_pump_push_button_is_on
                && arguments.electrical_capacity
                    >= Ratio::new::<ratio>(HydraulicSystem::ELECTRIC_PUMP_MINIMUM_CAPACITY),
            arguments.demand,
        );
        self.rat_pump.update(arguments.rat_deployed, arguments.demand);

        self.pressure = Self::pressure_for(self.total_pump_output());
    }

    /// Pressure builds instantly and is proportional to the pump output, limited to nominal.
    fn pressure_for(pump_output: Ratio) -> Pressure {
        Pressure::new::<psi>(
            (pump_output.get::<ratio>() * HydraulicSystem::PRESSURE_PER_PUMP_OUTPUT_PSI)
                .max(0.)
                .min(HydraulicSystem::NOMINAL_PRESSURE_PSI),
        )
    }

    pub fn total_pump_output(&self) -> Ratio {
        self.pumps().map(|pump| pump.output()).fold(
            Ratio::new::<ratio>(0.),
            |total, output| total + output,
        )
    }

    pub fn pressure(&self) -> Pressure {
        self.pressure
    }

    /// The fraction of nominal pressure available to actuators.
    pub fn authority(&self) -> Ratio {
        Ratio::new::<ratio>(
            (self.pressure.get::<psi>() / HydraulicSystem::NOMINAL_PRESSURE_PSI)
                .max(0.)
                .min(1.),
        )
    }

    pub fn is_pressure_low(&self) -> bool {
        self.pressure < Pressure::new::<psi>(HydraulicSystem::LOW_PRESSURE_PSI)
    }

    pub fn pumps(&self) -> impl Iterator<Item = &HydraulicPump> {
        self.engine_driven_pumps
            .iter()
            .chain(std::iter::once(&self.electric_pump))
            .chain(std::iter::once(&self.rat_pump))
    }

    pub fn pump(&self, kind: PumpKind) -> Option<&HydraulicPump> {
        self.pumps().find(|pump| pump.kind() == kind)
    }

    pub fn pumps_mut(&mut self) -> impl Iterator<Item = &mut HydraulicPump> {
        self.engine_driven_pumps
            .iter_mut()
            .chain(std::iter::once(&mut self.electric_pump))
            .chain(std::iter::once(&mut self.rat_pump))
    }
}
impl SimulationElement for HydraulicSystem {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        for pump in self.pumps_mut() {
            pump.accept(visitor);
        }

        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("HYD_PRESSURE", self.pressure.get::<psi>());
        writer.write_f64("HYD_AUTHORITY", self.authority().get::<ratio>());
        writer.write_bool("HYD_LOW_PRESSURE", self.is_pressure_low());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;
    use ntest::assert_about_eq;
    use std::time::Duration;

    fn system() -> HydraulicSystem {
        HydraulicSystem::new(RecoveryPolicy::Timed(Duration::from_secs(60)))
    }

    fn arguments(
        engines: [bool; 2],
        capacity: f64,
        rat_deployed: bool,
    ) -> HydraulicUpdateArguments {
        HydraulicUpdateArguments::new(
            engines,
            Ratio::new::<ratio>(capacity),
            true,
            rat_deployed,
            Ratio::new::<ratio>(0.),
        )
    }

    fn run(system: &mut HydraulicSystem, arguments: &HydraulicUpdateArguments) {
        let mut test_bed = SimulationTestBed::new();
        test_bed.run(system, |system, context| system.update(context, arguments));
    }

    #[test]
    fn without_drives_there_is_no_pressure() {
        let mut system = system();
        run(&mut system, &arguments([false, false], 0., false));

        assert_about_eq!(system.pressure().get::<psi>(), 0.);
        assert_about_eq!(system.authority().get::<ratio>(), 0.);
        assert!(system.is_pressure_low());
    }

    #[test]
    fn both_engines_provide_nominal_pressure() {
        let mut system = system();
        run(&mut system, &arguments([true, true], 0., false));

        assert_about_eq!(system.pressure().get::<psi>(), 3000.);
        assert_about_eq!(system.authority().get::<ratio>(), 1.);
    }

    #[test]
    fn pressure_never_exceeds_nominal() {
        let mut system = system();
        run(&mut system, &arguments([true, true], 1., true));

        assert_about_eq!(system.pressure().get::<psi>(), 3000.);
    }

    #[test]
    fn electric_pump_requires_sufficient_electrical_capacity() {
        let mut system = system();
        run(&mut system, &arguments([false, false], 0.2, false));
        assert_about_eq!(system.pressure().get::<psi>(), 0.);

        run(&mut system, &arguments([false, false], 0.5, false));
        assert_about_eq!(system.pressure().get::<psi>(), 1200.);
    }

    #[test]
    fn rat_pump_provides_reduced_pressure() {
        let mut system = system();
        run(&mut system, &arguments([false, false], 0., true));

        assert_about_eq!(system.authority().get::<ratio>(), 0.3);
    }

    #[test]
    fn failed_pump_provides_no_output() {
        let mut system = system();
        if let Some(pump) = system.pumps_mut().next() {
            pump.failure_mut().activate();
        }
        run(&mut system, &arguments([true, false], 0., false));

        assert_about_eq!(system.pressure().get::<psi>(), 0.);
    }

    #[test]
    fn pump_is_found_by_kind() {
        let mut system = system();
        system.electric_pump.failure_mut().activate();

        assert!(system
            .pump(PumpKind::Electric)
            .map_or(false, HydraulicPump::is_failed));
        assert!(!system
            .pump(PumpKind::EngineDriven(1))
            .map_or(true, HydraulicPump::is_failed));
        assert!(system.pump(PumpKind::EngineDriven(3)).is_none());
    }

    #[test]
    fn authority_is_bounded_and_monotonic_in_pump_output() {
        let mut previous = 0.;
        for output in (0..=40).map(|step| step as f64 * 0.1) {
            let authority = Ratio::new::<ratio>(
                HydraulicSystem::pressure_for(Ratio::new::<ratio>(output)).get::<psi>()
                    / HydraulicSystem::NOMINAL_PRESSURE_PSI,
            )
            .get::<ratio>();

            assert!((0. ..=1.).contains(&authority));
            assert!(authority >= previous);
            previous = authority;
        }
    }

    #[test]
    fn demand_raises_failure_exposure() {
        let mut pump = HydraulicPump::new(PumpKind::Electric, RecoveryPolicy::Manual);
        pump.update(true, Ratio::new::<ratio>(0.));
        let low = pump.failure_exposure();

        pump.update(true, Ratio::new::<ratio>(1.));

        assert!(pump.failure_exposure() > low);
    }

    #[test]
    fn writes_its_state() {
        let mut system = system();
        run(&mut system, &arguments([true, false], 0., false));

        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut system);

        assert!(test_bed.contains_f64("HYD_PRESSURE", 1500.));
        assert!(test_bed.contains_f64("HYD_AUTHORITY", 0.5));
        assert!(test_bed.contains_f64("HYD_EDP_1_PUMP_OUTPUT", 1.));
        assert!(test_bed.contains_bool("FAILURE_HYD_PUMP_3", false));
    }
}
