//! Ice accretion on the wings and engine inlets, and the bleed air heated anti-ice
//! which counters it.
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use uom::si::{
    f64::*, ratio::ratio, thermodynamic_temperature::degree_celsius, velocity::knot,
};

/// The rate, in ice fraction per second, at which ice accretes on an unprotected surface
/// in the given conditions.
pub fn icing_rate(context: &UpdateContext) -> f64 {
    const MAXIMUM_RATE_PER_SECOND: f64 = 0.01;

    icing_severity(context.ambient_temperature())
        * context.precipitation_rate().get::<ratio>()
        * MAXIMUM_RATE_PER_SECOND
}

/// Icing is most severe around -10 °C and absent outside of -40 °C to 5 °C.
fn icing_severity(temperature: ThermodynamicTemperature) -> f64 {
    let celsius = temperature.get::<degree_celsius>();
    if celsius <= -40. || celsius >= 5. {
        0.
    } else {
        (1. - (celsius + 10.).abs() / 25.).max(0.)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AntiIceZone {
    Wing,
    EngineInlet(usize),
}

pub struct IceProtectedZone {
    ice_id: String,
    ice: Ratio,
    effectiveness: Ratio,
    in_icing_conditions: bool,
    valve_failure: Failure,
}
impl IceProtectedZone {
    const PROTECTION_EFFICIENCY: f64 = 0.9;
    const SHED_RATE_PER_SECOND: f64 = 0.02;

    fn new(name: &str, failure_id: FailureId) -> Self {
        Self {
            ice_id: format!("ICE_{}", name),
            ice: Ratio::new::<ratio>(0.),
            effectiveness: Ratio::new::<ratio>(0.),
            in_icing_conditions: false,
            valve_failure: Failure::new(failure_id, RecoveryPolicy::Manual),
        }
    }

    fn update(&mut self, context: &UpdateContext, anti_ice_on: bool, supply_ratio: Ratio) {
        let seconds = context.delta_as_secs_f64();
        let rate = icing_rate(context);
        let effectiveness = if anti_ice_on && !self.valve_failure.is_active() {
            supply_ratio.get::<ratio>().max(0.).min(1.)
        } else {
            0.
        };

        let accreted =
            rate * (1. - IceProtectedZone::PROTECTION_EFFICIENCY * effectiveness) * seconds;
        let shed = IceProtectedZone::SHED_RATE_PER_SECOND * effectiveness * seconds;

        self.ice = Ratio::new::<ratio>((self.ice.get::<ratio>() + accreted - shed).max(0.).min(1.));
        self.effectiveness = Ratio::new::<ratio>(effectiveness);
        self.in_icing_conditions = rate > 0.;
    }

    pub fn ice(&self) -> Ratio {
        self.ice
    }

    pub fn effectiveness(&self) -> Ratio {
        self.effectiveness
    }

    pub fn is_valve_failed(&self) -> bool {
        self.valve_failure.is_active()
    }
}
impl Failable for IceProtectedZone {
    fn failure(&self) -> &Failure {
        &self.valve_failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.valve_failure
    }

    fn failure_exposure(&self) -> f64 {
        if self.in_icing_conditions {
            2.
        } else {
            1.
        }
    }
}
impl SimulationElement for IceProtectedZone {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.valve_failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.ice_id, self.ice.get::<ratio>());
    }
}

pub struct AntiIceUpdateArguments {
    wing_anti_ice_on: bool,
    engine_anti_ice_on: [bool; 2],
    supply_ratio: Ratio,
}
impl AntiIceUpdateArguments {
    pub fn new(wing_anti_ice_on: bool, engine_anti_ice_on: [bool; 2], supply_ratio: Ratio) -> Self {
        Self {
            wing_anti_ice_on,
            engine_anti_ice_on,
            supply_ratio,
        }
    }
}

pub struct AntiIce {
    wing: IceProtectedZone,
    engines: [IceProtectedZone; 2],
}
impl AntiIce {
    const CLEAN_STALL_SPEED_KNOTS: f64 = 120.;
    const ICE_STALL_SPEED_INCREASE: f64 = 0.3;
    const ICE_DETECTION_THRESHOLD: f64 = 0.05;

    pub fn new() -> Self {
        Self {
            wing: IceProtectedZone::new("WING", FailureId::WingAntiIce),
            engines: [
                IceProtectedZone::new("ENG_1", FailureId::EngineAntiIce(1)),
                IceProtectedZone::new("ENG_2", FailureId::EngineAntiIce(2)),
            ],
        }
    }

    pub fn update(&mut self, context: &UpdateContext, arguments: &AntiIceUpdateArguments) {
        self.wing.update(
            context,
            arguments.wing_anti_ice_on,
            arguments.supply_ratio,
        );
        for (zone, on) in self
            .engines
            .iter_mut()
            .zip(arguments.engine_anti_ice_on.iter())
        {
            zone.update(context, *on, arguments.supply_ratio);
        }
    }

    pub fn wing_ice(&self) -> Ratio {
        self.wing.ice()
    }

    pub fn engine_inlet_ice(&self, number: usize) -> Ratio {
        self.engines
            .get(number.wrapping_sub(1))
            .map_or(Ratio::new::<ratio>(0.), |zone| zone.ice())
    }

    /// Accreted wing ice raises the stall speed.
    pub fn stall_speed(&self) -> Velocity {
        Velocity::new::<knot>(
            AntiIce::CLEAN_STALL_SPEED_KNOTS
                * (1. + AntiIce::ICE_STALL_SPEED_INCREASE * self.wing.ice().get::<ratio>()),
        )
    }

    pub fn is_ice_detected(&self) -> bool {
        let threshold = Ratio::new::<ratio>(AntiIce::ICE_DETECTION_THRESHOLD);
        self.wing.ice() > threshold || self.engines.iter().any(|zone| zone.ice() > threshold)
    }

    pub fn zone(&self, zone: AntiIceZone) -> Option<&IceProtectedZone> {
        match zone {
            AntiIceZone::Wing => Some(&self.wing),
            AntiIceZone::EngineInlet(number) => self.engines.get(number.wrapping_sub(1)),
        }
    }

    /// Cycling the anti-ice push button closes and reopens the valve, which clears
    /// a valve failure. Unknown zones are ignored.
    pub fn reset_valve(&mut self, zone: AntiIceZone) {
        let zone = match zone {
            AntiIceZone::Wing => Some(&mut self.wing),
            AntiIceZone::EngineInlet(number) => self.engines.get_mut(number.wrapping_sub(1)),
        };

        if let Some(zone) = zone {
            zone.valve_failure.clear();
        }
    }

    pub fn zones_mut(&mut self) -> impl Iterator<Item = &mut IceProtectedZone> {
        std::iter::once(&mut self.wing).chain(self.engines.iter_mut())
    }
}
impl SimulationElement for AntiIce {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        for zone in self.zones_mut() {
            zone.accept(visitor);
        }

        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("STALL_SPEED", self.stall_speed().get::<knot>());
        writer.write_bool("ICE_DETECTED", self.is_ice_detected());
    }
}
impl Default for AntiIce {
    fn default() -> Self {
        Self::new()
    }
}
