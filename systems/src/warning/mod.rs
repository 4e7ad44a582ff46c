//! Derives the prioritized alert list from the aircraft's state. The aggregation is a
//! pure function of the signals and is recomputed whenever it is needed.
use std::fmt;
use uom::si::{f64::*, length::foot, velocity::foot_per_minute, velocity::knot};

/// The signals alerts are derived from.
pub trait WarningSignals {
    fn engine_fire_detected(&self, number: usize) -> bool;
    fn apu_fire_detected(&self) -> bool;
    fn cabin_altitude_excessive(&self) -> bool;
    fn indicated_airspeed(&self) -> Velocity;
    fn stall_speed(&self) -> Velocity;
    fn altitude_above_ground(&self) -> Length;
    fn vertical_speed(&self) -> Velocity;
    fn is_on_ground(&self) -> bool;
    fn electrical_emergency_configuration(&self) -> bool;
    fn hydraulic_pressure_low(&self) -> bool;
    fn generator_faulted(&self, number: usize) -> bool;
    fn apu_generator_faulted(&self) -> bool;
    fn engine_flamed_out(&self, number: usize) -> bool;
    fn brakes_hot(&self) -> bool;
    fn fuel_low(&self) -> bool;
    fn fuel_imbalanced(&self) -> bool;
    fn oxygen_low(&self) -> bool;
    fn ice_detected(&self) -> bool;
    fn traffic_advisory(&self) -> bool;
    fn resolution_advisory(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningLevel {
    Warning,
    Caution,
    Advisory,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Warning {
    EngineFire(usize),
    ApuFire,
    ExcessiveCabinAltitude,
    Stall,
    Overspeed,
    Terrain,
    ResolutionAdvisory,
    TrafficAdvisory,
    ElectricalEmergencyConfiguration,
    HydraulicLowPressure,
    GeneratorFault(usize),
    ApuGeneratorFault,
    EngineFlameout(usize),
    BrakesHot,
    LowFuel,
    FuelImbalance,
    OxygenLow,
    IceDetected,
}
impl Warning {
    pub fn level(&self) -> WarningLevel {
        match self {
            Warning::EngineFire(_)
            | Warning::ApuFire
            | Warning::ExcessiveCabinAltitude
            | Warning::Stall
            | Warning::Overspeed
            | Warning::Terrain
            | Warning::ResolutionAdvisory => WarningLevel::Warning,
            Warning::IceDetected => WarningLevel::Advisory,
            _ => WarningLevel::Caution,
        }
    }
}
impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EngineFire(number) => write!(f, "ENG {} FIRE", number),
            Warning::ApuFire => write!(f, "APU FIRE"),
            Warning::ExcessiveCabinAltitude => write!(f, "EXCESS CAB ALT"),
            Warning::Stall => write!(f, "STALL"),
            Warning::Overspeed => write!(f, "OVERSPEED"),
            Warning::Terrain => write!(f, "TERRAIN"),
            Warning::ResolutionAdvisory => write!(f, "TCAS RA"),
            Warning::TrafficAdvisory => write!(f, "TCAS TRAFFIC"),
            Warning::ElectricalEmergencyConfiguration => write!(f, "ELEC EMER CONFIG"),
            Warning::HydraulicLowPressure => write!(f, "HYD LO PR"),
            Warning::GeneratorFault(number) => write!(f, "ELEC GEN {} FAULT", number),
            Warning::ApuGeneratorFault => write!(f, "ELEC APU GEN FAULT"),
            Warning::EngineFlameout(number) => write!(f, "ENG {} FLAMEOUT", number),
            Warning::BrakesHot => write!(f, "BRAKES HOT"),
            Warning::LowFuel => write!(f, "FUEL LO LVL"),
            Warning::FuelImbalance => write!(f, "FUEL IMBALANCE"),
            Warning::OxygenLow => write!(f, "OXY LO PR"),
            Warning::IceDetected => write!(f, "ICE DETECTED"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Warnings {
    active: Vec<Warning>,
}
impl Warnings {
    /// Active alerts, warnings before cautions before advisories.
    pub fn active(&self) -> &[Warning] {
        &self.active
    }

    pub fn contains(&self, warning: Warning) -> bool {
        self.active.contains(&warning)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn master_warning(&self) -> bool {
        self.active
            .iter()
            .any(|warning| warning.level() == WarningLevel::Warning)
    }

    pub fn master_caution(&self) -> bool {
        self.active
            .iter()
            .any(|warning| warning.level() == WarningLevel::Caution)
    }
}

pub struct WarningAggregator;
impl WarningAggregator {
    pub const MAXIMUM_OPERATING_SPEED_KNOTS: f64 = 350.;
    const TERRAIN_ALTITUDE_FEET: f64 = 1000.;
    const TERRAIN_SINK_RATE_FEET_PER_MINUTE: f64 = 2000.;
    const ENGINES: [usize; 2] = [1, 2];

    pub fn compute(signals: &impl WarningSignals) -> Warnings {
        let airborne = !signals.is_on_ground();
        let mut active = Vec::new();

        for number in WarningAggregator::ENGINES.iter() {
            if signals.engine_fire_detected(*number) {
                active.push(Warning::EngineFire(*number));
            }
        }
        if signals.apu_fire_detected() {
            active.push(Warning::ApuFire);
        }
        if signals.cabin_altitude_excessive() {
            active.push(Warning::ExcessiveCabinAltitude);
        }
        if airborne && signals.indicated_airspeed() < signals.stall_speed() {
            active.push(Warning::Stall);
        }
        if signals.indicated_airspeed()
            > Velocity::new::<knot>(WarningAggregator::MAXIMUM_OPERATING_SPEED_KNOTS)
        {
            active.push(Warning::Overspeed);
        }
        if airborne
            && signals.altitude_above_ground()
                < Length::new::<foot>(WarningAggregator::TERRAIN_ALTITUDE_FEET)
            && signals.vertical_speed()
                < Velocity::new::<foot_per_minute>(
                    -WarningAggregator::TERRAIN_SINK_RATE_FEET_PER_MINUTE,
                )
        {
            active.push(Warning::Terrain);
        }
        if signals.resolution_advisory() {
            active.push(Warning::ResolutionAdvisory);
        } else if signals.traffic_advisory() {
            active.push(Warning::TrafficAdvisory);
        }

        if signals.electrical_emergency_configuration() {
            active.push(Warning::ElectricalEmergencyConfiguration);
        }
        if signals.hydraulic_pressure_low() {
            active.push(Warning::HydraulicLowPressure);
        }
        for number in WarningAggregator::ENGINES.iter() {
            if signals.generator_faulted(*number) {
                active.push(Warning::GeneratorFault(*number));
            }
        }
        if signals.apu_generator_faulted() {
            active.push(Warning::ApuGeneratorFault);
        }
        for number in WarningAggregator::ENGINES.iter() {
            if signals.engine_flamed_out(*number) {
                active.push(Warning::EngineFlameout(*number));
            }
        }
        if signals.brakes_hot() {
            active.push(Warning::BrakesHot);
        }
        if signals.fuel_low() {
            active.push(Warning::LowFuel);
        }
        if signals.fuel_imbalanced() {
            active.push(Warning::FuelImbalance);
        }
        if signals.oxygen_low() {
            active.push(Warning::OxygenLow);
        }
        if signals.ice_detected() {
            active.push(Warning::IceDetected);
        }

        active.sort_by_key(|warning| warning.level());

        Warnings { active }
    }
}
