//! Bleed air supply. Engines and the APU feed a single manifold which pressurizes the
//! bleed duct. Packs, anti-ice and engine starters draw from it.
use crate::simulation::{SimulationElement, SimulatorWriter};
use uom::si::{f64::*, pressure::psi, ratio::ratio};

pub trait Valve {
    fn is_open(&self) -> bool;
}

pub trait BleedAirSource {
    fn bleed_air_output(&self) -> Ratio;
}

pub struct BleedAirValve {
    open: bool,
}
impl BleedAirValve {
    pub fn new() -> Self {
        BleedAirValve { open: false }
    }

    pub fn open_when(&mut self, condition: bool) {
        self.open = condition;
    }
}
impl Valve for BleedAirValve {
    fn is_open(&self) -> bool {
        self.open
    }
}
impl Default for BleedAirValve {
    fn default() -> Self {
        Self::new()
    }
}

/// The consumers currently drawing bleed air.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BleedDemand {
    pub packs: bool,
    pub wing_anti_ice: bool,
    pub engine_anti_ice: usize,
    pub engine_starts: usize,
}
impl BleedDemand {
    const PACKS: f64 = 0.4;
    const WING_ANTI_ICE: f64 = 0.3;
    const ENGINE_ANTI_ICE: f64 = 0.1;
    const ENGINE_START: f64 = 0.3;

    pub fn total(&self) -> Ratio {
        let mut total = 0.;
        if self.packs {
            total += BleedDemand::PACKS;
        }
        if self.wing_anti_ice {
            total += BleedDemand::WING_ANTI_ICE;
        }
        total += BleedDemand::ENGINE_ANTI_ICE * self.engine_anti_ice as f64;
        total += BleedDemand::ENGINE_START * self.engine_starts as f64;

        Ratio::new::<ratio>(total)
    }
}

pub struct BleedManifold {
    capacity: Ratio,
    demand: Ratio,
}
impl BleedManifold {
    pub const NOMINAL_CAPACITY: f64 = 1.;
    const DUCT_PRESSURE_AT_NOMINAL_CAPACITY_PSI: f64 = 45.;

    pub fn new() -> Self {
        Self {
            capacity: Ratio::new::<ratio>(0.),
            demand: Ratio::new::<ratio>(0.),
        }
    }

    pub fn update(&mut self, sources: &[&dyn BleedAirSource], demand: &BleedDemand) {
        let total: f64 = sources
            .iter()
            .map(|source| source.bleed_air_output().get::<ratio>().max(0.))
            .sum();

        self.capacity = Ratio::new::<ratio>(total.min(BleedManifold::NOMINAL_CAPACITY));
        self.demand = demand.total();
    }

    pub fn capacity(&self) -> Ratio {
        self.capacity
    }

    pub fn demand(&self) -> Ratio {
        self.demand
    }

    pub fn duct_pressure(&self) -> Pressure {
        Pressure::new::<psi>(
            self.capacity.get::<ratio>() * BleedManifold::DUCT_PRESSURE_AT_NOMINAL_CAPACITY_PSI,
        )
    }

    /// The fraction of the current demand which the manifold can supply.
    pub fn supply_ratio(&self) -> Ratio {
        let demand = self.demand.get::<ratio>();
        if demand <= 0. {
            Ratio::new::<ratio>(1.)
        } else {
            Ratio::new::<ratio>((self.capacity.get::<ratio>() / demand).min(1.))
        }
    }

    pub fn is_demand_exceeding_supply(&self) -> bool {
        self.demand > self.capacity
    }
}
impl SimulationElement for BleedManifold {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("PNEU_BLEED_CAPACITY", self.capacity.get::<ratio>());
        writer.write_f64("PNEU_BLEED_DEMAND", self.demand.get::<ratio>());
        writer.write_f64("PNEU_DUCT_PRESSURE", self.duct_pressure().get::<psi>());
    }
}
impl Default for BleedManifold {
    fn default() -> Self {
        Self::new()
    }
}
