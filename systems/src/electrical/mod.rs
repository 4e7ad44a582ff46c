//! Electrical power generation and distribution, expressed as normalized capacity.
//! A capacity of one equals the nominal capacity of the electrical network.
use crate::simulation::{SimulationElement, SimulatorWriter};
use uom::si::{f64::*, ratio::ratio};

mod battery;
pub use battery::Battery;
mod emergency_generator;
pub use emergency_generator::EmergencyGenerator;
mod engine_generator;
pub use engine_generator::EngineGenerator;

pub trait PowerSource {
    /// The capacity this source currently provides. Failed sources provide nothing.
    fn output(&self) -> Ratio;

    fn is_failed(&self) -> bool {
        false
    }

    fn is_supplying(&self) -> bool {
        self.output() > Ratio::new::<ratio>(0.)
    }
}

/// Aggregates the power sources into the capacity available to consumers.
pub struct ElectricalBus {
    capacity_id: String,
    load_id: String,
    is_powered_id: String,
    emergency_configuration_id: String,

    capacity: Ratio,
    load: Ratio,
    emergency_configuration: bool,
}
impl ElectricalBus {
    pub const NOMINAL_CAPACITY: f64 = 1.;

    pub fn new(name: &str) -> Self {
        Self {
            capacity_id: format!("ELEC_{}_BUS_CAPACITY", name),
            load_id: format!("ELEC_{}_BUS_LOAD", name),
            is_powered_id: format!("ELEC_{}_BUS_IS_POWERED", name),
            emergency_configuration_id: format!("ELEC_{}_BUS_EMER_CONFIG", name),

            capacity: Ratio::new::<ratio>(0.),
            load: Ratio::new::<ratio>(0.),
            emergency_configuration: false,
        }
    }

    /// Recomputes the capacity from scratch. Nothing carries over from the previous tick.
    pub fn update(
        &mut self,
        sources: &[&dyn PowerSource],
        load: Ratio,
        emergency_configuration: bool,
    ) {
        let total: f64 = sources
            .iter()
            .map(|source| source.output().get::<ratio>().max(0.))
            .sum();

        self.capacity = Ratio::new::<ratio>(total.min(ElectricalBus::NOMINAL_CAPACITY));
        self.load = load;
        self.emergency_configuration = emergency_configuration;
    }

    pub fn capacity(&self) -> Ratio {
        self.capacity
    }

    pub fn load(&self) -> Ratio {
        self.load
    }

    /// The part of the load which cannot be supplied.
    pub fn deficit(&self) -> Ratio {
        Ratio::new::<ratio>((self.load - self.capacity).get::<ratio>().max(0.))
    }

    pub fn is_powered(&self) -> bool {
        self.capacity > Ratio::new::<ratio>(0.)
    }

    /// Only the emergency generator and battery are supplying the bus.
    pub fn is_in_emergency_configuration(&self) -> bool {
        self.emergency_configuration
    }
}
impl SimulationElement for ElectricalBus {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.capacity_id, self.capacity.get::<ratio>());
        writer.write_f64(&self.load_id, self.load.get::<ratio>());
        writer.write_bool(&self.is_powered_id, self.is_powered());
        writer.write_bool(
            &self.emergency_configuration_id,
            self.emergency_configuration,
        );
    }
}
