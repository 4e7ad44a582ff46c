use systems::simulation::{SimulationElement, SimulatorWriter, UpdateContext};
use uom::si::{f64::*, ratio::ratio};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PowerConsumerFlightPhase {
    BeforeStart = 0,
    AfterStart = 1,
    Flight = 2,
}

/// This type provides an aggregated form of power consumption.
/// Individual consumers aren't modelled, so the electrical load
/// follows the phase of flight instead.
pub(super) struct A320PowerConsumption {
    flight_phase_id: String,
    flight_phase: PowerConsumerFlightPhase,
}
impl A320PowerConsumption {
    pub fn new() -> Self {
        Self {
            flight_phase_id: "ELEC_CONSUMER_FLIGHT_PHASE".to_owned(),
            flight_phase: PowerConsumerFlightPhase::BeforeStart,
        }
    }

    pub fn update(&mut self, context: &UpdateContext, any_engine_running: bool) {
        self.flight_phase = if !context.is_on_ground() {
            PowerConsumerFlightPhase::Flight
        } else if any_engine_running {
            PowerConsumerFlightPhase::AfterStart
        } else {
            PowerConsumerFlightPhase::BeforeStart
        };
    }

    pub fn flight_phase(&self) -> PowerConsumerFlightPhase {
        self.flight_phase
    }

    /// The load as a fraction of the nominal capacity of the electrical network.
    pub fn load(&self) -> Ratio {
        Ratio::new::<ratio>(match self.flight_phase {
            PowerConsumerFlightPhase::BeforeStart => 0.15,
            PowerConsumerFlightPhase::AfterStart => 0.45,
            PowerConsumerFlightPhase::Flight => 0.6,
        })
    }
}
impl SimulationElement for A320PowerConsumption {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.flight_phase_id, self.flight_phase as u8 as f64);
    }
}
