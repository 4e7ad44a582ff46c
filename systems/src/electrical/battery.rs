use super::PowerSource;
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use uom::si::{
    electric_charge::ampere_hour, electric_current::ampere, f64::*, ratio::ratio, time::second,
};

enum ElectricCurrentDirection {
    Charging,
    Discharging,
}

pub struct Battery {
    charge_id: String,
    current_id: String,
    charge: ElectricCharge,
    current: ElectricCurrent,
    current_direction: Option<ElectricCurrentDirection>,
    failure: Failure,
}
impl Battery {
    pub const CAPACITY: f64 = 0.2;
    const MAX_ELECTRIC_CHARGE_AMPERE_HOURS: f64 = 23.0;
    const CHARGE_CURRENT_AMPERE: f64 = 9.;
    /// The current drawn when the battery supplies its full capacity.
    const FULL_OUTPUT_DISCHARGE_CURRENT_AMPERE: f64 = 50.;

    pub fn full() -> Battery {
        Battery::new(ElectricCharge::new::<ampere_hour>(
            Battery::MAX_ELECTRIC_CHARGE_AMPERE_HOURS,
        ))
    }

    pub fn empty() -> Battery {
        Battery::new(ElectricCharge::new::<ampere_hour>(0.))
    }

    fn new(charge: ElectricCharge) -> Self {
        Self {
            charge_id: "ELEC_BAT_CHARGE".to_owned(),
            current_id: "ELEC_BAT_CURRENT".to_owned(),
            charge,
            current: ElectricCurrent::new::<ampere>(0.),
            current_direction: None,
            failure: Failure::new(FailureId::Battery, RecoveryPolicy::Manual),
        }
    }

    /// Charges from generator capacity left over after the load is supplied,
    /// or discharges to cover the part of the load the generators cannot supply.
    pub fn update(&mut self, context: &UpdateContext, generator_capacity: Ratio, load: Ratio) {
        let time = Time::new::<second>(context.delta_as_secs_f64());
        let shortfall = (load - generator_capacity).get::<ratio>();

        if self.failure.is_active() {
            self.current = ElectricCurrent::new::<ampere>(0.);
            self.current_direction = None;
        } else if shortfall > 0. && self.has_charge() {
            let supplied = shortfall.min(Battery::CAPACITY) / Battery::CAPACITY;
            self.current = ElectricCurrent::new::<ampere>(
                supplied * Battery::FULL_OUTPUT_DISCHARGE_CURRENT_AMPERE,
            );
            self.current_direction = Some(ElectricCurrentDirection::Discharging);
            self.charge -= self.current * time;
            if self.charge < ElectricCharge::new::<ampere_hour>(0.) {
                self.charge = ElectricCharge::new::<ampere_hour>(0.);
            }
        } else if shortfall < 0. && !self.is_full() {
            self.current = ElectricCurrent::new::<ampere>(Battery::CHARGE_CURRENT_AMPERE);
            self.current_direction = Some(ElectricCurrentDirection::Charging);
            self.charge += self.current * time;
            let maximum =
                ElectricCharge::new::<ampere_hour>(Battery::MAX_ELECTRIC_CHARGE_AMPERE_HOURS);
            if self.charge > maximum {
                self.charge = maximum;
            }
        } else {
            self.current = ElectricCurrent::new::<ampere>(0.);
            self.current_direction = None;
        }
    }

    /// Cycling the battery push button reconnects a failed battery.
    pub fn reset(&mut self) {
        self.failure.clear();
    }

    pub fn charge(&self) -> ElectricCharge {
        self.charge
    }

    pub fn has_charge(&self) -> bool {
        self.charge > ElectricCharge::new::<ampere_hour>(0.)
    }

    fn is_full(&self) -> bool {
        self.charge >= ElectricCharge::new::<ampere_hour>(Battery::MAX_ELECTRIC_CHARGE_AMPERE_HOURS)
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.current_direction, Some(ElectricCurrentDirection::Charging))
    }

    pub fn is_discharging(&self) -> bool {
        matches!(
            self.current_direction,
            Some(ElectricCurrentDirection::Discharging)
        )
    }
}
impl PowerSource for Battery {
    fn output(&self) -> Ratio {
        if self.has_charge() && !self.failure.is_active() && !self.is_charging() {
            Ratio::new::<ratio>(Battery::CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }

    fn is_failed(&self) -> bool {
        self.failure.is_active()
    }
}
impl Failable for Battery {
    fn failure(&self) -> &Failure {
        &self.failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.failure
    }
}
impl SimulationElement for Battery {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.charge_id, self.charge.get::<ampere_hour>());

        let current = self.current.get::<ampere>();
        writer.write_f64(
            &self.current_id,
            if self.is_discharging() { -current } else { current },
        );
    }
}
