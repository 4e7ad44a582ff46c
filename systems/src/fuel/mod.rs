use crate::{
    overhead::OnOffPushButton,
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use uom::si::{f64::*, mass::kilogram, mass_rate::kilogram_per_second};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TankSide {
    Left,
    Right,
}

pub struct FuelTank {
    quantity_id: String,
    quantity: Mass,
}
impl FuelTank {
    fn new(name: &str, quantity: Mass) -> Self {
        Self {
            quantity_id: format!("FUEL_{}_TANK_QUANTITY", name),
            quantity,
        }
    }

    /// Removes up to the given mass from the tank.
    fn draw(&mut self, mass: Mass) {
        self.quantity = if mass >= self.quantity {
            Mass::new::<kilogram>(0.)
        } else {
            self.quantity - mass
        };
    }

    pub fn quantity(&self) -> Mass {
        self.quantity
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= Mass::new::<kilogram>(0.)
    }
}
impl SimulationElement for FuelTank {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.quantity_id, self.quantity.get::<kilogram>());
    }
}

pub struct FuelUpdateArguments {
    engine_fuel_flow: [MassRate; 2],
    apu_fuel_flow: MassRate,
}
impl FuelUpdateArguments {
    pub fn new(engine_fuel_flow: [MassRate; 2], apu_fuel_flow: MassRate) -> Self {
        Self {
            engine_fuel_flow,
            apu_fuel_flow,
        }
    }
}

/// Two wing tanks. Engine 1 and the APU feed from the left tank, engine 2 from the right.
/// With the crossfeed valve open both engines feed from the fuller tank.
pub struct FuelSystem {
    left: FuelTank,
    right: FuelTank,
    crossfeed: OnOffPushButton,
}
impl FuelSystem {
    pub const LOW_FUEL_KILOGRAMS: f64 = 750.;
    pub const IMBALANCE_KILOGRAMS: f64 = 1500.;

    pub fn new(quantity_per_tank: Mass) -> Self {
        Self {
            left: FuelTank::new("LEFT", quantity_per_tank),
            right: FuelTank::new("RIGHT", quantity_per_tank),
            crossfeed: OnOffPushButton::new_off("FUEL_XFEED"),
        }
    }

    pub fn update(&mut self, context: &UpdateContext, arguments: &FuelUpdateArguments) {
        let seconds = context.delta_as_secs_f64();
        let burn = |flow: MassRate| {
            Mass::new::<kilogram>(flow.get::<kilogram_per_second>().max(0.) * seconds)
        };

        for (number, flow) in (1..=2).zip(arguments.engine_fuel_flow.iter()) {
            let side = self.feeding_side(number);
            self.tank_mut(side).draw(burn(*flow));
        }

        self.left.draw(burn(arguments.apu_fuel_flow));
    }

    fn feeding_side(&self, engine_number: usize) -> TankSide {
        if self.crossfeed.is_on() {
            if self.left.quantity() >= self.right.quantity() {
                TankSide::Left
            } else {
                TankSide::Right
            }
        } else if engine_number == 1 {
            TankSide::Left
        } else {
            TankSide::Right
        }
    }

    fn tank_mut(&mut self, side: TankSide) -> &mut FuelTank {
        match side {
            TankSide::Left => &mut self.left,
            TankSide::Right => &mut self.right,
        }
    }

    pub fn tank(&self, side: TankSide) -> &FuelTank {
        match side {
            TankSide::Left => &self.left,
            TankSide::Right => &self.right,
        }
    }

    pub fn toggle_crossfeed(&mut self) {
        self.crossfeed.set_on(!self.crossfeed.is_on());
    }

    pub fn is_crossfeed_open(&self) -> bool {
        self.crossfeed.is_on()
    }

    pub fn has_fuel_for_engine(&self, number: usize) -> bool {
        !self.tank(self.feeding_side(number)).is_empty()
    }

    pub fn has_fuel_for_apu(&self) -> bool {
        !self.left.is_empty()
    }

    pub fn total_quantity(&self) -> Mass {
        self.left.quantity() + self.right.quantity()
    }

    pub fn imbalance(&self) -> Mass {
        let difference = self.left.quantity() - self.right.quantity();
        if difference < Mass::new::<kilogram>(0.) {
            -difference
        } else {
            difference
        }
    }

    pub fn is_imbalanced(&self) -> bool {
        self.imbalance() > Mass::new::<kilogram>(FuelSystem::IMBALANCE_KILOGRAMS)
    }

    pub fn is_fuel_low(&self) -> bool {
        let low = Mass::new::<kilogram>(FuelSystem::LOW_FUEL_KILOGRAMS);
        self.left.quantity() < low || self.right.quantity() < low
    }
}
impl SimulationElement for FuelSystem {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.left.accept(visitor);
        self.right.accept(visitor);
        self.crossfeed.accept(visitor);

        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("FUEL_TOTAL_QUANTITY", self.total_quantity().get::<kilogram>());
        writer.write_bool("FUEL_ENG_1_STARVED", !self.has_fuel_for_engine(1));
        writer.write_bool("FUEL_ENG_2_STARVED", !self.has_fuel_for_engine(2));
        writer.write_bool("FUEL_IMBALANCE", self.is_imbalanced());
        writer.write_bool("FUEL_LOW", self.is_fuel_low());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;
    use ntest::assert_about_eq;

    fn flow(kilograms_per_second: f64) -> MassRate {
        MassRate::new::<kilogram_per_second>(kilograms_per_second)
    }

    fn run_for(fuel: &mut FuelSystem, seconds: u64, engines: [f64; 2], apu: f64) {
        let arguments = FuelUpdateArguments::new([flow(engines[0]), flow(engines[1])], flow(apu));
        let mut test_bed = SimulationTestBed::new();
        for _ in 0..seconds {
            test_bed.run(fuel, |fuel, context| fuel.update(context, &arguments));
        }
    }

    fn fuel_system(kilograms: f64) -> FuelSystem {
        FuelSystem::new(Mass::new::<kilogram>(kilograms))
    }

    #[test]
    fn engines_draw_from_their_own_tank() {
        let mut fuel = fuel_system(5000.);
        run_for(&mut fuel, 100, [1., 0.], 0.);

        assert_about_eq!(fuel.tank(TankSide::Left).quantity().get::<kilogram>(), 4900.);
        assert_about_eq!(fuel.tank(TankSide::Right).quantity().get::<kilogram>(), 5000.);
    }

    #[test]
    fn apu_draws_from_left_tank() {
        let mut fuel = fuel_system(5000.);
        run_for(&mut fuel, 100, [0., 0.], 1.);

        assert_about_eq!(fuel.tank(TankSide::Left).quantity().get::<kilogram>(), 4900.);
    }

    #[test]
    fn tank_never_goes_below_empty() {
        let mut fuel = fuel_system(10.);
        run_for(&mut fuel, 100, [1., 1.], 0.);

        assert_about_eq!(fuel.total_quantity().get::<kilogram>(), 0.);
        assert!(!fuel.has_fuel_for_engine(1));
        assert!(!fuel.has_fuel_for_apu());
    }

    #[test]
    fn imbalance_is_detected() {
        let mut fuel = fuel_system(5000.);
        run_for(&mut fuel, 1600, [1., 0.], 0.);

        assert_about_eq!(fuel.imbalance().get::<kilogram>(), 1600.);
        assert!(fuel.is_imbalanced());
    }

    #[test]
    fn crossfeed_draws_from_fuller_tank() {
        let mut fuel = fuel_system(5000.);
        run_for(&mut fuel, 1000, [1., 0.], 0.);
        fuel.toggle_crossfeed();
        run_for(&mut fuel, 1000, [1., 0.], 0.);

        assert_about_eq!(fuel.imbalance().get::<kilogram>(), 0., 1.);
    }

    #[test]
    fn crossfeed_prevents_starvation_of_engine_with_empty_tank() {
        let mut fuel = fuel_system(1000.);
        run_for(&mut fuel, 1000, [1., 0.], 0.);
        assert!(!fuel.has_fuel_for_engine(1));

        fuel.toggle_crossfeed();

        assert!(fuel.has_fuel_for_engine(1));
    }

    #[test]
    fn low_fuel_when_a_tank_runs_low() {
        let mut fuel = fuel_system(1000.);
        assert!(!fuel.is_fuel_low());

        run_for(&mut fuel, 300, [1., 0.], 0.);

        assert!(fuel.is_fuel_low());
    }

    #[test]
    fn writes_its_state() {
        let mut fuel = fuel_system(5000.);
        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut fuel);

        assert!(test_bed.contains_f64("FUEL_LEFT_TANK_QUANTITY", 5000.));
        assert!(test_bed.contains_f64("FUEL_TOTAL_QUANTITY", 10000.));
        assert!(test_bed.contains_bool("OVHD_FUEL_XFEED_PB_IS_ON", false));
        assert!(test_bed.contains_bool("FUEL_ENG_1_STARVED", false));
    }
}
