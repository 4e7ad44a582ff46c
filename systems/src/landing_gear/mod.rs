use crate::{
    shared::calculate_towards_target,
    simulation::{SimulationElement, SimulatorWriter, UpdateContext},
};
use log::info;
use thiserror::Error;
use uom::si::{f64::*, ratio::ratio};

#[derive(Debug, Error, PartialEq)]
pub enum LandingGearCommandError {
    #[error("gear retraction is inhibited on the ground")]
    RetractionOnGround,
}

/// The gear travels between up (0) and down and locked (1) at a rate proportional
/// to the available hydraulic authority.
pub struct LandingGear {
    lever_down: bool,
    position: f64,
}
impl LandingGear {
    const FULL_TRAVEL_SECONDS: f64 = 10.;

    pub fn new_down() -> Self {
        Self {
            lever_down: true,
            position: 1.,
        }
    }

    pub fn new_up() -> Self {
        Self {
            lever_down: false,
            position: 0.,
        }
    }

    pub fn set_lever(&mut self, down: bool, on_ground: bool) -> Result<(), LandingGearCommandError> {
        if !down && on_ground {
            return Err(LandingGearCommandError::RetractionOnGround);
        }

        self.move_lever(down);
        Ok(())
    }

    fn move_lever(&mut self, down: bool) {
        if down != self.lever_down {
            info!("Gear lever {}.", if down { "down" } else { "up" });
        }
        self.lever_down = down;
    }

    /// A scheduled lever position is applied before the gear moves. A scheduled
    /// retraction is ignored while the weight is on the wheels.
    pub fn update(
        &mut self,
        context: &UpdateContext,
        hydraulic_authority: Ratio,
        scheduled_lever_down: Option<bool>,
    ) {
        if let Some(down) = scheduled_lever_down {
            if down || !context.is_on_ground() {
                self.move_lever(down);
            }
        }

        let target = if self.lever_down { 1. } else { 0. };
        let rate = hydraulic_authority.get::<ratio>().max(0.).min(1.)
            / LandingGear::FULL_TRAVEL_SECONDS;

        self.position = calculate_towards_target(self.position, target, rate, context.delta());
    }

    pub fn is_lever_down(&self) -> bool {
        self.lever_down
    }

    pub fn position(&self) -> Ratio {
        Ratio::new::<ratio>(self.position)
    }

    pub fn is_down_and_locked(&self) -> bool {
        (self.position - 1.).abs() < f64::EPSILON
    }

    pub fn is_up_and_locked(&self) -> bool {
        self.position.abs() < f64::EPSILON
    }

    pub fn is_in_transit(&self) -> bool {
        !self.is_down_and_locked() && !self.is_up_and_locked()
    }
}
impl SimulationElement for LandingGear {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool("GEAR_LEVER_DOWN", self.lever_down);
        writer.write_f64("GEAR_POSITION", self.position);
        writer.write_bool("GEAR_DOWN_AND_LOCKED", self.is_down_and_locked());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;
    use ntest::assert_about_eq;

    fn run_for(gear: &mut LandingGear, authority: f64, seconds: u64) {
        let mut test_bed = SimulationTestBed::new();
        for _ in 0..seconds {
            test_bed.run(gear, |gear, context| {
                gear.update(context, Ratio::new::<ratio>(authority), None)
            });
        }
    }

    fn run_scheduled(gear: &mut LandingGear, test_bed: &mut SimulationTestBed, down: bool) {
        test_bed.run(gear, |gear, context| {
            gear.update(context, Ratio::new::<ratio>(1.), Some(down))
        });
    }

    #[test]
    fn gear_up_is_inhibited_on_the_ground() {
        let mut gear = LandingGear::new_down();

        assert_eq!(
            gear.set_lever(false, true),
            Err(LandingGearCommandError::RetractionOnGround)
        );
        assert!(gear.is_lever_down());
    }

    #[test]
    fn scheduled_retraction_waits_for_lift_off() {
        let mut gear = LandingGear::new_down();
        let mut test_bed = SimulationTestBed::new().on_ground(true);
        run_scheduled(&mut gear, &mut test_bed, false);
        assert!(gear.is_lever_down());

        test_bed.set_on_ground(false);
        run_scheduled(&mut gear, &mut test_bed, false);
        assert!(!gear.is_lever_down());
    }

    #[test]
    fn scheduled_extension_moves_the_lever() {
        let mut gear = LandingGear::new_up();
        let mut test_bed = SimulationTestBed::new();
        run_scheduled(&mut gear, &mut test_bed, true);

        assert!(gear.is_lever_down());
        assert!(gear.is_in_transit());
    }

    #[test]
    fn retracts_in_flight_with_hydraulic_pressure() {
        let mut gear = LandingGear::new_down();
        gear.set_lever(false, false).unwrap();
        run_for(&mut gear, 1., 5);
        assert!(gear.is_in_transit());
        assert_about_eq!(gear.position().get::<ratio>(), 0.5);

        run_for(&mut gear, 1., 5);
        assert!(gear.is_up_and_locked());
    }

    #[test]
    fn does_not_move_without_hydraulic_pressure() {
        let mut gear = LandingGear::new_up();
        gear.set_lever(true, false).unwrap();
        run_for(&mut gear, 0., 20);

        assert!(gear.is_up_and_locked());
    }

    #[test]
    fn reduced_pressure_slows_extension() {
        let mut gear = LandingGear::new_up();
        gear.set_lever(true, false).unwrap();
        run_for(&mut gear, 0.5, 10);

        assert_about_eq!(gear.position().get::<ratio>(), 0.5);
        run_for(&mut gear, 0.5, 10);
        assert!(gear.is_down_and_locked());
    }

    #[test]
    fn writes_its_state() {
        let mut gear = LandingGear::new_down();
        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut gear);

        assert!(test_bed.contains_bool("GEAR_LEVER_DOWN", true));
        assert!(test_bed.contains_f64("GEAR_POSITION", 1.));
        assert!(test_bed.contains_bool("GEAR_DOWN_AND_LOCKED", true));
    }
}
