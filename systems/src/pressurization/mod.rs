//! Cabin pressurization. The controller drives the cabin altitude towards a schedule
//! based on the aircraft altitude. Whatever share of the pack demand the bleed manifold
//! cannot supply lets the cabin altitude drift towards the aircraft altitude instead.
use crate::{
    shared::calculate_towards_target,
    simulation::{SimulationElement, SimulatorWriter, UpdateContext},
};
use log::info;
use uom::si::{f64::*, length::foot, pressure::psi, ratio::ratio};

pub struct Pressurization {
    cabin_altitude: Length,
    target_cabin_altitude: Length,
    differential_pressure: Pressure,
    supply_ratio: Ratio,
    oxygen: Ratio,
}
impl Pressurization {
    const CABIN_ALTITUDE_SCHEDULE_RATIO: f64 = 0.2;
    pub const MAXIMUM_TARGET_CABIN_ALTITUDE_FEET: f64 = 8000.;
    const CONTROLLER_GAIN_PER_MINUTE: f64 = 10.;
    const MAXIMUM_CLIMB_RATE_FEET_PER_MINUTE: f64 = 500.;
    const MAXIMUM_DESCENT_RATE_FEET_PER_MINUTE: f64 = 300.;
    const DIVERGENCE_RATE_PER_SECOND: f64 = 0.002;
    pub const EXCESSIVE_CABIN_ALTITUDE_FEET: f64 = 10000.;
    const OXYGEN_DURATION_SECONDS: f64 = 900.;
    pub const LOW_OXYGEN: f64 = 0.25;

    pub fn new() -> Self {
        Self {
            cabin_altitude: Length::new::<foot>(0.),
            target_cabin_altitude: Length::new::<foot>(0.),
            differential_pressure: Pressure::new::<psi>(0.),
            supply_ratio: Ratio::new::<ratio>(1.),
            oxygen: Ratio::new::<ratio>(1.),
        }
    }

    /// The supply ratio is the fraction of the packs' bleed demand being supplied.
    /// It is zero when the packs are off.
    pub fn update(&mut self, context: &UpdateContext, supply_ratio: Ratio) {
        let aircraft_altitude = context.indicated_altitude().get::<foot>();
        let cabin_altitude = self.cabin_altitude.get::<foot>();
        let supply = supply_ratio.get::<ratio>().max(0.).min(1.);
        let seconds = context.delta_as_secs_f64();

        let target = Pressurization::target_cabin_altitude_for(aircraft_altitude);
        let rate_feet_per_minute = ((target - cabin_altitude)
            * Pressurization::CONTROLLER_GAIN_PER_MINUTE)
            .max(-Pressurization::MAXIMUM_DESCENT_RATE_FEET_PER_MINUTE)
            .min(Pressurization::MAXIMUM_CLIMB_RATE_FEET_PER_MINUTE);
        let controlled = calculate_towards_target(
            cabin_altitude,
            target,
            rate_feet_per_minute.abs() / 60.,
            context.delta(),
        );
        let diverged = cabin_altitude
            + (aircraft_altitude - cabin_altitude)
                * (Pressurization::DIVERGENCE_RATE_PER_SECOND * seconds).min(1.);

        let was_excessive = self.is_cabin_altitude_excessive();
        self.cabin_altitude =
            Length::new::<foot>(supply * controlled + (1. - supply) * diverged);
        self.target_cabin_altitude = Length::new::<foot>(target);
        self.supply_ratio = Ratio::new::<ratio>(supply);
        self.differential_pressure = Pressure::new::<psi>(
            standard_pressure_psi(self.cabin_altitude.get::<foot>())
                - standard_pressure_psi(aircraft_altitude),
        );

        if self.is_cabin_altitude_excessive() {
            self.oxygen = Ratio::new::<ratio>(
                (self.oxygen.get::<ratio>() - seconds / Pressurization::OXYGEN_DURATION_SECONDS)
                    .max(0.),
            );
        }

        if !was_excessive && self.is_cabin_altitude_excessive() {
            info!(
                "Cabin altitude exceeds {} feet.",
                Pressurization::EXCESSIVE_CABIN_ALTITUDE_FEET
            );
        }
    }

    fn target_cabin_altitude_for(aircraft_altitude: f64) -> f64 {
        (aircraft_altitude * Pressurization::CABIN_ALTITUDE_SCHEDULE_RATIO)
            .max(0.)
            .min(Pressurization::MAXIMUM_TARGET_CABIN_ALTITUDE_FEET)
    }

    pub fn cabin_altitude(&self) -> Length {
        self.cabin_altitude
    }

    pub fn target_cabin_altitude(&self) -> Length {
        self.target_cabin_altitude
    }

    pub fn differential_pressure(&self) -> Pressure {
        self.differential_pressure
    }

    pub fn oxygen(&self) -> Ratio {
        self.oxygen
    }

    pub fn is_cabin_altitude_excessive(&self) -> bool {
        self.cabin_altitude > Length::new::<foot>(Pressurization::EXCESSIVE_CABIN_ALTITUDE_FEET)
    }

    pub fn is_oxygen_low(&self) -> bool {
        self.oxygen < Ratio::new::<ratio>(Pressurization::LOW_OXYGEN)
    }
}
impl SimulationElement for Pressurization {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("PRESS_CABIN_ALTITUDE", self.cabin_altitude.get::<foot>());
        writer.write_f64(
            "PRESS_CABIN_ALTITUDE_TARGET",
            self.target_cabin_altitude.get::<foot>(),
        );
        writer.write_f64(
            "PRESS_CABIN_DELTA_PRESSURE",
            self.differential_pressure.get::<psi>(),
        );
        writer.write_f64("PRESS_SUPPLY_RATIO", self.supply_ratio.get::<ratio>());
        writer.write_f64("OXYGEN_RESERVE", self.oxygen.get::<ratio>());
    }
}
impl Default for Pressurization {
    fn default() -> Self {
        Self::new()
    }
}

/// The pressure of the international standard atmosphere at the given altitude.
fn standard_pressure_psi(altitude_feet: f64) -> f64 {
    14.696 * (1. - 6.8756e-6 * altitude_feet).max(0.).powf(5.2559)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;
    use ntest::assert_about_eq;

    fn run_for(
        pressurization: &mut Pressurization,
        test_bed: &mut SimulationTestBed,
        seconds: u64,
        supply_ratio: f64,
    ) {
        for _ in 0..seconds {
            test_bed.run(pressurization, |pressurization, context| {
                pressurization.update(context, Ratio::new::<ratio>(supply_ratio))
            });
        }
    }

    fn cruise() -> SimulationTestBed {
        SimulationTestBed::new().indicated_altitude(Length::new::<foot>(35000.))
    }

    #[test]
    fn target_follows_schedule_and_is_limited() {
        assert_about_eq!(Pressurization::target_cabin_altitude_for(10000.), 2000.);
        assert_about_eq!(Pressurization::target_cabin_altitude_for(60000.), 8000.);
        assert_about_eq!(Pressurization::target_cabin_altitude_for(-500.), 0.);
    }

    #[test]
    fn climbs_towards_target_at_limited_rate() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut pressurization, &mut test_bed, 60, 1.);

        assert_about_eq!(pressurization.cabin_altitude().get::<foot>(), 500.);
    }

    #[test]
    fn reaches_target_with_full_supply() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut pressurization, &mut test_bed, 1200, 1.);

        assert_about_eq!(pressurization.cabin_altitude().get::<foot>(), 7000.);
        assert!(!pressurization.is_cabin_altitude_excessive());
    }

    #[test]
    fn without_supply_cabin_diverges_towards_aircraft_altitude() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut pressurization, &mut test_bed, 1200, 1.);
        run_for(&mut pressurization, &mut test_bed, 600, 0.);

        assert!(pressurization.is_cabin_altitude_excessive());
        assert!(pressurization.cabin_altitude() < Length::new::<foot>(35000.));
    }

    #[test]
    fn partial_supply_diverges_less_than_no_supply() {
        let mut partial = Pressurization::new();
        let mut none = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut partial, &mut test_bed, 300, 0.5);
        run_for(&mut none, &mut test_bed, 300, 0.);

        assert!(partial.cabin_altitude() < none.cabin_altitude());
    }

    #[test]
    fn oxygen_decays_while_cabin_altitude_is_excessive() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut pressurization, &mut test_bed, 1200, 0.);

        assert!(pressurization.oxygen() < Ratio::new::<ratio>(1.));
    }

    #[test]
    fn differential_pressure_is_positive_when_cabin_below_aircraft() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = cruise();
        run_for(&mut pressurization, &mut test_bed, 1200, 1.);

        assert!(pressurization.differential_pressure() > Pressure::new::<psi>(7.));
        assert!(pressurization.differential_pressure() < Pressure::new::<psi>(9.));
    }

    #[test]
    fn standard_pressure_at_sea_level() {
        assert_about_eq!(standard_pressure_psi(0.), 14.696);
    }

    #[test]
    fn writes_its_state() {
        let mut pressurization = Pressurization::new();
        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut pressurization);

        assert!(test_bed.contains_f64("PRESS_CABIN_ALTITUDE", 0.));
        assert!(test_bed.contains_f64("OXYGEN_RESERVE", 1.));
    }
}
