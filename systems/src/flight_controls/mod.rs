//! Flaps and speedbrake surfaces driven by hydraulic power, and the automatic
//! gear and flap schedule used when the crew hands these over to the systems.
use crate::{
    shared::calculate_towards_target,
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use log::info;
use thiserror::Error;
use uom::si::{f64::*, length::foot, ratio::ratio, velocity::knot};

#[derive(Debug, Error, PartialEq)]
pub enum FlightControlsCommandError {
    #[error("{surface} setting {value} is outside 0.0 to 1.0")]
    OutOfRange { surface: &'static str, value: f64 },
}

/// A surface which follows its commanded position at a rate limited by
/// the hydraulic authority available to it.
pub struct ControlSurface {
    id: String,
    name: &'static str,
    commanded: f64,
    position: f64,
    full_travel_seconds: f64,
}
impl ControlSurface {
    fn new(id: &str, name: &'static str, full_travel_seconds: f64) -> Self {
        Self {
            id: id.to_owned(),
            name,
            commanded: 0.,
            position: 0.,
            full_travel_seconds,
        }
    }

    fn command(&mut self, value: f64) -> Result<(), FlightControlsCommandError> {
        if !(0. ..=1.).contains(&value) {
            return Err(FlightControlsCommandError::OutOfRange {
                surface: self.name,
                value,
            });
        }

        self.commanded = value;
        Ok(())
    }

    fn update(&mut self, context: &UpdateContext, hydraulic_authority: Ratio) {
        let rate =
            hydraulic_authority.get::<ratio>().max(0.).min(1.) / self.full_travel_seconds;
        self.position =
            calculate_towards_target(self.position, self.commanded, rate, context.delta());
    }

    pub fn commanded(&self) -> Ratio {
        Ratio::new::<ratio>(self.commanded)
    }

    pub fn position(&self) -> Ratio {
        Ratio::new::<ratio>(self.position)
    }
}
impl SimulationElement for ControlSurface {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&format!("{}_COMMAND", self.id), self.commanded);
        writer.write_f64(&format!("{}_POSITION", self.id), self.position);
    }
}

/// Naive gear and flap scheduling on indicated altitude and airspeed.
pub struct SystemsAutomation {
    enabled: bool,
    gear_down: bool,
    flaps: f64,
}
impl SystemsAutomation {
    const GEAR_DOWN_BELOW_FEET: f64 = 1500.;
    const GEAR_DOWN_BELOW_KNOTS: f64 = 180.;
    const FLAP_SCHEDULE: [(f64, f64); 4] = [(120., 1.), (140., 0.75), (160., 0.5), (180., 0.25)];

    pub fn new() -> Self {
        Self {
            enabled: false,
            gear_down: true,
            flaps: 0.,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            info!(
                "Systems automation {}.",
                if enabled { "engaged" } else { "disengaged" }
            );
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self, context: &UpdateContext) {
        let speed = context.indicated_airspeed().get::<knot>();

        self.gear_down = context.indicated_altitude().get::<foot>()
            < SystemsAutomation::GEAR_DOWN_BELOW_FEET
            && speed < SystemsAutomation::GEAR_DOWN_BELOW_KNOTS;
        self.flaps = SystemsAutomation::FLAP_SCHEDULE
            .iter()
            .find(|(below_knots, _)| speed < *below_knots)
            .map_or(0., |(_, flap)| *flap);
    }

    pub fn gear_down_demand(&self) -> bool {
        self.gear_down
    }

    pub fn flap_demand(&self) -> f64 {
        self.flaps
    }
}
impl SimulationElement for SystemsAutomation {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool("SYSTEMS_AUTOMATION", self.enabled);
    }
}
impl Default for SystemsAutomation {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FlightControls {
    flaps: ControlSurface,
    speedbrake: ControlSurface,
    automation: SystemsAutomation,
}
impl FlightControls {
    const FLAPS_FULL_TRAVEL_SECONDS: f64 = 20.;
    const SPEEDBRAKE_FULL_TRAVEL_SECONDS: f64 = 2.;

    pub fn new() -> Self {
        Self {
            flaps: ControlSurface::new(
                "FLAPS",
                "flap",
                FlightControls::FLAPS_FULL_TRAVEL_SECONDS,
            ),
            speedbrake: ControlSurface::new(
                "SPEEDBRAKE",
                "speedbrake",
                FlightControls::SPEEDBRAKE_FULL_TRAVEL_SECONDS,
            ),
            automation: SystemsAutomation::new(),
        }
    }

    /// Selecting a flap setting hands the flaps back to the crew.
    pub fn set_flaps(&mut self, value: f64) -> Result<(), FlightControlsCommandError> {
        self.flaps.command(value)?;
        self.automation.set_enabled(false);
        Ok(())
    }

    pub fn set_speedbrake(&mut self, value: f64) -> Result<(), FlightControlsCommandError> {
        self.speedbrake.command(value)
    }

    pub fn set_systems_automation(&mut self, enabled: bool) {
        self.automation.set_enabled(enabled);
    }

    pub fn is_systems_automation_enabled(&self) -> bool {
        self.automation.is_enabled()
    }

    pub fn automation(&self) -> &SystemsAutomation {
        &self.automation
    }

    /// The gear position the automation wants, if it is in charge of the gear.
    pub fn scheduled_gear_down(&self) -> Option<bool> {
        if self.automation.is_enabled() {
            Some(self.automation.gear_down_demand())
        } else {
            None
        }
    }

    pub fn update(&mut self, context: &UpdateContext, hydraulic_authority: Ratio) {
        self.automation.update(context);
        if self.automation.is_enabled() {
            self.flaps.commanded = self.automation.flap_demand();
        }

        self.flaps.update(context, hydraulic_authority);
        self.speedbrake.update(context, hydraulic_authority);
    }

    pub fn flaps(&self) -> &ControlSurface {
        &self.flaps
    }

    pub fn speedbrake(&self) -> &ControlSurface {
        &self.speedbrake
    }
}
impl SimulationElement for FlightControls {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.flaps.accept(visitor);
        self.speedbrake.accept(visitor);
        self.automation.accept(visitor);

        visitor.visit(self);
    }
}
impl Default for FlightControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;
    use ntest::assert_about_eq;

    fn full_authority() -> Ratio {
        Ratio::new::<ratio>(1.)
    }

    fn automation_at(feet: f64, knots: f64) -> SystemsAutomation {
        let mut test_bed = SimulationTestBed::new()
            .indicated_altitude(Length::new::<foot>(feet))
            .indicated_airspeed(Velocity::new::<knot>(knots));
        let mut automation = SystemsAutomation::new();
        test_bed.run(&mut automation, |automation, context| automation.update(context));

        automation
    }

    fn flap_demand_at(knots: f64) -> f64 {
        automation_at(1000., knots).flap_demand()
    }

    fn gear_down_demand_at(feet: f64, knots: f64) -> bool {
        automation_at(feet, knots).gear_down_demand()
    }

    #[test]
    fn flap_schedule_follows_airspeed() {
        assert_about_eq!(flap_demand_at(110.), 1.);
        assert_about_eq!(flap_demand_at(130.), 0.75);
        assert_about_eq!(flap_demand_at(150.), 0.5);
        assert_about_eq!(flap_demand_at(170.), 0.25);
        assert_about_eq!(flap_demand_at(180.), 0.);
        assert_about_eq!(flap_demand_at(250.), 0.);
    }

    #[test]
    fn gear_is_scheduled_down_when_low_and_slow() {
        assert!(gear_down_demand_at(1200., 160.));
        assert!(!gear_down_demand_at(1200., 190.));
        assert!(!gear_down_demand_at(1600., 160.));
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let mut controls = FlightControls::new();

        assert_eq!(
            controls.set_flaps(1.5),
            Err(FlightControlsCommandError::OutOfRange {
                surface: "flap",
                value: 1.5
            })
        );
        assert_eq!(
            controls.set_speedbrake(-0.1),
            Err(FlightControlsCommandError::OutOfRange {
                surface: "speedbrake",
                value: -0.1
            })
        );
    }

    #[test]
    fn surfaces_travel_at_their_own_rate() {
        let mut controls = FlightControls::new();
        controls.set_flaps(1.).unwrap();
        controls.set_speedbrake(1.).unwrap();

        let mut test_bed = SimulationTestBed::new();
        test_bed.run(&mut controls, |controls, context| {
            controls.update(context, full_authority())
        });

        assert_about_eq!(controls.flaps().position().get::<ratio>(), 0.05);
        assert_about_eq!(controls.speedbrake().position().get::<ratio>(), 0.5);
    }

    #[test]
    fn surfaces_do_not_move_without_hydraulic_pressure() {
        let mut controls = FlightControls::new();
        controls.set_flaps(0.5).unwrap();

        let mut test_bed = SimulationTestBed::new();
        test_bed.run(&mut controls, |controls, context| {
            controls.update(context, Ratio::new::<ratio>(0.))
        });

        assert_about_eq!(controls.flaps().position().get::<ratio>(), 0.);
    }

    #[test]
    fn automation_commands_flaps_from_airspeed() {
        let mut controls = FlightControls::new();
        controls.set_systems_automation(true);

        let mut test_bed =
            SimulationTestBed::new().indicated_airspeed(Velocity::new::<knot>(150.));
        test_bed.run(&mut controls, |controls, context| {
            controls.update(context, full_authority())
        });

        assert_about_eq!(controls.flaps().commanded().get::<ratio>(), 0.5);
        assert_eq!(controls.scheduled_gear_down(), Some(false));
    }

    #[test]
    fn gear_is_not_scheduled_without_automation() {
        let mut controls = FlightControls::new();
        let mut test_bed = SimulationTestBed::new()
            .indicated_altitude(Length::new::<foot>(1000.))
            .indicated_airspeed(Velocity::new::<knot>(150.));
        test_bed.run(&mut controls, |controls, context| {
            controls.update(context, full_authority())
        });

        assert_eq!(controls.scheduled_gear_down(), None);
    }

    #[test]
    fn manual_flap_selection_disengages_automation() {
        let mut controls = FlightControls::new();
        controls.set_systems_automation(true);
        controls.set_flaps(0.25).unwrap();

        assert!(!controls.is_systems_automation_enabled());

        let mut test_bed =
            SimulationTestBed::new().indicated_airspeed(Velocity::new::<knot>(110.));
        test_bed.run(&mut controls, |controls, context| {
            controls.update(context, full_authority())
        });

        assert_about_eq!(controls.flaps().commanded().get::<ratio>(), 0.25);
    }

    #[test]
    fn writes_its_state() {
        let mut controls = FlightControls::new();
        controls.set_speedbrake(0.3).unwrap();
        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut controls);

        assert!(test_bed.contains_f64("SPEEDBRAKE_COMMAND", 0.3));
        assert!(test_bed.contains_f64("FLAPS_POSITION", 0.));
        assert!(test_bed.contains_bool("SYSTEMS_AUTOMATION", false));
    }
}
