//! The crew's command surface. Commands either change state immediately or are
//! rejected with the reason, leaving the aircraft untouched.
use super::{A320CommandError, A320};
use systems::{
    anti_ice::AntiIceZone,
    autoflight::{LateralMode, VerticalMode},
    failures::FailureId,
    fire::FireZoneId,
    navigation::Waypoint,
    tcas::TrafficTarget,
};
use uom::si::f64::*;

impl A320 {
    pub fn start_engine(&mut self, number: usize) -> Result<(), A320CommandError> {
        let index = A320::engine_index(number)?;
        self.engines[index].start(
            self.bleed_manifold.duct_pressure(),
            self.fire.is_push_button_released(FireZoneId::Engine(number)),
        )?;
        self.engine_generators[index].reset();

        Ok(())
    }

    pub fn stop_engine(&mut self, number: usize) -> Result<(), A320CommandError> {
        let index = A320::engine_index(number)?;
        self.engines[index].stop();

        Ok(())
    }

    /// Sets the throttle of both engines. An engaged autothrottle overrides it.
    pub fn set_throttle(&mut self, throttle: Ratio) {
        for engine in self.engines.iter_mut() {
            engine.set_throttle(throttle);
        }
    }

    pub fn start_apu(&mut self) -> Result<(), A320CommandError> {
        self.apu.start(
            self.electrical_bus.is_powered(),
            self.fuel.has_fuel_for_apu(),
            self.fire.is_push_button_released(FireZoneId::Apu),
        )?;

        Ok(())
    }

    pub fn stop_apu(&mut self) {
        self.apu.stop();
    }

    pub fn set_apu_bleed(&mut self, on: bool) {
        self.apu_bleed_push_button.set_on(on);
    }

    pub fn set_packs(&mut self, on: bool) {
        self.packs_push_button.set_on(on);
    }

    pub fn set_electric_pump_auto(&mut self, auto: bool) {
        self.electric_pump_push_button.set_auto(auto);
    }

    pub fn set_wing_anti_ice(&mut self, on: bool) {
        self.wing_anti_ice_push_button.set_on(on);
    }

    pub fn set_engine_anti_ice(&mut self, number: usize, on: bool) -> Result<(), A320CommandError> {
        let index = A320::engine_index(number)?;
        self.engine_anti_ice_push_buttons[index].set_on(on);

        Ok(())
    }

    pub fn toggle_crossfeed(&mut self) {
        self.fuel.toggle_crossfeed();
    }

    pub fn set_autobrake_level(&mut self, level: u8) -> Result<(), A320CommandError> {
        self.brakes.set_autobrake_level(level)?;

        Ok(())
    }

    pub fn set_parking_brake(&mut self, engaged: bool) {
        self.brakes.set_parking_brake(engaged);
    }

    /// Selecting the gear hands it back to the crew.
    pub fn set_gear_down(&mut self, down: bool) -> Result<(), A320CommandError> {
        self.landing_gear
            .set_lever(down, self.flight_state.on_ground)?;
        self.flight_controls.set_systems_automation(false);

        Ok(())
    }

    pub fn set_flaps(&mut self, setting: f64) -> Result<(), A320CommandError> {
        self.flight_controls.set_flaps(setting)?;

        Ok(())
    }

    pub fn set_speedbrake(&mut self, setting: f64) -> Result<(), A320CommandError> {
        self.flight_controls.set_speedbrake(setting)?;

        Ok(())
    }

    /// Hands gear and flaps to the automatic schedule, or back to the crew.
    pub fn set_systems_automation(&mut self, enabled: bool) {
        self.flight_controls.set_systems_automation(enabled);
    }

    pub fn set_altimeter(&mut self, hectopascals: f64) -> Result<(), A320CommandError> {
        self.altimeter.set(hectopascals)?;

        Ok(())
    }

    pub fn set_traffic(&mut self, traffic: Vec<TrafficTarget>) {
        self.tcas.set_traffic(traffic);
    }

    pub fn add_traffic_target(&mut self, target: TrafficTarget) {
        self.tcas.add_target(target);
    }

    pub fn release_fire_push_button(&mut self, zone: FireZoneId) -> Result<(), A320CommandError> {
        self.fire.release_push_button(zone)?;

        Ok(())
    }

    pub fn discharge_fire_agent(&mut self, zone: FireZoneId) -> Result<(), A320CommandError> {
        self.fire.discharge_agent(zone)?;

        Ok(())
    }

    pub fn engage_autopilot(&mut self) {
        self.autopilot.engage();
    }

    pub fn disengage_autopilot(&mut self) {
        self.autopilot.disengage();
    }

    pub fn select_lateral_mode(&mut self, mode: LateralMode) -> Result<(), A320CommandError> {
        self.autopilot.select_lateral_mode(mode)?;

        Ok(())
    }

    pub fn select_vertical_mode(&mut self, mode: VerticalMode) -> Result<(), A320CommandError> {
        self.autopilot.select_vertical_mode(mode)?;

        Ok(())
    }

    /// Engages the autothrottle around the current throttle of engine 1.
    pub fn engage_autothrottle(&mut self) {
        self.autopilot.engage_autothrottle(self.engines[0].throttle());
    }

    pub fn disengage_autothrottle(&mut self) {
        self.autopilot.disengage_autothrottle();
    }

    pub fn set_target_altitude(&mut self, altitude: Length) {
        self.autopilot.set_target_altitude(altitude);
    }

    pub fn set_target_heading(&mut self, heading: Angle) {
        self.autopilot.set_target_heading(heading);
    }

    pub fn set_target_speed(&mut self, speed: Velocity) {
        self.autopilot.set_target_speed(speed);
    }

    pub fn set_target_vertical_speed(&mut self, vertical_speed: Velocity) {
        self.autopilot.set_target_vertical_speed(vertical_speed);
    }

    pub fn load_flight_plan(&mut self, waypoints: Vec<Waypoint>) {
        self.flight_plan.load(waypoints);
    }

    pub fn clear_flight_plan(&mut self) {
        self.flight_plan.clear();
    }

    pub fn append_waypoint(&mut self, waypoint: Waypoint) {
        self.flight_plan.append(waypoint);
    }

    pub fn insert_waypoint(
        &mut self,
        index: usize,
        waypoint: Waypoint,
    ) -> Result<(), A320CommandError> {
        self.flight_plan.insert(index, waypoint)?;

        Ok(())
    }

    pub fn delete_waypoint(&mut self, index: usize) -> Result<(), A320CommandError> {
        self.flight_plan.delete(index)?;

        Ok(())
    }

    pub fn set_altitude_constraint(
        &mut self,
        index: usize,
        altitude: Option<Length>,
    ) -> Result<(), A320CommandError> {
        self.flight_plan.set_altitude_constraint(index, altitude)?;

        Ok(())
    }

    pub fn direct_to(&mut self, index: usize) -> Result<(), A320CommandError> {
        self.flight_plan.direct_to(index)?;

        Ok(())
    }

    pub fn reset_generator(&mut self, number: usize) -> Result<(), A320CommandError> {
        let index = A320::engine_index(number)?;
        self.engine_generators[index].reset();

        Ok(())
    }

    pub fn reset_emergency_generator(&mut self) {
        self.emergency_generator.reset();
    }

    pub fn reset_battery(&mut self) {
        self.battery.reset();
    }

    pub fn reset_anti_ice(&mut self, zone: AntiIceZone) -> Result<(), A320CommandError> {
        if let AntiIceZone::EngineInlet(number) = zone {
            A320::engine_index(number)?;
        }
        self.anti_ice.reset_valve(zone);

        Ok(())
    }

    pub fn seed_failures(&mut self, seed: u64) {
        self.failure_injector.reseed(seed);
    }

    pub fn set_failures_enabled(&mut self, enabled: bool) {
        self.failure_injector.set_enabled(enabled);
    }

    pub fn force_failure(&mut self, id: FailureId) {
        self.failure_injector.force(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use ntest::assert_about_eq;
    use systems::{
        altimeter::AltimeterCommandError,
        apu::ApuCommandError,
        autoflight::{ModeRejection, Modes},
        brakes::BrakeCommandError,
        electrical::PowerSource,
        engine::{EngineCommandError, EngineState},
        fire::FireCommandError,
        flight_controls::FlightControlsCommandError,
        landing_gear::LandingGearCommandError,
        navigation::FlightPlanError,
        simulation::test::SimulationTestBed,
    };
    use uom::si::{
        angle::degree, length::foot, pressure::hectopascal, ratio::ratio,
        velocity::foot_per_minute,
    };

    #[test]
    fn engine_start_without_bleed_air_is_rejected() {
        let mut aircraft = a320();
        let mut test_bed = parked();
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(
            aircraft.start_engine(1),
            Err(A320CommandError::Engine(
                EngineCommandError::InsufficientBleedAir(1)
            ))
        );
        run(&mut test_bed, &mut aircraft, 1);
        assert_eq!(aircraft.engine(1).unwrap().state(), EngineState::Off);
    }

    #[test]
    fn engine_start_succeeds_with_apu_bleed_air() {
        let mut aircraft = a320();
        let mut test_bed = parked();
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(aircraft.start_apu(), Ok(()));
        aircraft.set_apu_bleed(true);
        run(&mut test_bed, &mut aircraft, 60);
        assert!(aircraft.apu().is_available());

        assert_eq!(aircraft.start_engine(1), Ok(()));
        assert_eq!(aircraft.engine(1).unwrap().state(), EngineState::Spooling);
    }

    #[test]
    fn apu_start_is_rejected_without_electrical_power() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.start_apu(),
            Err(A320CommandError::Apu(ApuCommandError::NoElectricalPower))
        );
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.start_engine(3),
            Err(A320CommandError::UnknownEngine(3))
        );
        assert!(aircraft.engine(3).is_none());
    }

    #[test]
    fn approach_without_localizer_is_rejected() {
        let mut aircraft = a320();
        let mut test_bed = SimulationTestBed::new();
        aircraft.engage_autopilot();
        run(&mut test_bed, &mut aircraft, 1);
        let modes = aircraft.autopilot().modes();

        assert_eq!(
            aircraft.select_lateral_mode(LateralMode::Localizer),
            Err(A320CommandError::Mode(ModeRejection::LocalizerNotCaptured))
        );
        assert_eq!(
            aircraft.select_vertical_mode(VerticalMode::Approach),
            Err(A320CommandError::Mode(
                ModeRejection::ApproachRequiresLocalizer
            ))
        );
        assert_eq!(aircraft.autopilot().modes(), modes);
    }

    #[test]
    fn approach_within_capture_thresholds_is_accepted() {
        let mut aircraft = a320();
        let mut test_bed = SimulationTestBed::new()
            .localizer_deviation(Some(Angle::new::<degree>(0.5)))
            .glideslope_deviation(Some(Length::new::<foot>(40.)));
        aircraft.engage_autopilot();
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(aircraft.select_lateral_mode(LateralMode::Localizer), Ok(()));
        assert_eq!(aircraft.select_vertical_mode(VerticalMode::Approach), Ok(()));
        assert_eq!(
            aircraft.autopilot().modes(),
            Modes::new(LateralMode::Localizer, VerticalMode::Approach)
        );
    }

    #[test]
    fn vnav_without_constraints_keeps_its_target() {
        let mut aircraft = a320();
        let mut test_bed =
            SimulationTestBed::new().vertical_speed(Velocity::new::<foot_per_minute>(-500.));
        aircraft.engage_autopilot();
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(aircraft.select_vertical_mode(VerticalMode::Vnav), Ok(()));
        for _ in 0..5 {
            run(&mut test_bed, &mut aircraft, 1);
            assert_about_eq!(
                aircraft
                    .autopilot()
                    .vnav_vertical_speed()
                    .get::<foot_per_minute>(),
                -500.
            );
        }
    }

    #[test]
    fn direct_to_resumes_sequencing_from_the_selected_waypoint() {
        let mut aircraft = a320();
        let mut test_bed = SimulationTestBed::new()
            .position(Angle::new::<degree>(0.), Angle::new::<degree>(-0.5));
        aircraft.load_flight_plan(
            (0..4)
                .map(|index| {
                    Waypoint::new(
                        &format!("WPT{}", index),
                        Angle::new::<degree>(0.),
                        Angle::new::<degree>(index as f64),
                    )
                })
                .collect(),
        );

        assert_eq!(aircraft.direct_to(2), Ok(()));
        assert_eq!(aircraft.flight_plan().active_index(), Some(2));

        test_bed.set_position(Angle::new::<degree>(0.), Angle::new::<degree>(1.));
        run(&mut test_bed, &mut aircraft, 1);
        assert_eq!(aircraft.flight_plan().active_index(), Some(2));

        test_bed.set_position(Angle::new::<degree>(0.), Angle::new::<degree>(2.));
        run(&mut test_bed, &mut aircraft, 1);
        assert_eq!(aircraft.flight_plan().active_index(), Some(3));
    }

    #[test]
    fn out_of_range_plan_edits_are_rejected() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.delete_waypoint(0),
            Err(A320CommandError::FlightPlan(
                FlightPlanError::IndexOutOfRange {
                    index: 0,
                    length: 0
                }
            ))
        );
    }

    #[test]
    fn fire_agent_requires_a_released_push_button() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.discharge_fire_agent(FireZoneId::Engine(1)),
            Err(A320CommandError::Fire(
                FireCommandError::PushButtonNotReleased(FireZoneId::Engine(1))
            ))
        );
        assert_eq!(
            aircraft.release_fire_push_button(FireZoneId::Engine(1)),
            Ok(())
        );
        assert_eq!(aircraft.discharge_fire_agent(FireZoneId::Engine(1)), Ok(()));
    }

    #[test]
    fn invalid_autobrake_level_is_rejected() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.set_autobrake_level(7),
            Err(A320CommandError::Brakes(
                BrakeCommandError::InvalidAutobrakeLevel(7)
            ))
        );
        assert_eq!(aircraft.set_autobrake_level(3), Ok(()));
    }

    #[test]
    fn crossfeed_toggles() {
        let mut aircraft = a320();
        aircraft.toggle_crossfeed();

        assert!(aircraft.fuel().is_crossfeed_open());
    }

    #[test]
    fn reset_battery_recovers_a_failed_battery() {
        let mut aircraft = a320();
        let mut test_bed = parked();
        aircraft.force_failure(FailureId::Battery);
        run(&mut test_bed, &mut aircraft, 1);
        assert!(aircraft.battery().is_failed());

        aircraft.reset_battery();
        run(&mut test_bed, &mut aircraft, 1);

        assert!(!aircraft.battery().is_failed());
        assert!(!aircraft
            .failure_injector()
            .active_failures()
            .any(|id| *id == FailureId::Battery));
    }

    #[test]
    fn reset_anti_ice_recovers_only_the_given_zone() {
        let mut aircraft = a320();
        let mut test_bed = SimulationTestBed::new();
        aircraft.force_failure(FailureId::WingAntiIce);
        aircraft.force_failure(FailureId::EngineAntiIce(1));
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(aircraft.reset_anti_ice(AntiIceZone::EngineInlet(1)), Ok(()));
        run(&mut test_bed, &mut aircraft, 1);

        assert!(!aircraft.engine_anti_ice_push_button(1).unwrap().has_fault());
        assert!(aircraft.wing_anti_ice_push_button().has_fault());

        assert_eq!(aircraft.reset_anti_ice(AntiIceZone::Wing), Ok(()));
        run(&mut test_bed, &mut aircraft, 1);

        assert!(!aircraft.wing_anti_ice_push_button().has_fault());
    }

    #[test]
    fn reset_anti_ice_of_unknown_engine_is_rejected() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.reset_anti_ice(AntiIceZone::EngineInlet(3)),
            Err(A320CommandError::UnknownEngine(3))
        );
    }

    #[test]
    fn gear_retraction_on_the_ground_is_rejected() {
        let mut aircraft = a320();
        let mut test_bed = parked();
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(
            aircraft.set_gear_down(false),
            Err(A320CommandError::LandingGear(
                LandingGearCommandError::RetractionOnGround
            ))
        );
        assert!(aircraft.landing_gear().is_lever_down());
    }

    #[test]
    fn gear_selection_hands_the_systems_back_to_the_crew() {
        let mut aircraft = a320();
        let mut test_bed = SimulationTestBed::new();
        aircraft.set_systems_automation(true);
        run(&mut test_bed, &mut aircraft, 1);

        assert_eq!(aircraft.set_gear_down(true), Ok(()));
        run(&mut test_bed, &mut aircraft, 1);

        assert!(!aircraft.flight_controls().is_systems_automation_enabled());
        assert!(aircraft.landing_gear().is_lever_down());
    }

    #[test]
    fn out_of_range_surface_settings_are_rejected() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.set_flaps(2.),
            Err(A320CommandError::FlightControls(
                FlightControlsCommandError::OutOfRange {
                    surface: "flap",
                    value: 2.
                }
            ))
        );
        assert_eq!(aircraft.set_speedbrake(0.5), Ok(()));
        assert_about_eq!(
            aircraft
                .flight_controls()
                .speedbrake()
                .commanded()
                .get::<ratio>(),
            0.5
        );
    }

    #[test]
    fn altimeter_setting_is_validated() {
        let mut aircraft = a320();

        assert_eq!(
            aircraft.set_altimeter(700.),
            Err(A320CommandError::Altimeter(
                AltimeterCommandError::OutOfRange(700.)
            ))
        );
        assert_eq!(aircraft.set_altimeter(1020.), Ok(()));
        assert_about_eq!(
            aircraft.altimeter().setting().get::<hectopascal>(),
            1020.
        );
    }
}
