//! The autopilot and autothrottle. Modes follow the transition function in [`modes`].
//! Every axis is closed with its own PID controller. The resulting surface commands are
//! limited by the available hydraulic authority.
use crate::{
    navigation::{Guidance, VerticalConstraint},
    simulation::{SimulationElement, SimulatorWriter, UpdateContext},
};
use log::{debug, info};
use std::time::Duration;
use uom::si::{
    angle::degree,
    f64::*,
    length::{foot, nautical_mile},
    ratio::ratio,
    velocity::{foot_per_minute, knot},
};

mod autothrottle;
pub mod modes;
mod pid;

pub use autothrottle::Autothrottle;
pub use modes::{
    transition, ContinuousState, LateralMode, ModeEvent, ModeRejection, Modes, Transition,
    VerticalMode,
};
pub use pid::PidController;

pub struct AutopilotUpdateArguments {
    hydraulic_authority: Ratio,
    guidance: Option<Guidance>,
    vertical_constraint: Option<VerticalConstraint>,
}
impl AutopilotUpdateArguments {
    pub fn new(
        hydraulic_authority: Ratio,
        guidance: Option<Guidance>,
        vertical_constraint: Option<VerticalConstraint>,
    ) -> Self {
        Self {
            hydraulic_authority,
            guidance,
            vertical_constraint,
        }
    }
}

/// A normalized surface command which moves no faster than its rate limit.
struct SurfaceCommand {
    id: &'static str,
    limit: f64,
    value: f64,
}
impl SurfaceCommand {
    const RATE_PER_SECOND: f64 = 0.5;

    fn new(id: &'static str, limit: f64) -> Self {
        Self {
            id,
            limit,
            value: 0.,
        }
    }

    /// The rate and the deflection are both proportional to the authority.
    /// Without authority the command is zero.
    fn update(&mut self, demand: f64, authority: f64, delta: Duration) {
        let authority = authority.max(0.).min(1.);
        let maximum = self.limit * authority;
        let step = SurfaceCommand::RATE_PER_SECOND * authority * delta.as_secs_f64();
        let target = demand.max(-self.limit).min(self.limit) * authority;

        self.value = (self.value + (target - self.value).max(-step).min(step))
            .max(-maximum)
            .min(maximum);
    }

    fn value(&self) -> f64 {
        self.value
    }
}

pub struct Autopilot {
    modes: Modes,
    state: ContinuousState,
    altitude: Length,
    vertical_speed: Velocity,
    selected_altitude: Length,
    capture_altitude: Length,
    held_altitude: Length,
    selected_heading: Angle,
    selected_speed: Velocity,
    selected_vertical_speed: Velocity,
    vnav_vertical_speed: Velocity,
    heading_pid: PidController,
    localizer_pid: PidController,
    altitude_pid: PidController,
    glideslope_pid: PidController,
    vertical_speed_pid: PidController,
    aileron: SurfaceCommand,
    elevator: SurfaceCommand,
    autothrottle: Autothrottle,
}
impl Autopilot {
    pub const MAXIMUM_VNAV_CLIMB_FEET_PER_MINUTE: f64 = 2500.;
    pub const MAXIMUM_VNAV_DESCENT_FEET_PER_MINUTE: f64 = 3000.;
    const MAXIMUM_VERTICAL_SPEED_FEET_PER_MINUTE: f64 = 3000.;
    const GLIDESLOPE_ANGLE_DEGREES: f64 = 3.;
    const FEET_PER_MINUTE_PER_KNOT: f64 = 101.269;
    const CONSTRAINT_PASSED_FEET: f64 = 20.;

    pub fn new() -> Self {
        Self {
            modes: Modes::off(),
            state: ContinuousState::default(),
            altitude: Length::new::<foot>(0.),
            vertical_speed: Velocity::new::<foot_per_minute>(0.),
            selected_altitude: Length::new::<foot>(0.),
            capture_altitude: Length::new::<foot>(0.),
            held_altitude: Length::new::<foot>(0.),
            selected_heading: Angle::new::<degree>(0.),
            selected_speed: Velocity::new::<knot>(250.),
            selected_vertical_speed: Velocity::new::<foot_per_minute>(0.),
            vnav_vertical_speed: Velocity::new::<foot_per_minute>(0.),
            heading_pid: PidController::new(0.02, 0., 0.).with_output_limit(0.3),
            localizer_pid: PidController::new(0.15, 0.005, 0.)
                .with_integral_limit(0.05)
                .with_output_limit(0.3),
            // The altitude loop captures within the look ahead time.
            altitude_pid: PidController::new(
                60. / modes::ALTITUDE_CAPTURE_LOOK_AHEAD_SECONDS,
                0.,
                0.,
            )
            .with_output_limit(Autopilot::MAXIMUM_VERTICAL_SPEED_FEET_PER_MINUTE),
            glideslope_pid: PidController::new(5., 0., 0.).with_output_limit(1000.),
            vertical_speed_pid: PidController::new(0.005, 0.0005, 0.)
                .with_integral_limit(0.1)
                .with_output_limit(0.5),
            aileron: SurfaceCommand::new("AUTOPILOT_AILERON_COMMAND", 0.3),
            elevator: SurfaceCommand::new("AUTOPILOT_ELEVATOR_COMMAND", 0.5),
            autothrottle: Autothrottle::new(),
        }
    }

    /// Engages in heading and altitude hold unless already engaged.
    pub fn engage(&mut self) {
        self.apply_automatic(ModeEvent::Engage);
    }

    pub fn disengage(&mut self) {
        self.apply_automatic(ModeEvent::Disengage);
    }

    pub fn select_lateral_mode(&mut self, mode: LateralMode) -> Result<(), ModeRejection> {
        self.apply(ModeEvent::SelectLateral(mode))
    }

    pub fn select_vertical_mode(&mut self, mode: VerticalMode) -> Result<(), ModeRejection> {
        self.apply(ModeEvent::SelectVertical(mode))
    }

    pub fn engage_autothrottle(&mut self, current_throttle: Ratio) {
        self.autothrottle.engage(current_throttle);
    }

    pub fn disengage_autothrottle(&mut self) {
        self.autothrottle.disengage();
    }

    pub fn set_target_altitude(&mut self, altitude: Length) {
        self.selected_altitude = altitude;
    }

    pub fn set_target_heading(&mut self, heading: Angle) {
        self.selected_heading = Angle::new::<degree>(heading.get::<degree>().rem_euclid(360.));
    }

    pub fn set_target_speed(&mut self, speed: Velocity) {
        self.selected_speed = speed;
    }

    pub fn set_target_vertical_speed(&mut self, vertical_speed: Velocity) {
        self.selected_vertical_speed = vertical_speed;
    }

    /// Mode changes are evaluated against the state of the latest update.
    fn apply(&mut self, event: ModeEvent) -> Result<(), ModeRejection> {
        match transition(self.modes, event, &self.state) {
            Transition::Accepted(modes) => {
                self.enter(modes);
                Ok(())
            }
            Transition::Rejected(rejection) => {
                debug!("Rejected {:?} in {:?}: {}.", event, self.modes, rejection);
                Err(rejection)
            }
        }
    }

    /// Applies an event which is never rejected.
    fn apply_automatic(&mut self, event: ModeEvent) {
        if let Transition::Accepted(modes) = transition(self.modes, event, &self.state) {
            self.enter(modes);
        }
    }

    fn enter(&mut self, modes: Modes) {
        if modes.lateral() != self.modes.lateral() {
            info!(
                "Lateral mode {:?} -> {:?}.",
                self.modes.lateral(),
                modes.lateral()
            );
            self.heading_pid.reset();
            self.localizer_pid.reset();
        }

        if modes.vertical() != self.modes.vertical() {
            info!(
                "Vertical mode {:?} -> {:?}.",
                self.modes.vertical(),
                modes.vertical()
            );
            self.altitude_pid.reset();
            self.glideslope_pid.reset();
            self.vertical_speed_pid.reset();

            match modes.vertical() {
                VerticalMode::AltitudeHold
                    if self.modes.vertical() == VerticalMode::AltitudeCapture =>
                {
                    self.held_altitude = self.capture_altitude;
                }
                VerticalMode::AltitudeHold => self.held_altitude = self.altitude,
                VerticalMode::Vnav => self.vnav_vertical_speed = self.vertical_speed,
                _ => {}
            }
        }

        self.modes = modes;
    }

    pub fn update(&mut self, context: &UpdateContext, arguments: &AutopilotUpdateArguments) {
        self.altitude = context.indicated_altitude();
        self.vertical_speed = context.vertical_speed();
        if self.modes.vertical() != VerticalMode::AltitudeCapture {
            self.capture_altitude = Autopilot::capture_altitude_for(
                self.altitude,
                self.selected_altitude,
                arguments.vertical_constraint,
            );
        }
        self.state = ContinuousState::new(
            self.capture_altitude - self.altitude,
            context.vertical_speed(),
            context.localizer_deviation(),
            context.glideslope_deviation(),
        );
        self.apply_automatic(ModeEvent::Update);

        let authority = arguments.hydraulic_authority.get::<ratio>();
        let aileron = self.lateral_demand(context, arguments);
        let elevator = self.vertical_demand(context, arguments);
        self.aileron.update(aileron, authority, context.delta());
        self.elevator.update(elevator, authority, context.delta());

        self.autothrottle.update(context, self.selected_speed);
    }

    fn lateral_demand(
        &mut self,
        context: &UpdateContext,
        arguments: &AutopilotUpdateArguments,
    ) -> f64 {
        match self.modes.lateral() {
            LateralMode::Off => 0.,
            LateralMode::Heading => self.track_demand(context, self.selected_heading),
            LateralMode::Nav => {
                let track = arguments
                    .guidance
                    .map_or(self.selected_heading, |guidance| guidance.desired_track());
                self.track_demand(context, track)
            }
            LateralMode::Localizer => {
                // Positive deviation means the localizer course lies to the right.
                let deviation = context
                    .localizer_deviation()
                    .map_or(0., |deviation| deviation.get::<degree>());
                self.localizer_pid.update(deviation, context.delta())
            }
        }
    }

    fn track_demand(&mut self, context: &UpdateContext, track: Angle) -> f64 {
        let error = (track - context.heading()).get::<degree>();
        let error = (error + 180.).rem_euclid(360.) - 180.;
        self.heading_pid.update(error, context.delta())
    }

    fn vertical_demand(
        &mut self,
        context: &UpdateContext,
        arguments: &AutopilotUpdateArguments,
    ) -> f64 {
        let target = match self.modes.vertical() {
            VerticalMode::Off => return 0.,
            VerticalMode::VerticalSpeed => self.selected_vertical_speed,
            VerticalMode::AltitudeCapture => {
                self.altitude_vertical_speed(context, self.capture_altitude)
            }
            VerticalMode::AltitudeHold => self.altitude_vertical_speed(context, self.held_altitude),
            VerticalMode::Vnav => {
                if let Some(vertical_speed) =
                    Autopilot::vnav_vertical_speed_for(context, arguments.vertical_constraint)
                {
                    self.vnav_vertical_speed = vertical_speed;
                }
                self.vnav_vertical_speed
            }
            VerticalMode::Approach => self.glideslope_vertical_speed(context),
        };

        let error = (target - context.vertical_speed()).get::<foot_per_minute>() / 60.;
        self.vertical_speed_pid.update(error, context.delta())
    }

    /// A constrained altitude between the aircraft and the selected altitude is captured
    /// first. Once the aircraft is at the constraint, it no longer stops a climb or descent
    /// towards the selected altitude.
    fn capture_altitude_for(
        altitude: Length,
        selected_altitude: Length,
        constraint: Option<VerticalConstraint>,
    ) -> Length {
        match constraint.map(|constraint| constraint.altitude()) {
            Some(constrained)
                if (constrained - altitude).get::<foot>().abs()
                    >= Autopilot::CONSTRAINT_PASSED_FEET
                    && (constrained - altitude).get::<foot>()
                        * (selected_altitude - constrained).get::<foot>()
                        >= 0. =>
            {
                constrained
            }
            _ => selected_altitude,
        }
    }

    fn altitude_vertical_speed(&mut self, context: &UpdateContext, altitude: Length) -> Velocity {
        let error = (altitude - context.indicated_altitude()).get::<foot>();
        Velocity::new::<foot_per_minute>(self.altitude_pid.update(error, context.delta()))
    }

    /// The nominal descent along a three degree glideslope, corrected for the deviation.
    /// A positive deviation means the aircraft is above the glideslope.
    fn glideslope_vertical_speed(&mut self, context: &UpdateContext) -> Velocity {
        let nominal = -context.indicated_airspeed().get::<knot>()
            * Autopilot::FEET_PER_MINUTE_PER_KNOT
            * Autopilot::GLIDESLOPE_ANGLE_DEGREES.to_radians().tan();
        let deviation = context
            .glideslope_deviation()
            .map_or(0., |deviation| deviation.get::<foot>());

        Velocity::new::<foot_per_minute>(
            nominal + self.glideslope_pid.update(-deviation, context.delta()),
        )
    }

    /// The vertical speed which reaches the next constrained altitude at the constrained
    /// waypoint. Without a constraint ahead there is nothing to compute.
    fn vnav_vertical_speed_for(
        context: &UpdateContext,
        constraint: Option<VerticalConstraint>,
    ) -> Option<Velocity> {
        let constraint = constraint?;
        let speed = context.indicated_airspeed().get::<knot>();
        let distance = constraint.distance().get::<nautical_mile>();
        if speed <= 0. || distance <= 0. {
            return None;
        }

        let minutes = distance / speed * 60.;
        let feet_per_minute = (constraint.altitude() - context.indicated_altitude()).get::<foot>()
            / minutes;

        Some(Velocity::new::<foot_per_minute>(
            feet_per_minute
                .max(-Autopilot::MAXIMUM_VNAV_DESCENT_FEET_PER_MINUTE)
                .min(Autopilot::MAXIMUM_VNAV_CLIMB_FEET_PER_MINUTE),
        ))
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn is_engaged(&self) -> bool {
        self.modes.is_engaged()
    }

    pub fn selected_altitude(&self) -> Length {
        self.selected_altitude
    }

    /// The altitude the next altitude capture levels off at.
    pub fn capture_altitude(&self) -> Length {
        self.capture_altitude
    }

    pub fn vnav_vertical_speed(&self) -> Velocity {
        self.vnav_vertical_speed
    }

    pub fn aileron_command(&self) -> f64 {
        self.aileron.value()
    }

    pub fn elevator_command(&self) -> f64 {
        self.elevator.value()
    }

    pub fn autothrottle(&self) -> &Autothrottle {
        &self.autothrottle
    }
}
impl SimulationElement for Autopilot {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool("AUTOPILOT_ENGAGED", self.is_engaged());
        writer.write_f64(
            "AUTOPILOT_LATERAL_MODE",
            self.modes.lateral() as u8 as f64,
        );
        writer.write_f64(
            "AUTOPILOT_VERTICAL_MODE",
            self.modes.vertical() as u8 as f64,
        );
        writer.write_f64(
            "AUTOPILOT_SELECTED_ALTITUDE",
            self.selected_altitude.get::<foot>(),
        );
        writer.write_f64(
            "AUTOPILOT_SELECTED_HEADING",
            self.selected_heading.get::<degree>(),
        );
        writer.write_f64("AUTOPILOT_SELECTED_SPEED", self.selected_speed.get::<knot>());
        writer.write_f64(
            "AUTOPILOT_VNAV_VERTICAL_SPEED",
            self.vnav_vertical_speed.get::<foot_per_minute>(),
        );
        writer.write_f64(self.aileron.id, self.aileron.value());
        writer.write_f64(self.elevator.id, self.elevator.value());
        writer.write_bool("AUTOTHROTTLE_ENGAGED", self.autothrottle.is_engaged());
        writer.write_f64(
            "AUTOTHROTTLE_THROTTLE",
            self.autothrottle.throttle().get::<ratio>(),
        );
    }
}
impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}
