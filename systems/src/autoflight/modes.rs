//! The autopilot mode logic as a pure transition function. Pilot selections are
//! either accepted or rejected with a reason. Captures happen on [`ModeEvent::Update`].
use thiserror::Error;
use uom::si::{angle::degree, f64::*, length::foot, velocity::foot_per_minute};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LateralMode {
    Off = 0,
    Heading = 1,
    Nav = 2,
    Localizer = 3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VerticalMode {
    Off = 0,
    VerticalSpeed = 1,
    AltitudeHold = 2,
    AltitudeCapture = 3,
    Vnav = 4,
    Approach = 5,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Modes {
    lateral: LateralMode,
    vertical: VerticalMode,
}
impl Modes {
    pub fn new(lateral: LateralMode, vertical: VerticalMode) -> Self {
        Self { lateral, vertical }
    }

    pub fn off() -> Self {
        Self::new(LateralMode::Off, VerticalMode::Off)
    }

    pub fn lateral(&self) -> LateralMode {
        self.lateral
    }

    pub fn vertical(&self) -> VerticalMode {
        self.vertical
    }

    pub fn is_engaged(&self) -> bool {
        self.lateral != LateralMode::Off || self.vertical != VerticalMode::Off
    }
}
impl Default for Modes {
    fn default() -> Self {
        Self::off()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ModeEvent {
    Engage,
    Disengage,
    SelectLateral(LateralMode),
    SelectVertical(VerticalMode),
    /// Evaluates the automatic captures against the latest continuous state.
    Update,
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ModeRejection {
    #[error("the localizer is not within capture range")]
    LocalizerNotCaptured,
    #[error("the glideslope is not within capture range")]
    GlideslopeNotCaptured,
    #[error("approach mode requires the localizer mode")]
    ApproachRequiresLocalizer,
    #[error("{0:?} can only be entered automatically")]
    AutomaticModeOnly(VerticalMode),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    Accepted(Modes),
    Rejected(ModeRejection),
}

/// The numeric state the transitions depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContinuousState {
    altitude_error: Length,
    vertical_speed: Velocity,
    localizer_deviation: Option<Angle>,
    glideslope_deviation: Option<Length>,
}
impl ContinuousState {
    /// The altitude error is the selected altitude minus the current altitude.
    pub fn new(
        altitude_error: Length,
        vertical_speed: Velocity,
        localizer_deviation: Option<Angle>,
        glideslope_deviation: Option<Length>,
    ) -> Self {
        Self {
            altitude_error,
            vertical_speed,
            localizer_deviation,
            glideslope_deviation,
        }
    }

    fn is_localizer_captured(&self) -> bool {
        self.localizer_deviation.map_or(false, |deviation| {
            deviation.get::<degree>().abs() < LOCALIZER_CAPTURE_DEGREES
        })
    }

    fn is_glideslope_captured(&self) -> bool {
        self.glideslope_deviation.map_or(false, |deviation| {
            deviation.get::<foot>().abs() < GLIDESLOPE_CAPTURE_FEET
        })
    }

    /// Capture starts once the altitude error is within the distance covered at the current
    /// vertical speed during the look ahead time, while moving towards the selected altitude.
    fn should_capture_altitude(&self) -> bool {
        let error = self.altitude_error.get::<foot>();
        let vertical_speed = self.vertical_speed.get::<foot_per_minute>();
        let threshold = (vertical_speed.abs() * ALTITUDE_CAPTURE_LOOK_AHEAD_SECONDS / 60.)
            .max(MINIMUM_ALTITUDE_CAPTURE_FEET);

        error.abs() < ALTITUDE_HOLD_DEADBAND_FEET
            || (error.abs() <= threshold && error * vertical_speed > 0.)
    }

    fn is_altitude_acquired(&self) -> bool {
        self.altitude_error.get::<foot>().abs() < ALTITUDE_HOLD_DEADBAND_FEET
            && self.vertical_speed.get::<foot_per_minute>().abs()
                < ALTITUDE_HOLD_MAXIMUM_CLOSURE_FEET_PER_MINUTE
    }
}
impl Default for ContinuousState {
    fn default() -> Self {
        Self::new(
            Length::new::<foot>(0.),
            Velocity::new::<foot_per_minute>(0.),
            None,
            None,
        )
    }
}

pub const LOCALIZER_CAPTURE_DEGREES: f64 = 1.5;
pub const GLIDESLOPE_CAPTURE_FEET: f64 = 150.;
pub const ALTITUDE_CAPTURE_LOOK_AHEAD_SECONDS: f64 = 10.;
const MINIMUM_ALTITUDE_CAPTURE_FEET: f64 = 50.;
const ALTITUDE_HOLD_DEADBAND_FEET: f64 = 20.;
const ALTITUDE_HOLD_MAXIMUM_CLOSURE_FEET_PER_MINUTE: f64 = 300.;

pub fn transition(current: Modes, event: ModeEvent, state: &ContinuousState) -> Transition {
    match event {
        ModeEvent::Engage if current.is_engaged() => Transition::Accepted(current),
        ModeEvent::Engage => Transition::Accepted(Modes::new(
            LateralMode::Heading,
            VerticalMode::AltitudeHold,
        )),
        ModeEvent::Disengage => Transition::Accepted(Modes::off()),
        ModeEvent::SelectLateral(lateral) => select_lateral(current, lateral, state),
        ModeEvent::SelectVertical(vertical) => select_vertical(current, vertical, state),
        ModeEvent::Update => Transition::Accepted(automatic(current, state)),
    }
}

fn select_lateral(current: Modes, lateral: LateralMode, state: &ContinuousState) -> Transition {
    if current.vertical == VerticalMode::Approach && lateral != LateralMode::Localizer {
        Transition::Rejected(ModeRejection::ApproachRequiresLocalizer)
    } else if lateral == LateralMode::Localizer
        && current.lateral != LateralMode::Localizer
        && !state.is_localizer_captured()
    {
        Transition::Rejected(ModeRejection::LocalizerNotCaptured)
    } else {
        Transition::Accepted(Modes::new(lateral, current.vertical))
    }
}

fn select_vertical(current: Modes, vertical: VerticalMode, state: &ContinuousState) -> Transition {
    match vertical {
        VerticalMode::AltitudeCapture => {
            Transition::Rejected(ModeRejection::AutomaticModeOnly(vertical))
        }
        VerticalMode::Approach if current.vertical != VerticalMode::Approach => {
            if current.lateral != LateralMode::Localizer {
                Transition::Rejected(ModeRejection::ApproachRequiresLocalizer)
            } else if !state.is_localizer_captured() {
                Transition::Rejected(ModeRejection::LocalizerNotCaptured)
            } else if !state.is_glideslope_captured() {
                Transition::Rejected(ModeRejection::GlideslopeNotCaptured)
            } else {
                Transition::Accepted(Modes::new(current.lateral, vertical))
            }
        }
        _ => Transition::Accepted(Modes::new(current.lateral, vertical)),
    }
}

fn automatic(current: Modes, state: &ContinuousState) -> Modes {
    let vertical = match current.vertical {
        VerticalMode::VerticalSpeed if state.should_capture_altitude() => {
            VerticalMode::AltitudeCapture
        }
        VerticalMode::AltitudeCapture if state.is_altitude_acquired() => {
            VerticalMode::AltitudeHold
        }
        vertical => vertical,
    };

    Modes::new(current.lateral, vertical)
}
