use super::SimulatorReader;
use std::time::Duration;
use uom::si::{
    angle::degree, f64::*, length::foot, ratio::ratio, thermodynamic_temperature::degree_celsius,
    velocity::foot_per_minute, velocity::knot,
};

/// Provides data unowned by any system in the aircraft system simulation
/// for the purpose of handling an update frame. This is the aircraft state
/// as provided by the flight dynamics engine at the start of a tick.
#[derive(Clone, Copy, Debug)]
pub struct UpdateContext {
    delta: Duration,
    indicated_airspeed: Velocity,
    indicated_altitude: Length,
    altitude_above_ground: Length,
    vertical_speed: Velocity,
    pitch: Angle,
    bank: Angle,
    heading: Angle,
    latitude: Angle,
    longitude: Angle,
    is_on_ground: bool,
    ambient_temperature: ThermodynamicTemperature,
    precipitation_rate: Ratio,
    localizer: Option<Angle>,
    glideslope: Option<Length>,
}
impl UpdateContext {
    pub const INDICATED_AIRSPEED_KEY: &'static str = "AIRSPEED INDICATED";
    pub const INDICATED_ALTITUDE_KEY: &'static str = "INDICATED ALTITUDE";
    pub const ALTITUDE_ABOVE_GROUND_KEY: &'static str = "PLANE ALT ABOVE GROUND";
    pub const VERTICAL_SPEED_KEY: &'static str = "VERTICAL SPEED";
    pub const PITCH_KEY: &'static str = "PLANE PITCH DEGREES";
    pub const BANK_KEY: &'static str = "PLANE BANK DEGREES";
    pub const HEADING_KEY: &'static str = "PLANE HEADING DEGREES TRUE";
    pub const LATITUDE_KEY: &'static str = "PLANE LATITUDE";
    pub const LONGITUDE_KEY: &'static str = "PLANE LONGITUDE";
    pub const IS_ON_GROUND_KEY: &'static str = "SIM ON GROUND";
    pub const AMBIENT_TEMPERATURE_KEY: &'static str = "AMBIENT TEMPERATURE";
    pub const PRECIPITATION_RATE_KEY: &'static str = "AMBIENT PRECIP RATE";
    pub const HAS_LOCALIZER_KEY: &'static str = "NAV HAS LOCALIZER";
    pub const LOCALIZER_DEVIATION_KEY: &'static str = "NAV LOCALIZER DEVIATION";
    pub const HAS_GLIDESLOPE_KEY: &'static str = "NAV HAS GLIDE SLOPE";
    pub const GLIDESLOPE_DEVIATION_KEY: &'static str = "NAV GLIDESLOPE DEVIATION";

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        delta: Duration,
        indicated_airspeed: Velocity,
        indicated_altitude: Length,
        altitude_above_ground: Length,
        vertical_speed: Velocity,
        pitch: Angle,
        bank: Angle,
        heading: Angle,
        latitude: Angle,
        longitude: Angle,
        is_on_ground: bool,
        ambient_temperature: ThermodynamicTemperature,
        precipitation_rate: Ratio,
        localizer: Option<Angle>,
        glideslope: Option<Length>,
    ) -> UpdateContext {
        UpdateContext {
            delta,
            indicated_airspeed,
            indicated_altitude,
            altitude_above_ground,
            vertical_speed,
            pitch,
            bank,
            heading,
            latitude,
            longitude,
            is_on_ground,
            ambient_temperature,
            precipitation_rate,
            localizer,
            glideslope,
        }
    }

    pub(super) fn from_reader(reader: &mut SimulatorReader, delta: Duration) -> UpdateContext {
        let localizer = if reader.read_bool(UpdateContext::HAS_LOCALIZER_KEY) {
            Some(Angle::new::<degree>(
                reader.read_f64(UpdateContext::LOCALIZER_DEVIATION_KEY),
            ))
        } else {
            None
        };
        let glideslope = if reader.read_bool(UpdateContext::HAS_GLIDESLOPE_KEY) {
            Some(Length::new::<foot>(
                reader.read_f64(UpdateContext::GLIDESLOPE_DEVIATION_KEY),
            ))
        } else {
            None
        };

        UpdateContext::new(
            delta,
            Velocity::new::<knot>(reader.read_f64(UpdateContext::INDICATED_AIRSPEED_KEY)),
            Length::new::<foot>(reader.read_f64(UpdateContext::INDICATED_ALTITUDE_KEY)),
            Length::new::<foot>(reader.read_f64(UpdateContext::ALTITUDE_ABOVE_GROUND_KEY)),
            Velocity::new::<foot_per_minute>(reader.read_f64(UpdateContext::VERTICAL_SPEED_KEY)),
            Angle::new::<degree>(reader.read_f64(UpdateContext::PITCH_KEY)),
            Angle::new::<degree>(reader.read_f64(UpdateContext::BANK_KEY)),
            Angle::new::<degree>(reader.read_f64(UpdateContext::HEADING_KEY)),
            Angle::new::<degree>(reader.read_f64(UpdateContext::LATITUDE_KEY)),
            Angle::new::<degree>(reader.read_f64(UpdateContext::LONGITUDE_KEY)),
            reader.read_bool(UpdateContext::IS_ON_GROUND_KEY),
            ThermodynamicTemperature::new::<degree_celsius>(
                reader.read_f64(UpdateContext::AMBIENT_TEMPERATURE_KEY),
            ),
            Ratio::new::<ratio>(
                reader
                    .read_f64(UpdateContext::PRECIPITATION_RATE_KEY)
                    .max(0.)
                    .min(1.),
            ),
            localizer,
            glideslope,
        )
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_as_secs_f64(&self) -> f64 {
        self.delta.as_secs_f64()
    }

    pub fn indicated_airspeed(&self) -> Velocity {
        self.indicated_airspeed
    }

    pub fn indicated_altitude(&self) -> Length {
        self.indicated_altitude
    }

    pub fn altitude_above_ground(&self) -> Length {
        self.altitude_above_ground
    }

    pub fn vertical_speed(&self) -> Velocity {
        self.vertical_speed
    }

    pub fn pitch(&self) -> Angle {
        self.pitch
    }

    pub fn bank(&self) -> Angle {
        self.bank
    }

    pub fn heading(&self) -> Angle {
        self.heading
    }

    pub fn latitude(&self) -> Angle {
        self.latitude
    }

    pub fn longitude(&self) -> Angle {
        self.longitude
    }

    pub fn is_on_ground(&self) -> bool {
        self.is_on_ground
    }

    pub fn ambient_temperature(&self) -> ThermodynamicTemperature {
        self.ambient_temperature
    }

    pub fn precipitation_rate(&self) -> Ratio {
        self.precipitation_rate
    }

    /// The localizer deviation, when a localizer signal is received.
    pub fn localizer_deviation(&self) -> Option<Angle> {
        self.localizer
    }

    /// The vertical glideslope deviation, when a glideslope signal is received.
    /// Positive when the aircraft is above the glideslope.
    pub fn glideslope_deviation(&self) -> Option<Length> {
        self.glideslope
    }
}
