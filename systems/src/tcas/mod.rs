//! Traffic collision avoidance. Traffic is provided by the environment as a set of
//! positions. The closest intruder within the alert volume raises a traffic advisory,
//! or a resolution advisory once it comes closer still.
use crate::{
    navigation::bearing_and_distance,
    simulation::{SimulationElement, SimulatorWriter, UpdateContext},
};
use log::info;
use uom::si::{
    angle::degree,
    f64::*,
    length::{foot, nautical_mile},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficTarget {
    latitude: Angle,
    longitude: Angle,
    altitude: Length,
}
impl TrafficTarget {
    pub fn new(latitude: Angle, longitude: Angle, altitude: Length) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolutionSense {
    Climb,
    Descend,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AdvisoryKind {
    Traffic,
    Resolution(ResolutionSense),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrafficAdvisory {
    kind: AdvisoryKind,
    bearing: Angle,
    distance: Length,
    /// Positive when the intruder is above.
    relative_altitude: Length,
}
impl TrafficAdvisory {
    pub fn kind(&self) -> AdvisoryKind {
        self.kind
    }

    pub fn bearing(&self) -> Angle {
        self.bearing
    }

    pub fn distance(&self) -> Length {
        self.distance
    }

    pub fn relative_altitude(&self) -> Length {
        self.relative_altitude
    }

    pub fn is_resolution(&self) -> bool {
        matches!(self.kind, AdvisoryKind::Resolution(_))
    }

    fn severity(&self) -> u8 {
        match self.kind {
            AdvisoryKind::Traffic => 1,
            AdvisoryKind::Resolution(_) => 2,
        }
    }
}

pub struct TrafficCollisionAvoidance {
    traffic: Vec<TrafficTarget>,
    advisory: Option<TrafficAdvisory>,
}
impl TrafficCollisionAvoidance {
    pub const TRAFFIC_ADVISORY_DISTANCE_NAUTICAL_MILES: f64 = 5.;
    pub const TRAFFIC_ADVISORY_ALTITUDE_FEET: f64 = 1000.;
    pub const RESOLUTION_ADVISORY_DISTANCE_NAUTICAL_MILES: f64 = 2.;
    pub const RESOLUTION_ADVISORY_ALTITUDE_FEET: f64 = 600.;

    pub fn new() -> Self {
        Self {
            traffic: Vec::new(),
            advisory: None,
        }
    }

    pub fn set_traffic(&mut self, traffic: Vec<TrafficTarget>) {
        self.traffic = traffic;
    }

    pub fn add_target(&mut self, target: TrafficTarget) {
        self.traffic.push(target);
    }

    pub fn traffic(&self) -> &[TrafficTarget] {
        &self.traffic
    }

    /// Advisories are inhibited on the ground.
    pub fn update(&mut self, context: &UpdateContext) {
        let advisory = if context.is_on_ground() {
            None
        } else {
            self.traffic
                .iter()
                .filter_map(|target| TrafficCollisionAvoidance::assess(context, target))
                .fold(None, |most_severe: Option<TrafficAdvisory>, advisory| {
                    match most_severe {
                        Some(current)
                            if current.severity() > advisory.severity()
                                || (current.severity() == advisory.severity()
                                    && current.distance <= advisory.distance) =>
                        {
                            Some(current)
                        }
                        _ => Some(advisory),
                    }
                })
        };

        if advisory.map(|advisory| advisory.kind) != self.advisory.map(|advisory| advisory.kind) {
            match advisory {
                Some(advisory) => info!(
                    "TCAS {:?} advisory, intruder {:.1} NM {:.0} ft.",
                    advisory.kind,
                    advisory.distance.get::<nautical_mile>(),
                    advisory.relative_altitude.get::<foot>()
                ),
                None => info!("TCAS clear of conflict."),
            }
        }

        self.advisory = advisory;
    }

    fn assess(context: &UpdateContext, target: &TrafficTarget) -> Option<TrafficAdvisory> {
        let (bearing, distance) = bearing_and_distance(
            context.latitude(),
            context.longitude(),
            target.latitude,
            target.longitude,
        );
        let relative_altitude = target.altitude - context.indicated_altitude();
        let separation = relative_altitude.get::<foot>().abs();
        let distance_nautical_miles = distance.get::<nautical_mile>();

        let kind = if distance_nautical_miles
            <= TrafficCollisionAvoidance::RESOLUTION_ADVISORY_DISTANCE_NAUTICAL_MILES
            && separation <= TrafficCollisionAvoidance::RESOLUTION_ADVISORY_ALTITUDE_FEET
        {
            AdvisoryKind::Resolution(if relative_altitude.get::<foot>() > 0. {
                ResolutionSense::Descend
            } else {
                ResolutionSense::Climb
            })
        } else if distance_nautical_miles
            <= TrafficCollisionAvoidance::TRAFFIC_ADVISORY_DISTANCE_NAUTICAL_MILES
            && separation <= TrafficCollisionAvoidance::TRAFFIC_ADVISORY_ALTITUDE_FEET
        {
            AdvisoryKind::Traffic
        } else {
            return None;
        };

        Some(TrafficAdvisory {
            kind,
            bearing,
            distance,
            relative_altitude,
        })
    }

    pub fn advisory(&self) -> Option<TrafficAdvisory> {
        self.advisory
    }

    pub fn has_traffic_advisory(&self) -> bool {
        matches!(
            self.advisory,
            Some(TrafficAdvisory {
                kind: AdvisoryKind::Traffic,
                ..
            })
        )
    }

    pub fn has_resolution_advisory(&self) -> bool {
        self.advisory.map_or(false, |advisory| advisory.is_resolution())
    }
}
impl SimulationElement for TrafficCollisionAvoidance {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(
            "TCAS_ADVISORY",
            self.advisory.map_or(0., |advisory| advisory.severity() as f64),
        );
        writer.write_f64(
            "TCAS_RESOLUTION_SENSE",
            match self.advisory.map(|advisory| advisory.kind) {
                Some(AdvisoryKind::Resolution(ResolutionSense::Climb)) => 1.,
                Some(AdvisoryKind::Resolution(ResolutionSense::Descend)) => -1.,
                _ => 0.,
            },
        );
        if let Some(advisory) = self.advisory {
            writer.write_f64("TCAS_BEARING", advisory.bearing.get::<degree>());
            writer.write_f64("TCAS_DISTANCE", advisory.distance.get::<nautical_mile>());
            writer.write_f64(
                "TCAS_RELATIVE_ALTITUDE",
                advisory.relative_altitude.get::<foot>(),
            );
        }
    }
}
impl Default for TrafficCollisionAvoidance {
    fn default() -> Self {
        Self::new()
    }
}
