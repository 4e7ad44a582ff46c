//! The flight plan and the lateral guidance derived from it.
use crate::simulation::{SimulationElement, SimulatorWriter, UpdateContext};
use itertools::Itertools;
use log::info;
use thiserror::Error;
use uom::si::{
    angle::{degree, radian},
    f64::*,
    length::{foot, nautical_mile},
};

const EARTH_RADIUS_NAUTICAL_MILES: f64 = 3440.065;

#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    ident: String,
    latitude: Angle,
    longitude: Angle,
    altitude_constraint: Option<Length>,
}
impl Waypoint {
    pub fn new(ident: &str, latitude: Angle, longitude: Angle) -> Self {
        Self {
            ident: ident.to_owned(),
            latitude,
            longitude,
            altitude_constraint: None,
        }
    }

    pub fn with_altitude_constraint(mut self, altitude: Length) -> Self {
        self.altitude_constraint = Some(altitude);
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn latitude(&self) -> Angle {
        self.latitude
    }

    pub fn longitude(&self) -> Angle {
        self.longitude
    }

    pub fn altitude_constraint(&self) -> Option<Length> {
        self.altitude_constraint
    }
}

/// Great circle initial bearing (0 to 360 degrees) and distance between two positions.
pub fn bearing_and_distance(
    from_latitude: Angle,
    from_longitude: Angle,
    to_latitude: Angle,
    to_longitude: Angle,
) -> (Angle, Length) {
    let lat1 = from_latitude.get::<radian>();
    let lat2 = to_latitude.get::<radian>();
    let delta_latitude = lat2 - lat1;
    let delta_longitude = (to_longitude - from_longitude).get::<radian>();

    let a = (delta_latitude / 2.).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_longitude / 2.).sin().powi(2);
    let c = 2. * a.sqrt().atan2((1. - a).max(0.).sqrt());

    let y = delta_longitude.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_longitude.cos();

    (
        Angle::new::<degree>(normalize_degrees(y.atan2(x).to_degrees())),
        Length::new::<nautical_mile>(EARTH_RADIUS_NAUTICAL_MILES * c),
    )
}

/// Cross track (positive right of course) and along track distance of a position
/// relative to the great circle leg between two positions.
fn cross_and_along_track(
    latitude: Angle,
    longitude: Angle,
    from: &Waypoint,
    to: &Waypoint,
) -> (Length, Length) {
    let (course, _) =
        bearing_and_distance(from.latitude, from.longitude, to.latitude, to.longitude);
    let (bearing, distance) =
        bearing_and_distance(from.latitude, from.longitude, latitude, longitude);

    let angular_distance = distance.get::<nautical_mile>() / EARTH_RADIUS_NAUTICAL_MILES;
    let relative_bearing = (bearing - course).get::<radian>();
    let cross_track = (angular_distance.sin() * relative_bearing.sin()).asin();
    // Negative when the position lies behind the start of the leg.
    let along_track = (angular_distance.cos() / cross_track.cos())
        .max(-1.)
        .min(1.)
        .acos()
        .copysign(relative_bearing.cos());

    (
        Length::new::<nautical_mile>(cross_track * EARTH_RADIUS_NAUTICAL_MILES),
        Length::new::<nautical_mile>(along_track * EARTH_RADIUS_NAUTICAL_MILES),
    )
}

fn normalize_degrees(degrees: f64) -> f64 {
    degrees.rem_euclid(360.)
}

#[derive(Debug, Error, PartialEq)]
pub enum FlightPlanError {
    #[error("waypoint index {index} is out of range for a flight plan of {length} waypoints")]
    IndexOutOfRange { index: usize, length: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Guidance {
    desired_track: Angle,
    cross_track: Length,
    distance_to_waypoint: Length,
}
impl Guidance {
    /// The track to fly, including the intercept towards the active leg.
    pub fn desired_track(&self) -> Angle {
        self.desired_track
    }

    pub fn cross_track(&self) -> Length {
        self.cross_track
    }

    pub fn distance_to_waypoint(&self) -> Length {
        self.distance_to_waypoint
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerticalConstraint {
    altitude: Length,
    distance: Length,
}
impl VerticalConstraint {
    pub fn altitude(&self) -> Length {
        self.altitude
    }

    /// The along route distance from the aircraft to the constrained waypoint.
    pub fn distance(&self) -> Length {
        self.distance
    }
}

/// An ordered sequence of waypoints. The active waypoint is the one being flown
/// towards. Sequencing only ever moves the active waypoint forwards. Once the last
/// waypoint is sequenced the plan is complete and guidance holds the last leg.
pub struct FlightPlan {
    waypoints: Vec<Waypoint>,
    active: Option<usize>,
    direct: bool,
    guidance: Option<Guidance>,
    vertical_constraint: Option<VerticalConstraint>,
}
impl FlightPlan {
    pub const CAPTURE_RADIUS_NAUTICAL_MILES: f64 = 1.;
    const CROSS_TRACK_GAIN_DEGREES_PER_NAUTICAL_MILE: f64 = 5.;
    const MAXIMUM_INTERCEPT_DEGREES: f64 = 45.;

    pub fn new() -> Self {
        Self {
            waypoints: Vec::new(),
            active: None,
            direct: false,
            guidance: None,
            vertical_constraint: None,
        }
    }

    pub fn load(&mut self, waypoints: Vec<Waypoint>) {
        self.active = if waypoints.is_empty() { None } else { Some(0) };
        self.waypoints = waypoints;
        self.direct = false;
        self.guidance = None;
        self.vertical_constraint = None;
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn append(&mut self, waypoint: Waypoint) {
        self.insert_at(self.waypoints.len(), waypoint);
    }

    pub fn insert(&mut self, index: usize, waypoint: Waypoint) -> Result<(), FlightPlanError> {
        if index > self.waypoints.len() {
            return Err(self.out_of_range(index));
        }

        self.insert_at(index, waypoint);

        Ok(())
    }

    /// A waypoint added to an empty or completed plan becomes the active waypoint.
    fn insert_at(&mut self, index: usize, waypoint: Waypoint) {
        let complete = self.is_complete();
        if complete {
            info!("Flight plan resumed towards {}.", waypoint.ident);
        }

        self.waypoints.insert(index, waypoint);
        self.active = match self.active {
            Some(active) if index <= active => Some(active + 1),
            Some(active) => Some(active),
            None if complete => Some(index),
            None => Some(0),
        };
    }

    /// Deleting the active waypoint makes the following waypoint active.
    pub fn delete(&mut self, index: usize) -> Result<(), FlightPlanError> {
        if index >= self.waypoints.len() {
            return Err(self.out_of_range(index));
        }

        self.waypoints.remove(index);
        self.active = match self.active {
            Some(active) if index < active => Some(active - 1),
            Some(active) if active >= self.waypoints.len() => None,
            active => active,
        };

        Ok(())
    }

    pub fn set_altitude_constraint(
        &mut self,
        index: usize,
        altitude: Option<Length>,
    ) -> Result<(), FlightPlanError> {
        let error = self.out_of_range(index);
        let waypoint = self.waypoints.get_mut(index).ok_or(error)?;
        waypoint.altitude_constraint = altitude;

        Ok(())
    }

    /// Flies directly from the present position to the waypoint at the given index.
    pub fn direct_to(&mut self, index: usize) -> Result<(), FlightPlanError> {
        if index >= self.waypoints.len() {
            return Err(self.out_of_range(index));
        }

        info!("Direct to waypoint {} ({}).", index, self.waypoints[index].ident);
        self.active = Some(index);
        self.direct = true;

        Ok(())
    }

    fn out_of_range(&self, index: usize) -> FlightPlanError {
        FlightPlanError::IndexOutOfRange {
            index,
            length: self.waypoints.len(),
        }
    }

    pub fn update(&mut self, context: &UpdateContext) {
        let latitude = context.latitude();
        let longitude = context.longitude();

        if let Some(active) = self.active {
            if self.has_reached(active, latitude, longitude) {
                self.sequence(active);
            }
        }

        self.guidance = self.calculate_guidance(latitude, longitude);
        self.vertical_constraint = self.calculate_vertical_constraint(latitude, longitude);
    }

    fn has_reached(&self, active: usize, latitude: Angle, longitude: Angle) -> bool {
        let to = &self.waypoints[active];
        let (_, distance) = bearing_and_distance(latitude, longitude, to.latitude, to.longitude);
        if distance < Length::new::<nautical_mile>(FlightPlan::CAPTURE_RADIUS_NAUTICAL_MILES) {
            return true;
        }

        match self.leg_origin(active) {
            Some(from) => {
                let (_, leg_distance) =
                    bearing_and_distance(from.latitude, from.longitude, to.latitude, to.longitude);
                let (_, along_track) = cross_and_along_track(latitude, longitude, from, to);
                along_track >= leg_distance
            }
            None => false,
        }
    }

    fn sequence(&mut self, active: usize) {
        let next = active + 1;
        self.direct = false;
        if next < self.waypoints.len() {
            info!(
                "Sequenced waypoint {}, now flying to {}.",
                self.waypoints[active].ident, self.waypoints[next].ident
            );
            self.active = Some(next);
        } else {
            info!("Flight plan complete, holding last leg.");
            self.active = None;
        }
    }

    /// The waypoint the leg towards the active waypoint starts at. There is none when
    /// flying direct or towards the first waypoint.
    fn leg_origin(&self, active: usize) -> Option<&Waypoint> {
        if self.direct || active == 0 {
            None
        } else {
            self.waypoints.get(active - 1)
        }
    }

    fn calculate_guidance(&self, latitude: Angle, longitude: Angle) -> Option<Guidance> {
        match self.active {
            Some(active) => {
                let to = &self.waypoints[active];
                let (bearing, distance) =
                    bearing_and_distance(latitude, longitude, to.latitude, to.longitude);
                Some(match self.leg_origin(active) {
                    Some(from) => FlightPlan::leg_guidance(latitude, longitude, from, to, distance),
                    None => Guidance {
                        desired_track: bearing,
                        cross_track: Length::new::<nautical_mile>(0.),
                        distance_to_waypoint: distance,
                    },
                })
            }
            None if self.waypoints.len() >= 2 => {
                let (from, to) = self.waypoints[self.waypoints.len() - 2..]
                    .iter()
                    .tuple_windows()
                    .next()?;
                Some(FlightPlan::leg_guidance(
                    latitude,
                    longitude,
                    from,
                    to,
                    Length::new::<nautical_mile>(0.),
                ))
            }
            None => None,
        }
    }

    fn leg_guidance(
        latitude: Angle,
        longitude: Angle,
        from: &Waypoint,
        to: &Waypoint,
        distance_to_waypoint: Length,
    ) -> Guidance {
        let (course, _) =
            bearing_and_distance(from.latitude, from.longitude, to.latitude, to.longitude);
        let (cross_track, _) = cross_and_along_track(latitude, longitude, from, to);
        let intercept = (FlightPlan::CROSS_TRACK_GAIN_DEGREES_PER_NAUTICAL_MILE
            * cross_track.get::<nautical_mile>())
        .max(-FlightPlan::MAXIMUM_INTERCEPT_DEGREES)
        .min(FlightPlan::MAXIMUM_INTERCEPT_DEGREES);

        Guidance {
            desired_track: Angle::new::<degree>(normalize_degrees(
                course.get::<degree>() - intercept,
            )),
            cross_track,
            distance_to_waypoint,
        }
    }

    fn calculate_vertical_constraint(
        &self,
        latitude: Angle,
        longitude: Angle,
    ) -> Option<VerticalConstraint> {
        let (index, waypoint) = self.next_constrained_waypoint()?;
        let active = self.active?;
        let altitude = waypoint.altitude_constraint?;

        let first = &self.waypoints[active];
        let (_, to_active) =
            bearing_and_distance(latitude, longitude, first.latitude, first.longitude);
        let along_route: f64 = self.waypoints[active..=index]
            .iter()
            .tuple_windows()
            .map(|(from, to)| {
                bearing_and_distance(from.latitude, from.longitude, to.latitude, to.longitude)
                    .1
                    .get::<nautical_mile>()
            })
            .sum();

        Some(VerticalConstraint {
            altitude,
            distance: to_active + Length::new::<nautical_mile>(along_route),
        })
    }

    /// The first waypoint from the active waypoint onwards which carries an altitude constraint.
    pub fn next_constrained_waypoint(&self) -> Option<(usize, &Waypoint)> {
        let active = self.active?;
        self.waypoints
            .iter()
            .enumerate()
            .skip(active)
            .find(|(_, waypoint)| waypoint.altitude_constraint.is_some())
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.active?)
    }

    pub fn is_complete(&self) -> bool {
        self.active.is_none() && !self.waypoints.is_empty()
    }

    pub fn guidance(&self) -> Option<Guidance> {
        self.guidance
    }

    pub fn vertical_constraint(&self) -> Option<VerticalConstraint> {
        self.vertical_constraint
    }
}
impl SimulationElement for FlightPlan {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64("FPLN_LENGTH", self.waypoints.len() as f64);
        writer.write_f64(
            "FPLN_ACTIVE_INDEX",
            self.active.map_or(-1., |index| index as f64),
        );
        writer.write_bool("FPLN_COMPLETE", self.is_complete());
        if let Some(guidance) = self.guidance {
            writer.write_f64(
                "FPLN_DESIRED_TRACK",
                guidance.desired_track.get::<degree>(),
            );
            writer.write_f64(
                "FPLN_CROSS_TRACK",
                guidance.cross_track.get::<nautical_mile>(),
            );
            writer.write_f64(
                "FPLN_DISTANCE_TO_WAYPOINT",
                guidance.distance_to_waypoint.get::<nautical_mile>(),
            );
        }
        if let Some(constraint) = self.vertical_constraint {
            writer.write_f64(
                "FPLN_NEXT_CONSTRAINT_ALTITUDE",
                constraint.altitude.get::<foot>(),
            );
        }
    }
}
impl Default for FlightPlan {
    fn default() -> Self {
        Self::new()
    }
}
