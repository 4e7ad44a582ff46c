use std::{collections::HashMap, time::Duration};
use uom::si::{
    angle::degree, f64::*, length::foot, ratio::ratio, thermodynamic_temperature::degree_celsius,
    velocity::foot_per_minute, velocity::knot,
};

use super::{
    from_bool, tick, to_bool, Aircraft, SimulationElement, SimulationElementVisitor,
    SimulatorReaderWriter, Snapshot, UpdateContext,
};

struct TestAircraft<'a, T: SimulationElement, U: Fn(&mut T, &UpdateContext)> {
    element: &'a mut T,
    update_fn: U,
}
impl<'a, T: SimulationElement, U: Fn(&mut T, &UpdateContext)> TestAircraft<'a, T, U> {
    fn new(element: &'a mut T, update_fn: U) -> Self {
        Self { element, update_fn }
    }
}
impl<'a, T: SimulationElement, U: Fn(&mut T, &UpdateContext)> Aircraft for TestAircraft<'a, T, U> {
    fn update(&mut self, context: &UpdateContext) {
        (self.update_fn)(&mut *self.element, context);
    }
}
impl<'a, T: SimulationElement, U: Fn(&mut T, &UpdateContext)> SimulationElement
    for TestAircraft<'a, T, U>
{
    fn accept<W: SimulationElementVisitor>(&mut self, visitor: &mut W) {
        self.element.accept(visitor);
    }
}

pub struct TestReaderWriter {
    variables: HashMap<String, f64>,
}
impl TestReaderWriter {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
        }
    }

    pub fn contains_f64(&self, name: &str, value: f64) -> bool {
        if let Some(val) = self.variables.get(name) {
            (val - value).abs() < f64::EPSILON
        } else {
            false
        }
    }

    pub fn contains_bool(&self, name: &str, value: bool) -> bool {
        self.contains_f64(name, from_bool(value))
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len_is(&self, length: usize) -> bool {
        self.variables.len() == length
    }

    fn write_bool(&mut self, name: &str, value: bool) {
        self.write(name, from_bool(value));
    }

    fn write_f64(&mut self, name: &str, value: f64) {
        self.write(name, value);
    }

    fn read_bool(&mut self, name: &str) -> bool {
        to_bool(self.read(name))
    }

    fn read_f64(&mut self, name: &str) -> f64 {
        self.read(name)
    }
}
impl SimulatorReaderWriter for TestReaderWriter {
    fn read(&mut self, name: &str) -> f64 {
        *self.variables.get(name).unwrap_or(&0.)
    }

    fn write(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_owned(), value);
    }
}
impl Default for TestReaderWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// The simulation test bed handles the testing of [`SimulationElement`]s
/// by running a full simulation tick on them.
///
/// [`SimulationElement`]: ../trait.SimulationElement.html
pub struct SimulationTestBed {
    reader_writer: TestReaderWriter,
    delta: Duration,
    snapshot: Snapshot,
}
impl SimulationTestBed {
    pub fn new() -> Self {
        let bed = Self {
            reader_writer: TestReaderWriter::new(),
            delta: Duration::from_secs(1),
            snapshot: Snapshot::default(),
        };

        bed.indicated_airspeed(Velocity::new::<knot>(250.))
            .indicated_altitude(Length::new::<foot>(5000.))
            .altitude_above_ground(Length::new::<foot>(5000.))
            .vertical_speed(Velocity::new::<foot_per_minute>(0.))
            .ambient_temperature(ThermodynamicTemperature::new::<degree_celsius>(0.))
            .precipitation_rate(Ratio::new::<ratio>(0.))
            .on_ground(false)
    }

    pub fn new_with_delta(delta: Duration) -> Self {
        Self::new().delta(delta)
    }

    pub fn run_aircraft<T: Aircraft>(&mut self, aircraft: &mut T) {
        self.snapshot = tick(aircraft, &mut self.reader_writer, self.delta);
    }

    pub fn run<T: SimulationElement, U: Fn(&mut T, &UpdateContext)>(
        &mut self,
        element: &mut T,
        update_fn: U,
    ) {
        let mut aircraft = TestAircraft::new(element, update_fn);
        self.run_aircraft(&mut aircraft);
    }

    pub fn run_without_update<T: SimulationElement>(&mut self, element: &mut T) {
        self.run(element, |_, _| {});
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn and(self) -> Self {
        self
    }

    pub fn delta(mut self, delta: Duration) -> Self {
        self.delta = delta;
        self
    }

    pub fn set_delta(&mut self, delta: Duration) {
        self.delta = delta;
    }

    pub fn indicated_airspeed(mut self, indicated_airspeed: Velocity) -> Self {
        self.set_indicated_airspeed(indicated_airspeed);
        self
    }

    pub fn set_indicated_airspeed(&mut self, indicated_airspeed: Velocity) {
        self.reader_writer.write_f64(
            UpdateContext::INDICATED_AIRSPEED_KEY,
            indicated_airspeed.get::<knot>(),
        );
    }

    pub fn indicated_altitude(mut self, indicated_altitude: Length) -> Self {
        self.set_indicated_altitude(indicated_altitude);
        self
    }

    pub fn set_indicated_altitude(&mut self, indicated_altitude: Length) {
        self.reader_writer.write_f64(
            UpdateContext::INDICATED_ALTITUDE_KEY,
            indicated_altitude.get::<foot>(),
        );
    }

    pub fn altitude_above_ground(mut self, altitude: Length) -> Self {
        self.reader_writer
            .write_f64(UpdateContext::ALTITUDE_ABOVE_GROUND_KEY, altitude.get::<foot>());
        self
    }

    pub fn vertical_speed(mut self, vertical_speed: Velocity) -> Self {
        self.set_vertical_speed(vertical_speed);
        self
    }

    pub fn set_vertical_speed(&mut self, vertical_speed: Velocity) {
        self.reader_writer.write_f64(
            UpdateContext::VERTICAL_SPEED_KEY,
            vertical_speed.get::<foot_per_minute>(),
        );
    }

    pub fn heading(mut self, heading: Angle) -> Self {
        self.reader_writer
            .write_f64(UpdateContext::HEADING_KEY, heading.get::<degree>());
        self
    }

    pub fn position(mut self, latitude: Angle, longitude: Angle) -> Self {
        self.set_position(latitude, longitude);
        self
    }

    pub fn set_position(&mut self, latitude: Angle, longitude: Angle) {
        self.reader_writer
            .write_f64(UpdateContext::LATITUDE_KEY, latitude.get::<degree>());
        self.reader_writer
            .write_f64(UpdateContext::LONGITUDE_KEY, longitude.get::<degree>());
    }

    pub fn ambient_temperature(mut self, ambient_temperature: ThermodynamicTemperature) -> Self {
        self.reader_writer.write_f64(
            UpdateContext::AMBIENT_TEMPERATURE_KEY,
            ambient_temperature.get::<degree_celsius>(),
        );
        self
    }

    pub fn precipitation_rate(mut self, precipitation_rate: Ratio) -> Self {
        self.reader_writer.write_f64(
            UpdateContext::PRECIPITATION_RATE_KEY,
            precipitation_rate.get::<ratio>(),
        );
        self
    }

    pub fn on_ground(mut self, on_ground: bool) -> Self {
        self.set_on_ground(on_ground);
        self
    }

    pub fn set_on_ground(&mut self, on_ground: bool) {
        self.reader_writer
            .write_bool(UpdateContext::IS_ON_GROUND_KEY, on_ground);
    }

    pub fn localizer_deviation(mut self, deviation: Option<Angle>) -> Self {
        self.set_localizer_deviation(deviation);
        self
    }

    pub fn set_localizer_deviation(&mut self, deviation: Option<Angle>) {
        self.reader_writer
            .write_bool(UpdateContext::HAS_LOCALIZER_KEY, deviation.is_some());
        self.reader_writer.write_f64(
            UpdateContext::LOCALIZER_DEVIATION_KEY,
            deviation.map_or(0., |d| d.get::<degree>()),
        );
    }

    pub fn glideslope_deviation(mut self, deviation: Option<Length>) -> Self {
        self.set_glideslope_deviation(deviation);
        self
    }

    pub fn set_glideslope_deviation(&mut self, deviation: Option<Length>) {
        self.reader_writer
            .write_bool(UpdateContext::HAS_GLIDESLOPE_KEY, deviation.is_some());
        self.reader_writer.write_f64(
            UpdateContext::GLIDESLOPE_DEVIATION_KEY,
            deviation.map_or(0., |d| d.get::<foot>()),
        );
    }

    pub fn write_bool(&mut self, name: &str, value: bool) {
        self.reader_writer.write_bool(name, value);
    }

    pub fn write_f64(&mut self, name: &str, value: f64) {
        self.reader_writer.write_f64(name, value);
    }

    pub fn read_bool(&mut self, name: &str) -> bool {
        self.reader_writer.read_bool(name)
    }

    pub fn read_f64(&mut self, name: &str) -> f64 {
        self.reader_writer.read_f64(name)
    }

    pub fn contains_f64(&self, name: &str, value: f64) -> bool {
        self.reader_writer.contains_f64(name, value)
    }

    pub fn contains_bool(&self, name: &str, value: bool) -> bool {
        self.reader_writer.contains_bool(name, value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.reader_writer.contains_key(name)
    }
}
impl Default for SimulationTestBed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{SimulatorReader, SimulatorWriter};

    #[derive(Default)]
    struct ElementUnderTest {
        update_called: bool,
        read_called: bool,
        update_called_after_read: bool,
        airspeed_seen: Option<Velocity>,
    }
    impl ElementUnderTest {
        fn update(&mut self, context: &UpdateContext) {
            self.update_called = true;
            self.update_called_after_read = self.read_called;
            self.airspeed_seen = Some(context.indicated_airspeed());
        }

        fn all_functions_called(&self) -> bool {
            self.update_called && self.read_called
        }
    }
    impl SimulationElement for ElementUnderTest {
        fn read(&mut self, _: &mut SimulatorReader) {
            self.read_called = true;
        }

        fn write(&self, writer: &mut SimulatorWriter) {
            writer.write_bool("ELEMENT_UPDATED", self.update_called);
        }
    }

    #[test]
    fn test_aircraft_can_run_in_simulation() {
        let mut element = ElementUnderTest::default();
        let mut bed = SimulationTestBed::new();
        bed.run(&mut element, |el, context| {
            el.update(context);
        });

        assert!(element.all_functions_called());
    }

    #[test]
    fn reads_before_update() {
        let mut element = ElementUnderTest::default();
        let mut bed = SimulationTestBed::new();
        bed.run(&mut element, |el, context| {
            el.update(context);
        });

        assert!(element.update_called_after_read);
    }

    #[test]
    fn context_is_created_from_simulator_variables() {
        let mut element = ElementUnderTest::default();
        let mut bed = SimulationTestBed::new().indicated_airspeed(Velocity::new::<knot>(180.));
        bed.run(&mut element, |el, context| {
            el.update(context);
        });

        assert_eq!(element.airspeed_seen, Some(Velocity::new::<knot>(180.)));
    }

    #[test]
    fn written_state_ends_up_in_snapshot_and_simulator() {
        let mut element = ElementUnderTest::default();
        let mut bed = SimulationTestBed::new();
        bed.run(&mut element, |el, context| {
            el.update(context);
        });

        assert_eq!(bed.snapshot().get_bool("ELEMENT_UPDATED"), Some(true));
        assert!(bed.contains_bool("ELEMENT_UPDATED", true));
    }

    #[test]
    fn snapshot_only_contains_written_variables() {
        let mut element = ElementUnderTest::default();
        let mut bed = SimulationTestBed::new();
        bed.run_without_update(&mut element);

        assert_eq!(bed.snapshot().len(), 1);
    }
}
