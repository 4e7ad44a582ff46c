//! Provides all the necessary types for driving the aircraft system simulation
//! from an external flight dynamics engine.
use std::{collections::BTreeMap, time::Duration};

mod update_context;
#[cfg(test)]
pub use update_context::test_helpers;
pub use update_context::UpdateContext;

pub mod test;

/// Trait for reading data from and writing data to the external flight dynamics engine.
pub trait SimulatorReaderWriter {
    fn read(&mut self, name: &str) -> f64;
    fn write(&mut self, name: &str, value: f64);
}

pub trait Aircraft: SimulationElement {
    fn update(&mut self, context: &UpdateContext);
}

/// Trait for an element within the aircraft system simulation.
pub trait SimulationElement {
    /// Accepts a visitor. Elements which own other elements must pass the
    /// visitor to those elements before visiting themselves.
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T)
    where
        Self: Sized,
    {
        visitor.visit(self);
    }

    /// Reads data representing the current state of the simulator into the aircraft system simulation.
    fn read(&mut self, _reader: &mut SimulatorReader) {}

    /// Writes data from the aircraft system simulation to a model which can be passed to the simulator.
    fn write(&self, _writer: &mut SimulatorWriter) {}
}

/// Trait for visitors that visit the aircraft's system simulation.
pub trait SimulationElementVisitor {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T);
}

/// Orchestrates the:
/// 1. Reading of data from the flight dynamics engine into the aircraft state.
/// 2. Updating of the aircraft state for each tick.
/// 3. Writing of aircraft state data into a snapshot, which is passed to the flight dynamics engine.
///
/// Commands are applied to the aircraft between ticks through [`Simulation::aircraft_mut`].
/// The snapshot is only taken once all systems have finished updating, so readers never
/// observe a partially updated tick.
pub struct Simulation<T: Aircraft, U: SimulatorReaderWriter> {
    aircraft: T,
    simulator_reader_writer: U,
    snapshot: Snapshot,
    ticks: u64,
}
impl<T: Aircraft, U: SimulatorReaderWriter> Simulation<T, U> {
    pub fn new(aircraft: T, simulator_reader_writer: U) -> Self {
        Self {
            aircraft,
            simulator_reader_writer,
            snapshot: Snapshot::default(),
            ticks: 0,
        }
    }

    pub fn tick(&mut self, delta: Duration) -> &Snapshot {
        self.snapshot = tick(&mut self.aircraft, &mut self.simulator_reader_writer, delta);
        self.ticks += 1;

        &self.snapshot
    }

    pub fn aircraft(&self) -> &T {
        &self.aircraft
    }

    pub fn aircraft_mut(&mut self) -> &mut T {
        &mut self.aircraft
    }

    pub fn reader_writer(&self) -> &U {
        &self.simulator_reader_writer
    }

    pub fn reader_writer_mut(&mut self) -> &mut U {
        &mut self.simulator_reader_writer
    }

    pub fn last_snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Runs a single tick of the given aircraft against the given reader writer.
pub(crate) fn tick<T: Aircraft, U: SimulatorReaderWriter>(
    aircraft: &mut T,
    simulator_reader_writer: &mut U,
    delta: Duration,
) -> Snapshot {
    let mut reader = SimulatorReader::new(&mut *simulator_reader_writer);
    let context = UpdateContext::from_reader(&mut reader, delta);

    let mut visitor = SimulatorToSimulationVisitor::new(&mut reader);
    aircraft.accept(&mut visitor);

    aircraft.update(&context);

    let mut snapshot = Snapshot::default();
    let mut writer = SimulatorWriter::new(&mut snapshot);
    let mut visitor = SimulationToSimulatorVisitor::new(&mut writer);
    aircraft.accept(&mut visitor);

    for (name, value) in snapshot.iter() {
        simulator_reader_writer.write(name, value);
    }

    snapshot
}

/// Visits aircraft components in order to pass data coming
/// from the simulator into the aircraft system simulation.
struct SimulatorToSimulationVisitor<'a, 'b> {
    reader: &'a mut SimulatorReader<'b>,
}
impl<'a, 'b> SimulatorToSimulationVisitor<'a, 'b> {
    fn new(reader: &'a mut SimulatorReader<'b>) -> Self {
        Self { reader }
    }
}
impl SimulationElementVisitor for SimulatorToSimulationVisitor<'_, '_> {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T) {
        visited.read(self.reader);
    }
}

/// Visits aircraft components in order to pass data from
/// the aircraft system simulation to the simulator.
pub(crate) struct SimulationToSimulatorVisitor<'a, 'b> {
    writer: &'a mut SimulatorWriter<'b>,
}
impl<'a, 'b> SimulationToSimulatorVisitor<'a, 'b> {
    pub fn new(writer: &'a mut SimulatorWriter<'b>) -> Self {
        Self { writer }
    }
}
impl SimulationElementVisitor for SimulationToSimulatorVisitor<'_, '_> {
    fn visit<T: SimulationElement>(&mut self, visited: &mut T) {
        visited.write(self.writer);
    }
}

pub struct SimulatorReader<'a> {
    simulator_read_writer: &'a mut dyn SimulatorReaderWriter,
}
impl<'a> SimulatorReader<'a> {
    pub fn new(simulator_read_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self {
            simulator_read_writer,
        }
    }

    pub fn read_f64(&mut self, name: &str) -> f64 {
        self.simulator_read_writer.read(name)
    }

    pub fn read_bool(&mut self, name: &str) -> bool {
        to_bool(self.read_f64(name))
    }
}

pub struct SimulatorWriter<'a> {
    simulator_read_writer: &'a mut dyn SimulatorReaderWriter,
}
impl<'a> SimulatorWriter<'a> {
    pub fn new(simulator_read_writer: &'a mut dyn SimulatorReaderWriter) -> Self {
        Self {
            simulator_read_writer,
        }
    }

    pub fn write_f64(&mut self, name: &str, value: f64) {
        self.simulator_read_writer.write(name, value);
    }

    pub fn write_bool(&mut self, name: &str, value: bool) {
        self.simulator_read_writer.write(name, from_bool(value));
    }
}

/// A read-only mapping of every variable written by the aircraft systems
/// at the end of a tick. Ordered by name, so two snapshots of the same
/// state are identical.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    variables: BTreeMap<String, f64>,
}
impl Snapshot {
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_f64(name).map(to_bool)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    /// The raw bit patterns of all values in name order. Two snapshots with
    /// equal bits are byte for byte identical.
    pub fn to_bits(&self) -> Vec<(String, u64)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.clone(), value.to_bits()))
            .collect()
    }
}
impl SimulatorReaderWriter for Snapshot {
    fn read(&mut self, name: &str) -> f64 {
        self.get_f64(name).unwrap_or(0.)
    }

    fn write(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_owned(), value);
    }
}

/// Converts a given `f64` representing a boolean value in the simulator into an actual `bool` value.
pub fn to_bool(value: f64) -> bool {
    (value - 1.).abs() < f64::EPSILON
}

/// Converts a given `bool` value into an `f64` representing that boolean value in the simulator.
pub fn from_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
