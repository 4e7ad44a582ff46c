//! Deterministic failure injection. Every failure capable component embeds a [`Failure`]
//! and exposes it through [`Failable`]. Once per tick the [`FailureInjector`] rolls its
//! seeded random source for every component which hasn't failed yet, applies failures
//! forced by tests and reports failure and recovery events.
use crate::simulation::{SimulationElement, SimulatorWriter, UpdateContext};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::BTreeSet, fmt, time::Duration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureId {
    EngineGenerator(usize),
    ApuGenerator,
    Battery,
    HydraulicPump(usize),
    EngineOilSystem(usize),
    EngineFire(usize),
    ApuFire,
    EngineAntiIce(usize),
    WingAntiIce,
}
impl fmt::Display for FailureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureId::EngineGenerator(number) => write!(f, "ENG_GEN_{}", number),
            FailureId::ApuGenerator => write!(f, "APU_GEN"),
            FailureId::Battery => write!(f, "BAT"),
            FailureId::HydraulicPump(number) => write!(f, "HYD_PUMP_{}", number),
            FailureId::EngineOilSystem(number) => write!(f, "ENG_{}_OIL", number),
            FailureId::EngineFire(number) => write!(f, "ENG_{}_FIRE", number),
            FailureId::ApuFire => write!(f, "APU_FIRE"),
            FailureId::EngineAntiIce(number) => write!(f, "ENG_{}_ANTI_ICE", number),
            FailureId::WingAntiIce => write!(f, "WING_ANTI_ICE"),
        }
    }
}

/// Determines how a failed component returns to service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecoveryPolicy {
    /// Only an explicit action (restart, reset, extinguishing) clears the failure.
    Manual,
    /// The failure clears by itself once it has been active for the given duration.
    /// Explicit actions clear it earlier.
    Timed(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FailureEventKind {
    Failed,
    Recovered,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FailureEvent {
    id: FailureId,
    kind: FailureEventKind,
    tick: u64,
}
impl FailureEvent {
    pub fn id(&self) -> FailureId {
        self.id
    }

    pub fn kind(&self) -> FailureEventKind {
        self.kind
    }

    /// The tick at which the event occurred.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

pub struct Failure {
    id: FailureId,
    failed_id: String,
    active: bool,
    active_for: Duration,
    recovery: RecoveryPolicy,
}
impl Failure {
    pub fn new(id: FailureId, recovery: RecoveryPolicy) -> Self {
        Self {
            id,
            failed_id: format!("FAILURE_{}", id),
            active: false,
            active_for: Duration::from_secs(0),
            recovery,
        }
    }

    pub fn id(&self) -> FailureId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn recovery(&self) -> RecoveryPolicy {
        self.recovery
    }

    pub fn activate(&mut self) {
        if !self.active {
            self.active = true;
            self.active_for = Duration::from_secs(0);
        }
    }

    /// Clears the failure, as the result of an explicit action.
    pub fn clear(&mut self) {
        self.active = false;
        self.active_for = Duration::from_secs(0);
    }

    fn update(&mut self, context: &UpdateContext) {
        if self.active {
            self.active_for += context.delta();
            if let RecoveryPolicy::Timed(duration) = self.recovery {
                if self.active_for >= duration {
                    self.clear();
                }
            }
        }
    }
}
impl SimulationElement for Failure {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.failed_id, self.active);
    }
}

pub trait Failable {
    fn failure(&self) -> &Failure;
    fn failure_mut(&mut self) -> &mut Failure;

    /// Multiplies the base failure rate. A component which cannot fail in
    /// its current state returns zero.
    fn failure_exposure(&self) -> f64 {
        1.
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FailureConfiguration {
    pub enabled: bool,
    pub seed: u64,
    /// The expected number of failures per hour of a single component at an exposure of one.
    pub failures_per_hour: f64,
    pub generator_recovery: RecoveryPolicy,
    pub pump_recovery: RecoveryPolicy,
}
impl Default for FailureConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 0,
            failures_per_hour: 0.01,
            generator_recovery: RecoveryPolicy::Manual,
            pump_recovery: RecoveryPolicy::Timed(Duration::from_secs(60)),
        }
    }
}

pub struct FailureInjector {
    enabled: bool,
    failures_per_hour: f64,
    rng: StdRng,
    tick: u64,
    forced: BTreeSet<FailureId>,
    active: BTreeSet<FailureId>,
    events: Vec<FailureEvent>,
}
impl FailureInjector {
    pub fn new(configuration: &FailureConfiguration) -> Self {
        Self {
            enabled: configuration.enabled,
            failures_per_hour: configuration.failures_per_hour,
            rng: StdRng::seed_from_u64(configuration.seed),
            tick: 0,
            forced: BTreeSet::new(),
            active: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Fails the component with the given id during the next tick, regardless of
    /// whether random failures are enabled.
    pub fn force(&mut self, id: FailureId) {
        self.forced.insert(id);
    }

    pub fn update(&mut self, context: &UpdateContext, elements: &mut [&mut dyn Failable]) {
        self.tick += 1;
        self.events.clear();

        for element in elements.iter_mut() {
            let id = element.failure().id();

            element.failure_mut().update(context);
            if self.active.contains(&id) && !element.failure().is_active() {
                self.record(id, FailureEventKind::Recovered);
            }

            if !element.failure().is_active() {
                let forced = self.forced.remove(&id);
                let rolled = self.enabled
                    && roll(
                        &mut self.rng,
                        self.failures_per_hour * element.failure_exposure(),
                        context.delta(),
                    );

                if forced || rolled {
                    element.failure_mut().activate();
                    self.record(id, FailureEventKind::Failed);
                }
            }
        }

        self.forced.clear();
    }

    fn record(&mut self, id: FailureId, kind: FailureEventKind) {
        match kind {
            FailureEventKind::Failed => {
                info!("Failure {} occurred at tick {}.", id, self.tick);
                self.active.insert(id);
            }
            FailureEventKind::Recovered => {
                info!("Failure {} recovered at tick {}.", id, self.tick);
                self.active.remove(&id);
            }
        }

        self.events.push(FailureEvent {
            id,
            kind,
            tick: self.tick,
        });
    }

    /// The failure and recovery events of the last tick.
    pub fn events(&self) -> &[FailureEvent] {
        &self.events
    }

    pub fn active_failures(&self) -> impl Iterator<Item = &FailureId> {
        self.active.iter()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }
}
impl SimulationElement for FailureInjector {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool("FAILURES_ENABLED", self.enabled);
        writer.write_f64("FAILURES_ACTIVE_COUNT", self.active.len() as f64);
    }
}

/// Always draws exactly one number, so the random sequence doesn't depend on the exposure.
fn roll(rng: &mut StdRng, failures_per_hour: f64, delta: Duration) -> bool {
    let draw: f64 = rng.gen();
    let rate_per_second = failures_per_hour.max(0.) / 3600.;
    let probability = 1. - (-rate_per_second * delta.as_secs_f64()).exp();

    draw < probability
}
