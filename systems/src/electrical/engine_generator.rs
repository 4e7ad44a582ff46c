use super::PowerSource;
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter, UpdateContext},
};
use std::{cmp::min, time::Duration};
use uom::si::{f64::*, ratio::percent, ratio::ratio};

pub struct EngineGenerator {
    output_id: String,
    number: usize,
    idg: IntegratedDriveGenerator,
    failure: Failure,
}
impl EngineGenerator {
    pub const CAPACITY: f64 = 0.5;

    pub fn new(number: usize, recovery: RecoveryPolicy) -> EngineGenerator {
        EngineGenerator {
            output_id: format!("ELEC_ENG_GEN_{}_OUTPUT", number),
            number,
            idg: IntegratedDriveGenerator::new(),
            failure: Failure::new(FailureId::EngineGenerator(number), recovery),
        }
    }

    pub fn update(&mut self, context: &UpdateContext, engine_n2: Ratio) {
        self.idg.update(context, engine_n2);
    }

    pub fn number(&self) -> usize {
        self.number
    }

    /// Clears a generator failure, as done by the generator reset or an engine restart.
    pub fn reset(&mut self) {
        self.failure.clear();
    }
}
impl PowerSource for EngineGenerator {
    fn output(&self) -> Ratio {
        if self.idg.provides_stable_power_output() && !self.failure.is_active() {
            Ratio::new::<ratio>(EngineGenerator::CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }

    fn is_failed(&self) -> bool {
        self.failure.is_active()
    }
}
impl Failable for EngineGenerator {
    fn failure(&self) -> &Failure {
        &self.failure
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.failure
    }

    fn failure_exposure(&self) -> f64 {
        if self.idg.provides_stable_power_output() {
            1.
        } else {
            0.
        }
    }
}
impl SimulationElement for EngineGenerator {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.failure.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_f64(&self.output_id, self.output().get::<ratio>());
    }
}

/// Provides stable output once the engine's N2 has been above the power up threshold
/// for the stabilization time.
struct IntegratedDriveGenerator {
    time_above_threshold: Duration,
}
impl IntegratedDriveGenerator {
    const ENGINE_N2_POWER_UP_OUTPUT_THRESHOLD: f64 = 58.;
    const ENGINE_N2_POWER_DOWN_OUTPUT_THRESHOLD: f64 = 56.;
    const STABILIZATION_TIME: Duration = Duration::from_millis(500);

    fn new() -> IntegratedDriveGenerator {
        IntegratedDriveGenerator {
            time_above_threshold: Duration::from_secs(0),
        }
    }

    fn update(&mut self, context: &UpdateContext, engine_n2: Ratio) {
        if engine_n2
            >= Ratio::new::<percent>(IntegratedDriveGenerator::ENGINE_N2_POWER_UP_OUTPUT_THRESHOLD)
        {
            self.time_above_threshold = min(
                self.time_above_threshold + context.delta(),
                IntegratedDriveGenerator::STABILIZATION_TIME,
            );
        } else if engine_n2
            <= Ratio::new::<percent>(IntegratedDriveGenerator::ENGINE_N2_POWER_DOWN_OUTPUT_THRESHOLD)
        {
            self.time_above_threshold = self
                .time_above_threshold
                .checked_sub(context.delta())
                .unwrap_or_default();
        }
    }

    fn provides_stable_power_output(&self) -> bool {
        self.time_above_threshold == IntegratedDriveGenerator::STABILIZATION_TIME
    }
}

#[cfg(test)]
mod engine_generator_tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;

    fn run(generator: &mut EngineGenerator, n2: f64, delta: Duration) {
        let mut test_bed = SimulationTestBed::new_with_delta(delta);
        test_bed.run(generator, |generator, context| {
            generator.update(context, Ratio::new::<percent>(n2))
        });
    }

    fn generator() -> EngineGenerator {
        EngineGenerator::new(1, RecoveryPolicy::Manual)
    }

    #[test]
    fn starts_without_output() {
        assert!(!generator().is_supplying());
    }

    #[test]
    fn when_engine_n2_above_threshold_provides_output() {
        let mut generator = generator();
        run(&mut generator, 80., Duration::from_secs(1));

        assert!(generator.is_supplying());
    }

    #[test]
    fn when_engine_n2_below_threshold_provides_no_output() {
        let mut generator = generator();
        run(&mut generator, 40., Duration::from_secs(1));

        assert!(!generator.is_supplying());
    }

    #[test]
    fn output_requires_stabilization_time() {
        let mut generator = generator();
        run(&mut generator, 80., Duration::from_millis(250));

        assert!(!generator.is_supplying());

        run(&mut generator, 80., Duration::from_millis(250));

        assert!(generator.is_supplying());
    }

    #[test]
    fn n2_between_thresholds_keeps_output() {
        let mut generator = generator();
        run(&mut generator, 80., Duration::from_secs(1));
        run(&mut generator, 57., Duration::from_secs(1));

        assert!(generator.is_supplying());
    }

    #[test]
    fn failed_generator_provides_no_output() {
        let mut generator = generator();
        run(&mut generator, 80., Duration::from_secs(1));
        generator.failure.activate();

        assert!(!generator.is_supplying());
        assert!(generator.is_failed());
    }

    #[test]
    fn reset_restores_output() {
        let mut generator = generator();
        run(&mut generator, 80., Duration::from_secs(1));
        generator.failure.activate();
        generator.reset();

        assert!(generator.is_supplying());
    }

    #[test]
    fn writes_its_state() {
        let mut generator = generator();
        let mut test_bed = SimulationTestBed::new();
        test_bed.run(&mut generator, |generator, context| {
            generator.update(context, Ratio::new::<percent>(80.))
        });

        assert!(test_bed.contains_f64("ELEC_ENG_GEN_1_OUTPUT", EngineGenerator::CAPACITY));
        assert!(test_bed.contains_bool("FAILURE_ENG_GEN_1", false));
    }
}
