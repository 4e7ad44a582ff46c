use super::PowerSource;
use crate::simulation::{SimulationElement, SimulatorWriter, UpdateContext};
use log::info;
use uom::si::{f64::*, ratio::ratio, velocity::knot};

/// The ram air turbine driven emergency generator. Once deployed it stays deployed
/// until reset, regardless of other sources coming back.
pub struct EmergencyGenerator {
    deployed_id: String,
    output_id: String,
    deployed: bool,
}
impl EmergencyGenerator {
    pub const CAPACITY: f64 = 0.3;
    const AUTOMATIC_DEPLOYMENT_MINIMUM_SPEED_KNOTS: f64 = 100.;

    pub fn new() -> EmergencyGenerator {
        EmergencyGenerator {
            deployed_id: "ELEC_RAT_DEPLOYED".to_owned(),
            output_id: "ELEC_EMER_GEN_OUTPUT".to_owned(),
            deployed: false,
        }
    }

    pub fn update(&mut self, context: &UpdateContext, main_generators: &[&dyn PowerSource]) {
        if self.deployed {
            return;
        }

        let all_failed =
            !main_generators.is_empty() && main_generators.iter().all(|gen| gen.is_failed());
        let in_flight_without_power = !context.is_on_ground()
            && context.indicated_airspeed()
                > Velocity::new::<knot>(EmergencyGenerator::AUTOMATIC_DEPLOYMENT_MINIMUM_SPEED_KNOTS)
            && main_generators.iter().all(|gen| !gen.is_supplying());

        if all_failed || in_flight_without_power {
            info!("Emergency generator deployed.");
            self.deployed = true;
        }
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed
    }

    pub fn reset(&mut self) {
        if self.deployed {
            info!("Emergency generator reset.");
        }

        self.deployed = false;
    }
}
impl PowerSource for EmergencyGenerator {
    fn output(&self) -> Ratio {
        if self.deployed {
            Ratio::new::<ratio>(EmergencyGenerator::CAPACITY)
        } else {
            Ratio::new::<ratio>(0.)
        }
    }
}
impl SimulationElement for EmergencyGenerator {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.deployed_id, self.deployed);
        writer.write_f64(&self.output_id, self.output().get::<ratio>());
    }
}
impl Default for EmergencyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod emergency_generator_tests {
    use super::*;
    use crate::simulation::test::SimulationTestBed;

    struct TestGenerator {
        failed: bool,
        supplying: bool,
    }
    impl TestGenerator {
        fn failed() -> Self {
            Self {
                failed: true,
                supplying: false,
            }
        }

        fn supplying() -> Self {
            Self {
                failed: false,
                supplying: true,
            }
        }

        fn idle() -> Self {
            Self {
                failed: false,
                supplying: false,
            }
        }
    }
    impl PowerSource for TestGenerator {
        fn output(&self) -> Ratio {
            Ratio::new::<ratio>(if self.supplying { 0.5 } else { 0. })
        }

        fn is_failed(&self) -> bool {
            self.failed
        }
    }

    fn run(
        emer_gen: &mut EmergencyGenerator,
        test_bed: &mut SimulationTestBed,
        generators: &[&dyn PowerSource],
    ) {
        test_bed.run(emer_gen, |emer_gen, context| {
            emer_gen.update(context, generators)
        });
    }

    #[test]
    fn starts_stowed_without_output() {
        let emer_gen = EmergencyGenerator::new();

        assert!(!emer_gen.is_deployed());
        assert!(!emer_gen.is_supplying());
    }

    #[test]
    fn deploys_when_all_main_generators_fail() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new().on_ground(true);
        run(
            &mut emer_gen,
            &mut test_bed,
            &[&TestGenerator::failed(), &TestGenerator::failed(), &TestGenerator::failed()],
        );

        assert!(emer_gen.is_deployed());
        assert!(emer_gen.is_supplying());
    }

    #[test]
    fn does_not_deploy_when_one_generator_remains() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new();
        run(
            &mut emer_gen,
            &mut test_bed,
            &[&TestGenerator::failed(), &TestGenerator::failed(), &TestGenerator::supplying()],
        );

        assert!(!emer_gen.is_deployed());
    }

    #[test]
    fn remains_deployed_when_generators_recover() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new();
        run(&mut emer_gen, &mut test_bed, &[&TestGenerator::failed(), &TestGenerator::failed()]);
        run(
            &mut emer_gen,
            &mut test_bed,
            &[&TestGenerator::supplying(), &TestGenerator::supplying()],
        );

        assert!(emer_gen.is_deployed());
    }

    #[test]
    fn deploys_in_flight_without_generator_output() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new().indicated_airspeed(Velocity::new::<knot>(150.));
        run(&mut emer_gen, &mut test_bed, &[&TestGenerator::idle(), &TestGenerator::idle()]);

        assert!(emer_gen.is_deployed());
    }

    #[test]
    fn does_not_deploy_on_ground_without_generator_output() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new().on_ground(true);
        run(&mut emer_gen, &mut test_bed, &[&TestGenerator::idle(), &TestGenerator::idle()]);

        assert!(!emer_gen.is_deployed());
    }

    #[test]
    fn reset_stows_the_generator() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new();
        run(&mut emer_gen, &mut test_bed, &[&TestGenerator::failed()]);
        emer_gen.reset();

        assert!(!emer_gen.is_deployed());
    }

    #[test]
    fn writes_its_state() {
        let mut emer_gen = EmergencyGenerator::new();
        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut emer_gen);

        assert!(test_bed.contains_bool("ELEC_RAT_DEPLOYED", false));
        assert!(test_bed.contains_f64("ELEC_EMER_GEN_OUTPUT", 0.));
    }
}
