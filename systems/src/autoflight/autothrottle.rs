use super::pid::PidController;
use crate::simulation::UpdateContext;
use log::info;
use uom::si::{f64::*, ratio::ratio, velocity::knot};

/// Holds the target speed by trimming the throttle. The demanded throttle passes through a
/// first order lag representing spool dynamics. The lag is shorter for large steps.
pub struct Autothrottle {
    engaged: bool,
    pid: PidController,
    trim: f64,
    demand: f64,
    throttle: Ratio,
}
impl Autothrottle {
    const PROPORTIONAL_GAIN: f64 = 0.01;
    const INTEGRAL_GAIN: f64 = 0.002;
    const INTEGRAL_LIMIT: f64 = 0.5;
    const SMALL_STEP: f64 = 0.05;
    const LARGE_STEP: f64 = 0.5;
    const SLOW_TIME_CONSTANT_SECONDS: f64 = 4.;
    const FAST_TIME_CONSTANT_SECONDS: f64 = 1.;

    pub fn new() -> Self {
        Self {
            engaged: false,
            pid: Autothrottle::new_pid(),
            trim: 0.,
            demand: 0.,
            throttle: Ratio::new::<ratio>(0.),
        }
    }

    fn new_pid() -> PidController {
        PidController::new(Autothrottle::PROPORTIONAL_GAIN, Autothrottle::INTEGRAL_GAIN, 0.)
            .with_integral_limit(Autothrottle::INTEGRAL_LIMIT)
    }

    /// Engages around the current throttle position, so engaging causes no step.
    pub fn engage(&mut self, current_throttle: Ratio) {
        if !self.engaged {
            info!("Autothrottle engaged.");
        }
        self.engaged = true;
        self.pid.reset();
        self.trim = current_throttle.get::<ratio>().max(0.).min(1.);
        self.demand = self.trim;
        self.throttle = Ratio::new::<ratio>(self.trim);
    }

    pub fn disengage(&mut self) {
        if self.engaged {
            info!("Autothrottle disengaged.");
        }
        self.engaged = false;
    }

    pub fn update(&mut self, context: &UpdateContext, target_speed: Velocity) {
        if !self.engaged {
            return;
        }

        let error = (target_speed - context.indicated_airspeed()).get::<knot>();
        self.demand = (self.trim + self.pid.update(error, context.delta()))
            .max(0.)
            .min(1.);

        let current = self.throttle.get::<ratio>();
        let step = self.demand - current;
        let time_constant = Autothrottle::time_constant_for(step);
        let fraction = 1. - (-context.delta_as_secs_f64() / time_constant).exp();

        self.throttle = Ratio::new::<ratio>(current + step * fraction);
    }

    /// Interpolates between the slow time constant for small trims and the fast time
    /// constant for large steps.
    fn time_constant_for(step: f64) -> f64 {
        let largeness = ((step.abs() - Autothrottle::SMALL_STEP)
            / (Autothrottle::LARGE_STEP - Autothrottle::SMALL_STEP))
            .max(0.)
            .min(1.);

        Autothrottle::SLOW_TIME_CONSTANT_SECONDS
            - (Autothrottle::SLOW_TIME_CONSTANT_SECONDS - Autothrottle::FAST_TIME_CONSTANT_SECONDS)
                * largeness
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn demand(&self) -> Ratio {
        Ratio::new::<ratio>(self.demand)
    }

    /// The lagged throttle to apply to every engine.
    pub fn throttle(&self) -> Ratio {
        self.throttle
    }
}
impl Default for Autothrottle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::test_helpers::context_with;
    use ntest::assert_about_eq;

    fn update_at(autothrottle: &mut Autothrottle, airspeed: f64, target: f64) {
        let context = context_with()
            .indicated_airspeed(Velocity::new::<knot>(airspeed))
            .build();
        autothrottle.update(&context, Velocity::new::<knot>(target));
    }

    #[test]
    fn disengaged_autothrottle_does_nothing() {
        let mut autothrottle = Autothrottle::new();
        update_at(&mut autothrottle, 200., 250.);

        assert_about_eq!(autothrottle.throttle().get::<ratio>(), 0.);
    }

    #[test]
    fn engaging_does_not_step_the_throttle() {
        let mut autothrottle = Autothrottle::new();
        autothrottle.engage(Ratio::new::<ratio>(0.6));
        update_at(&mut autothrottle, 250., 250.);

        assert_about_eq!(autothrottle.throttle().get::<ratio>(), 0.6);
    }

    #[test]
    fn too_slow_increases_throttle() {
        let mut autothrottle = Autothrottle::new();
        autothrottle.engage(Ratio::new::<ratio>(0.5));
        update_at(&mut autothrottle, 230., 250.);

        assert!(autothrottle.throttle() > Ratio::new::<ratio>(0.5));
        assert!(autothrottle.throttle() < autothrottle.demand());
    }

    #[test]
    fn too_fast_decreases_throttle() {
        let mut autothrottle = Autothrottle::new();
        autothrottle.engage(Ratio::new::<ratio>(0.5));
        update_at(&mut autothrottle, 270., 250.);

        assert!(autothrottle.throttle() < Ratio::new::<ratio>(0.5));
    }

    #[test]
    fn demand_is_limited_to_full_throttle() {
        let mut autothrottle = Autothrottle::new();
        autothrottle.engage(Ratio::new::<ratio>(0.9));
        update_at(&mut autothrottle, 100., 300.);

        assert_about_eq!(autothrottle.demand().get::<ratio>(), 1.);
    }

    #[test]
    fn large_steps_spool_faster_than_small_trims() {
        assert_about_eq!(Autothrottle::time_constant_for(0.01), 4.);
        assert_about_eq!(Autothrottle::time_constant_for(-0.8), 1.);
        assert!(Autothrottle::time_constant_for(0.3) < Autothrottle::time_constant_for(0.1));
    }

    #[test]
    fn lag_converges_to_demand() {
        let mut autothrottle = Autothrottle::new();
        autothrottle.engage(Ratio::new::<ratio>(0.2));
        autothrottle.trim = 0.7;
        for _ in 0..30 {
            update_at(&mut autothrottle, 250., 250.);
        }

        assert_about_eq!(autothrottle.throttle().get::<ratio>(), 0.7, 0.01);
    }
}
