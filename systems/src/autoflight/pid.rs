use std::time::Duration;

/// A PID controller with fixed gains. The integral term and the output are limited
/// symmetrically. The derivative is taken on the error and is zero on the first
/// update after construction or reset.
pub struct PidController {
    proportional_gain: f64,
    integral_gain: f64,
    derivative_gain: f64,
    integral_limit: f64,
    output_limit: f64,
    integral: f64,
    previous_error: Option<f64>,
}
impl PidController {
    pub fn new(proportional_gain: f64, integral_gain: f64, derivative_gain: f64) -> Self {
        Self {
            proportional_gain,
            integral_gain,
            derivative_gain,
            integral_limit: f64::INFINITY,
            output_limit: f64::INFINITY,
            integral: 0.,
            previous_error: None,
        }
    }

    /// Limits the contribution of the integral term to the output.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = limit.abs();
        self
    }

    pub fn with_output_limit(mut self, limit: f64) -> Self {
        self.output_limit = limit.abs();
        self
    }

    pub fn update(&mut self, error: f64, delta: Duration) -> f64 {
        let seconds = delta.as_secs_f64();

        if self.integral_gain != 0. {
            let limit = self.integral_limit / self.integral_gain.abs();
            self.integral = (self.integral + error * seconds).max(-limit).min(limit);
        }

        let derivative = match self.previous_error {
            Some(previous) if seconds > 0. => (error - previous) / seconds,
            _ => 0.,
        };
        self.previous_error = Some(error);

        (self.proportional_gain * error
            + self.integral_gain * self.integral
            + self.derivative_gain * derivative)
            .max(-self.output_limit)
            .min(self.output_limit)
    }

    pub fn reset(&mut self) {
        self.integral = 0.;
        self.previous_error = None;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::assert_about_eq;

    fn second() -> Duration {
        Duration::from_secs(1)
    }

    #[test]
    fn proportional_only() {
        let mut pid = PidController::new(2., 0., 0.);

        assert_about_eq!(pid.update(3., second()), 6.);
    }

    #[test]
    fn integral_accumulates_over_time() {
        let mut pid = PidController::new(0., 0.5, 0.);
        pid.update(1., second());

        assert_about_eq!(pid.update(1., second()), 1.);
    }

    #[test]
    fn derivative_is_zero_on_first_update() {
        let mut pid = PidController::new(0., 0., 1.);

        assert_about_eq!(pid.update(5., second()), 0.);
        assert_about_eq!(pid.update(7., second()), 2.);
    }

    #[test]
    fn output_is_limited() {
        let mut pid = PidController::new(10., 0., 0.).with_output_limit(1.);

        assert_about_eq!(pid.update(5., second()), 1.);
        assert_about_eq!(pid.update(-5., second()), -1.);
    }

    #[test]
    fn integral_contribution_is_limited() {
        let mut pid = PidController::new(0., 1., 0.).with_integral_limit(2.);
        for _ in 0..10 {
            pid.update(1., second());
        }

        assert_about_eq!(pid.update(1., second()), 2.);
    }

    #[test]
    fn reset_clears_history() {
        let mut pid = PidController::new(0., 1., 1.);
        pid.update(4., second());
        pid.reset();

        assert_about_eq!(pid.integral(), 0.);
        assert_about_eq!(pid.update(1., second()), 1.);
    }

    #[test]
    fn zero_delta_does_not_divide_by_zero() {
        let mut pid = PidController::new(1., 1., 1.);
        pid.update(1., second());

        assert_about_eq!(pid.update(2., Duration::from_secs(0)), 3.);
    }
}
