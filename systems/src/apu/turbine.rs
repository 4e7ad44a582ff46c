use super::{Turbine, TurbineController, TurbineState};
use crate::{
    shared::{calculate_towards_target, calculate_towards_target_temperature},
    simulation::UpdateContext,
};
use std::time::Duration;
use uom::si::{f64::*, ratio::percent, thermodynamic_temperature::degree_celsius};

pub(super) struct Shutdown {
    egt: ThermodynamicTemperature,
}
impl Shutdown {
    pub(super) fn new() -> Self {
        Shutdown {
            egt: ThermodynamicTemperature::new::<degree_celsius>(0.),
        }
    }

    fn new_with_egt(egt: ThermodynamicTemperature) -> Self {
        Shutdown { egt }
    }
}
impl Turbine for Shutdown {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: bool,
        _: bool,
        controller: &dyn TurbineController,
    ) -> Box<dyn Turbine> {
        self.egt = calculate_towards_ambient_egt(self.egt, context);

        if controller.should_start() {
            Box::new(Starting::new(self.egt))
        } else {
            self
        }
    }

    fn n(&self) -> Ratio {
        Ratio::new::<percent>(0.)
    }

    fn egt(&self) -> ThermodynamicTemperature {
        self.egt
    }

    fn state(&self) -> TurbineState {
        TurbineState::Shutdown
    }
}

struct Starting {
    since: Duration,
    n: Ratio,
    egt: ThermodynamicTemperature,
}
impl Starting {
    const IGNITION_DELAY: Duration = Duration::from_millis(1_500);
    const ACCELERATION_DURATION_SECONDS: f64 = 38.5;
    const PEAK_EGT_DEGREES_CELSIUS: f64 = 700.;
    const PEAK_EGT_UNTIL_N_PERCENT: f64 = 50.;
    const EGT_RISE_COEFFICIENT: f64 = 30.;

    fn new(egt: ThermodynamicTemperature) -> Starting {
        Starting {
            since: Duration::from_secs(0),
            n: Ratio::new::<percent>(0.),
            egt,
        }
    }

    fn calculate_n(&self) -> Ratio {
        let ignition_turned_on_secs = self
            .since
            .checked_sub(Starting::IGNITION_DELAY)
            .map_or(0., |duration| duration.as_secs_f64());

        Ratio::new::<percent>(
            (ignition_turned_on_secs * 100. / Starting::ACCELERATION_DURATION_SECONDS).min(100.),
        )
    }

    fn calculate_egt(&self, context: &UpdateContext) -> ThermodynamicTemperature {
        if self.n.get::<percent>() <= 0. {
            calculate_towards_ambient_egt(self.egt, context)
        } else {
            let target = if self.n.get::<percent>() < Starting::PEAK_EGT_UNTIL_N_PERCENT {
                Starting::PEAK_EGT_DEGREES_CELSIUS
            } else {
                Running::BASE_EGT_DEGREES_CELSIUS
            };

            calculate_towards_target_temperature(
                self.egt,
                ThermodynamicTemperature::new::<degree_celsius>(target),
                Starting::EGT_RISE_COEFFICIENT,
                context.delta(),
            )
        }
    }
}
impl Turbine for Starting {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: bool,
        _: bool,
        controller: &dyn TurbineController,
    ) -> Box<dyn Turbine> {
        self.since += context.delta();
        self.n = self.calculate_n();
        self.egt = self.calculate_egt(context);

        if controller.should_stop() {
            Box::new(Stopping::new(self.egt, self.n))
        } else if (self.n.get::<percent>() - 100.).abs() < f64::EPSILON {
            Box::new(Running::new(self.egt))
        } else {
            self
        }
    }

    fn n(&self) -> Ratio {
        self.n
    }

    fn egt(&self) -> ThermodynamicTemperature {
        self.egt
    }

    fn state(&self) -> TurbineState {
        TurbineState::Starting
    }
}

struct Running {
    egt: ThermodynamicTemperature,
}
impl Running {
    const BASE_EGT_DEGREES_CELSIUS: f64 = 345.;
    const BLEED_AIR_IN_USE_DELTA_DEGREES_CELSIUS: f64 = 35.;
    const GENERATOR_IN_USE_DELTA_DEGREES_CELSIUS: f64 = 12.;

    fn new(egt: ThermodynamicTemperature) -> Running {
        Running { egt }
    }

    fn calculate_slow_cooldown_to_running_temperature(
        &self,
        context: &UpdateContext,
        apu_gen_is_used: bool,
        apu_bleed_is_used: bool,
    ) -> ThermodynamicTemperature {
        let mut target = Running::BASE_EGT_DEGREES_CELSIUS;
        if apu_bleed_is_used {
            target += Running::BLEED_AIR_IN_USE_DELTA_DEGREES_CELSIUS;
        }
        if apu_gen_is_used {
            target += Running::GENERATOR_IN_USE_DELTA_DEGREES_CELSIUS;
        }

        calculate_towards_target_temperature(
            self.egt,
            ThermodynamicTemperature::new::<degree_celsius>(target),
            0.4,
            context.delta(),
        )
    }
}
impl Turbine for Running {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        apu_bleed_is_used: bool,
        apu_gen_is_used: bool,
        controller: &dyn TurbineController,
    ) -> Box<dyn Turbine> {
        self.egt = self.calculate_slow_cooldown_to_running_temperature(
            context,
            apu_gen_is_used,
            apu_bleed_is_used,
        );

        if controller.should_stop() {
            Box::new(Stopping::new(self.egt, Ratio::new::<percent>(100.)))
        } else {
            self
        }
    }

    fn n(&self) -> Ratio {
        Ratio::new::<percent>(100.)
    }

    fn egt(&self) -> ThermodynamicTemperature {
        self.egt
    }

    fn state(&self) -> TurbineState {
        TurbineState::Running
    }
}

struct Stopping {
    n: Ratio,
    egt: ThermodynamicTemperature,
}
impl Stopping {
    const SPOOL_DOWN_PERCENT_PER_SECOND: f64 = 10.;

    fn new(egt: ThermodynamicTemperature, n: Ratio) -> Stopping {
        Stopping { n, egt }
    }
}
impl Turbine for Stopping {
    fn update(
        mut self: Box<Self>,
        context: &UpdateContext,
        _: bool,
        _: bool,
        _: &dyn TurbineController,
    ) -> Box<dyn Turbine> {
        self.n = Ratio::new::<percent>(calculate_towards_target(
            self.n.get::<percent>(),
            0.,
            Stopping::SPOOL_DOWN_PERCENT_PER_SECOND,
            context.delta(),
        ));
        self.egt = calculate_towards_ambient_egt(self.egt, context);

        if self.n.get::<percent>() <= 0. {
            Box::new(Shutdown::new_with_egt(self.egt))
        } else {
            self
        }
    }

    fn n(&self) -> Ratio {
        self.n
    }

    fn egt(&self) -> ThermodynamicTemperature {
        self.egt
    }

    fn state(&self) -> TurbineState {
        TurbineState::Stopping
    }
}

fn calculate_towards_ambient_egt(
    current_egt: ThermodynamicTemperature,
    context: &UpdateContext,
) -> ThermodynamicTemperature {
    const APU_AMBIENT_COEFFICIENT: f64 = 2.;
    calculate_towards_target_temperature(
        current_egt,
        context.ambient_temperature(),
        APU_AMBIENT_COEFFICIENT,
        context.delta(),
    )
}
