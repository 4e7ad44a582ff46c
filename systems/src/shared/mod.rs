use crate::simulation::UpdateContext;
use std::time::Duration;
use thiserror::Error;
use uom::si::{f64::*, thermodynamic_temperature::degree_celsius};

/// The delay logic gate delays the true result of a given expression by the given amount of time.
/// False results are output immediately.
pub struct DelayedTrueLogicGate {
    delay: Duration,
    expression_result: bool,
    true_duration: Duration,
}
impl DelayedTrueLogicGate {
    pub fn new(delay: Duration) -> DelayedTrueLogicGate {
        DelayedTrueLogicGate {
            delay,
            expression_result: false,
            true_duration: Duration::from_millis(0),
        }
    }

    pub fn update(&mut self, context: &UpdateContext, expression_result: bool) {
        // We do not include the delta representing the moment before the expression_result became true.
        if self.expression_result && expression_result {
            self.true_duration += context.delta();
        } else {
            self.true_duration = Duration::from_millis(0);
        }

        self.expression_result = expression_result;
    }

    pub fn output(&self) -> bool {
        self.expression_result && self.delay <= self.true_duration
    }

    pub fn reset(&mut self) {
        self.expression_result = false;
        self.true_duration = Duration::from_millis(0);
    }
}

/// Moves the current value towards the target value by at most `rate_per_second` for
/// every second in the given delta. Never overshoots the target.
pub fn calculate_towards_target(
    current: f64,
    target: f64,
    rate_per_second: f64,
    delta: Duration,
) -> f64 {
    let step = rate_per_second * delta.as_secs_f64();
    if current > target {
        (current - step).max(target)
    } else {
        (current + step).min(target)
    }
}

/// Given a current and target temperature, takes a coefficient and delta to
/// determine the new temperature after a certain duration has passed.
pub(crate) fn calculate_towards_target_temperature(
    current: ThermodynamicTemperature,
    target: ThermodynamicTemperature,
    coefficient: f64,
    delta: Duration,
) -> ThermodynamicTemperature {
    if current == target {
        current
    } else {
        ThermodynamicTemperature::new::<degree_celsius>(calculate_towards_target(
            current.get::<degree_celsius>(),
            target.get::<degree_celsius>(),
            coefficient,
            delta,
        ))
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("the dependencies between the system kinds contain a cycle")]
pub struct DependencyCycle;

/// Orders the given kinds such that every kind comes after all of its dependencies.
/// Dependencies on kinds which are not part of the given kinds are ignored. When multiple
/// kinds are ready at the same time, the order of declaration decides.
pub fn topological_order<T: Copy + PartialEq, U: Fn(T) -> Vec<T>>(
    kinds: &[T],
    dependencies_of: U,
) -> Result<Vec<T>, DependencyCycle> {
    let mut ordered: Vec<T> = Vec::with_capacity(kinds.len());

    while ordered.len() < kinds.len() {
        let ready = kinds.iter().copied().find(|kind| {
            !ordered.contains(kind)
                && dependencies_of(*kind)
                    .iter()
                    .all(|dependency| ordered.contains(dependency) || !kinds.contains(dependency))
        });

        match ready {
            Some(kind) => ordered.push(kind),
            None => return Err(DependencyCycle),
        }
    }

    Ok(ordered)
}



#[cfg(test)]
mod topological_order_tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Kind {
        Source,
        Bus,
        Consumer,
        Display,
    }

    fn dependencies(kind: Kind) -> Vec<Kind> {
        match kind {
            Kind::Source => vec![],
            Kind::Bus => vec![Kind::Source],
            Kind::Consumer => vec![Kind::Bus],
            Kind::Display => vec![Kind::Consumer, Kind::Source],
        }
    }

    #[test]
    fn orders_dependencies_before_dependants() {
        let order = topological_order(
            &[Kind::Display, Kind::Consumer, Kind::Bus, Kind::Source],
            dependencies,
        );

        assert_eq!(
            order,
            Ok(vec![Kind::Source, Kind::Bus, Kind::Consumer, Kind::Display])
        );
    }

    #[test]
    fn keeps_declaration_order_for_independent_kinds() {
        let order = topological_order(&[Kind::Bus, Kind::Source], |_| vec![]);

        assert_eq!(order, Ok(vec![Kind::Bus, Kind::Source]));
    }

    #[test]
    fn ignores_dependencies_which_are_not_ordered() {
        let order = topological_order(&[Kind::Consumer], dependencies);

        assert_eq!(order, Ok(vec![Kind::Consumer]));
    }

    #[test]
    fn reports_a_cycle() {
        let order = topological_order(&[Kind::Source, Kind::Bus], |kind| match kind {
            Kind::Source => vec![Kind::Bus],
            _ => vec![Kind::Source],
        });

        assert_eq!(order, Err(DependencyCycle));
    }
}
