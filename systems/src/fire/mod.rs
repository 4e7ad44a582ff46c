//! Engine and APU fire protection. Fires are injected as failures. A fire is only
//! detected while the detection loops are electrically powered. Releasing a zone's fire
//! push button shuts down what it protects and arms its extinguisher bottles.
use crate::{
    failures::{Failable, Failure, FailureId, RecoveryPolicy},
    overhead::FirePushButton,
    simulation::{SimulationElement, SimulationElementVisitor, SimulatorWriter},
};
use log::info;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FireZoneId {
    Engine(usize),
    Apu,
}
impl FireZoneId {
    fn failure_id(&self) -> FailureId {
        match self {
            FireZoneId::Engine(number) => FailureId::EngineFire(*number),
            FireZoneId::Apu => FailureId::ApuFire,
        }
    }

    fn bottles(&self) -> u8 {
        match self {
            FireZoneId::Engine(_) => 2,
            FireZoneId::Apu => 1,
        }
    }
}
impl fmt::Display for FireZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireZoneId::Engine(number) => write!(f, "ENG_{}", number),
            FireZoneId::Apu => write!(f, "APU"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum FireCommandError {
    #[error("fire zone {0} does not exist")]
    UnknownZone(FireZoneId),
    #[error("the fire push button of {0} must be released before discharging agent")]
    PushButtonNotReleased(FireZoneId),
    #[error("no extinguishing agent remains for {0}")]
    NoAgentRemaining(FireZoneId),
}

pub struct FireZone {
    id: FireZoneId,
    detected_id: String,
    bottles_id: String,
    fire: Failure,
    push_button: FirePushButton,
    bottles: u8,
    detected: bool,
    protected_system_running: bool,
}
impl FireZone {
    pub fn new(id: FireZoneId) -> Self {
        Self {
            id,
            detected_id: format!("FIRE_{}_DETECTED", id),
            bottles_id: format!("FIRE_{}_BOTTLES", id),
            fire: Failure::new(id.failure_id(), RecoveryPolicy::Manual),
            push_button: FirePushButton::new(&id.to_string()),
            bottles: id.bottles(),
            detected: false,
            protected_system_running: false,
        }
    }

    fn update(&mut self, detection_powered: bool, protected_system_running: bool) {
        self.detected = detection_powered && self.fire.is_active();
        self.protected_system_running = protected_system_running;
    }

    fn release_push_button(&mut self) {
        if !self.push_button.is_released() {
            info!("Fire push button {} released.", self.id);
        }
        self.push_button.release();
    }

    fn discharge_agent(&mut self) -> Result<(), FireCommandError> {
        if !self.push_button.is_released() {
            return Err(FireCommandError::PushButtonNotReleased(self.id));
        }
        if self.bottles == 0 {
            return Err(FireCommandError::NoAgentRemaining(self.id));
        }

        self.bottles -= 1;
        if self.fire.is_active() {
            info!("Fire in {} extinguished.", self.id);
        }
        self.fire.clear();
        self.detected = false;

        Ok(())
    }

    pub fn id(&self) -> FireZoneId {
        self.id
    }

    pub fn is_on_fire(&self) -> bool {
        self.fire.is_active()
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn is_push_button_released(&self) -> bool {
        self.push_button.is_released()
    }

    pub fn bottles(&self) -> u8 {
        self.bottles
    }
}
impl Failable for FireZone {
    fn failure(&self) -> &Failure {
        &self.fire
    }

    fn failure_mut(&mut self) -> &mut Failure {
        &mut self.fire
    }

    fn failure_exposure(&self) -> f64 {
        if self.protected_system_running {
            1.
        } else {
            0.
        }
    }
}
impl SimulationElement for FireZone {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        self.fire.accept(visitor);
        self.push_button.accept(visitor);
        visitor.visit(self);
    }

    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.detected_id, self.detected);
        writer.write_f64(&self.bottles_id, self.bottles as f64);
    }
}

pub struct FireUpdateArguments {
    detection_powered: bool,
    engines_running: [bool; 2],
    apu_running: bool,
}
impl FireUpdateArguments {
    pub fn new(detection_powered: bool, engines_running: [bool; 2], apu_running: bool) -> Self {
        Self {
            detection_powered,
            engines_running,
            apu_running,
        }
    }
}

pub struct FireProtection {
    engines: [FireZone; 2],
    apu: FireZone,
}
impl FireProtection {
    pub fn new() -> Self {
        Self {
            engines: [
                FireZone::new(FireZoneId::Engine(1)),
                FireZone::new(FireZoneId::Engine(2)),
            ],
            apu: FireZone::new(FireZoneId::Apu),
        }
    }

    pub fn update(&mut self, arguments: &FireUpdateArguments) {
        for (zone, running) in self.engines.iter_mut().zip(arguments.engines_running.iter()) {
            zone.update(arguments.detection_powered, *running);
        }
        self.apu
            .update(arguments.detection_powered, arguments.apu_running);
    }

    pub fn zone(&self, id: FireZoneId) -> Option<&FireZone> {
        match id {
            FireZoneId::Engine(number) => self.engines.get(number.wrapping_sub(1)),
            FireZoneId::Apu => Some(&self.apu),
        }
    }

    fn zone_mut(&mut self, id: FireZoneId) -> Result<&mut FireZone, FireCommandError> {
        let zone = match id {
            FireZoneId::Engine(number) => self.engines.get_mut(number.wrapping_sub(1)),
            FireZoneId::Apu => Some(&mut self.apu),
        };

        zone.ok_or(FireCommandError::UnknownZone(id))
    }

    pub fn release_push_button(&mut self, id: FireZoneId) -> Result<(), FireCommandError> {
        self.zone_mut(id)?.release_push_button();
        Ok(())
    }

    pub fn discharge_agent(&mut self, id: FireZoneId) -> Result<(), FireCommandError> {
        self.zone_mut(id)?.discharge_agent()
    }

    pub fn is_push_button_released(&self, id: FireZoneId) -> bool {
        self.zone(id)
            .map_or(false, |zone| zone.is_push_button_released())
    }

    pub fn is_engine_fire_detected(&self) -> bool {
        self.engines.iter().any(|zone| zone.is_detected())
    }

    pub fn is_apu_fire_detected(&self) -> bool {
        self.apu.is_detected()
    }

    pub fn zones_mut(&mut self) -> impl Iterator<Item = &mut FireZone> {
        self.engines
            .iter_mut()
            .chain(std::iter::once(&mut self.apu))
    }
}
impl SimulationElement for FireProtection {
    fn accept<T: SimulationElementVisitor>(&mut self, visitor: &mut T) {
        for zone in self.zones_mut() {
            zone.accept(visitor);
        }

        visitor.visit(self);
    }
}
impl Default for FireProtection {
    fn default() -> Self {
        Self::new()
    }
}
