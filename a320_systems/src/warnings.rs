use super::A320;
use systems::{electrical::PowerSource, fire::FireZoneId, warning::WarningSignals};
use uom::si::f64::*;

impl WarningSignals for A320 {
    fn engine_fire_detected(&self, number: usize) -> bool {
        self.fire
            .zone(FireZoneId::Engine(number))
            .map_or(false, |zone| zone.is_detected())
    }

    fn apu_fire_detected(&self) -> bool {
        self.fire
            .zone(FireZoneId::Apu)
            .map_or(false, |zone| zone.is_detected())
    }

    fn cabin_altitude_excessive(&self) -> bool {
        self.pressurization.is_cabin_altitude_excessive()
    }

    fn indicated_airspeed(&self) -> Velocity {
        self.flight_state.indicated_airspeed
    }

    fn stall_speed(&self) -> Velocity {
        self.anti_ice.stall_speed()
    }

    fn altitude_above_ground(&self) -> Length {
        self.flight_state.altitude_above_ground
    }

    fn vertical_speed(&self) -> Velocity {
        self.flight_state.vertical_speed
    }

    fn is_on_ground(&self) -> bool {
        self.flight_state.on_ground
    }

    fn electrical_emergency_configuration(&self) -> bool {
        self.electrical_bus.is_in_emergency_configuration()
    }

    fn hydraulic_pressure_low(&self) -> bool {
        self.hydraulic.is_pressure_low()
    }

    fn generator_faulted(&self, number: usize) -> bool {
        self.engine_generator(number)
            .map_or(false, |generator| generator.is_failed())
    }

    fn apu_generator_faulted(&self) -> bool {
        self.apu.generator().is_failed()
    }

    fn engine_flamed_out(&self, number: usize) -> bool {
        self.engine(number)
            .map_or(false, |engine| engine.flameout().is_some())
    }

    fn brakes_hot(&self) -> bool {
        self.brakes.is_hot()
    }

    fn fuel_low(&self) -> bool {
        self.fuel.is_fuel_low()
    }

    fn fuel_imbalanced(&self) -> bool {
        self.fuel.is_imbalanced()
    }

    fn oxygen_low(&self) -> bool {
        self.pressurization.is_oxygen_low()
    }

    fn ice_detected(&self) -> bool {
        self.anti_ice.is_ice_detected()
    }

    fn traffic_advisory(&self) -> bool {
        self.tcas.has_traffic_advisory()
    }

    fn resolution_advisory(&self) -> bool {
        self.tcas.has_resolution_advisory()
    }
}
