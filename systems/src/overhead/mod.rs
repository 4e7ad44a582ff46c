use crate::simulation::{SimulationElement, SimulatorWriter};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OnOffPushButtonState {
    On,
    Off,
}

pub struct OnOffPushButton {
    is_on_id: String,
    has_fault_id: String,
    state: OnOffPushButtonState,
    fault: bool,
}
impl OnOffPushButton {
    pub fn new_on(name: &str) -> OnOffPushButton {
        OnOffPushButton::new(name, OnOffPushButtonState::On)
    }

    pub fn new_off(name: &str) -> OnOffPushButton {
        OnOffPushButton::new(name, OnOffPushButtonState::Off)
    }

    fn new(name: &str, state: OnOffPushButtonState) -> OnOffPushButton {
        OnOffPushButton {
            is_on_id: format!("OVHD_{}_PB_IS_ON", name),
            has_fault_id: format!("OVHD_{}_PB_HAS_FAULT", name),
            state,
            fault: false,
        }
    }

    pub fn set_on(&mut self, value: bool) {
        self.state = if value {
            OnOffPushButtonState::On
        } else {
            OnOffPushButtonState::Off
        };
    }

    pub fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
    }

    pub fn has_fault(&self) -> bool {
        self.fault
    }

    pub fn is_on(&self) -> bool {
        self.state == OnOffPushButtonState::On
    }
}
impl SimulationElement for OnOffPushButton {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.is_on_id, self.is_on());
        writer.write_bool(&self.has_fault_id, self.has_fault());
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AutoOffPushButtonState {
    Auto,
    Off,
}

pub struct AutoOffPushButton {
    is_auto_id: String,
    has_fault_id: String,
    state: AutoOffPushButtonState,
    fault: bool,
}
impl AutoOffPushButton {
    pub fn new_auto(name: &str) -> AutoOffPushButton {
        AutoOffPushButton::new(name, AutoOffPushButtonState::Auto)
    }

    pub fn new_off(name: &str) -> AutoOffPushButton {
        AutoOffPushButton::new(name, AutoOffPushButtonState::Off)
    }

    fn new(name: &str, state: AutoOffPushButtonState) -> AutoOffPushButton {
        AutoOffPushButton {
            is_auto_id: format!("OVHD_{}_PB_IS_AUTO", name),
            has_fault_id: format!("OVHD_{}_PB_HAS_FAULT", name),
            state,
            fault: false,
        }
    }

    pub fn is_auto(&self) -> bool {
        self.state == AutoOffPushButtonState::Auto
    }

    pub fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
    }

    pub fn has_fault(&self) -> bool {
        self.fault
    }

    pub fn set_auto(&mut self, value: bool) {
        self.state = if value {
            AutoOffPushButtonState::Auto
        } else {
            AutoOffPushButtonState::Off
        };
    }
}
impl SimulationElement for AutoOffPushButton {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.is_auto_id, self.is_auto());
        writer.write_bool(&self.has_fault_id, self.has_fault());
    }
}

/// A fire push button cannot be pushed back in once released.
pub struct FirePushButton {
    is_released_id: String,
    released: bool,
}
impl FirePushButton {
    pub fn new(name: &str) -> Self {
        FirePushButton {
            is_released_id: format!("FIRE_BUTTON_{}", name),
            released: false,
        }
    }

    pub fn release(&mut self) {
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
impl SimulationElement for FirePushButton {
    fn write(&self, writer: &mut SimulatorWriter) {
        writer.write_bool(&self.is_released_id, self.is_released());
    }
}


#[cfg(test)]
mod auto_off_push_button_tests {
    use super::AutoOffPushButton;
    use crate::simulation::test::SimulationTestBed;

    #[test]
    fn new_auto_push_button_is_auto() {
        assert!(AutoOffPushButton::new_auto("TEST").is_auto());
    }

    #[test]
    fn new_off_push_button_is_off() {
        assert!(!AutoOffPushButton::new_off("TEST").is_auto());
    }

    #[test]
    fn set_auto_switches_between_auto_and_off() {
        let mut button = AutoOffPushButton::new_auto("TEST");
        button.set_auto(false);
        assert!(!button.is_auto());

        button.set_auto(true);
        assert!(button.is_auto());
    }

    #[test]
    fn writes_its_state() {
        let mut button = AutoOffPushButton::new_auto("HYD_ELEC_PUMP");
        button.set_fault(true);

        let mut test_bed = SimulationTestBed::new();
        test_bed.run_without_update(&mut button);

        assert!(test_bed.contains_bool("OVHD_HYD_ELEC_PUMP_PB_IS_AUTO", true));
        assert!(test_bed.contains_bool("OVHD_HYD_ELEC_PUMP_PB_HAS_FAULT", true));
    }
}
