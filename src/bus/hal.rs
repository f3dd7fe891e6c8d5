//! LinuxCNC HAL pin adapter.
//!
//! Registers the `lube_pump` HAL component with the pin set the machine
//! configuration nets to the pump relay, pressure switch and axis position
//! feedback. Pin read faults are not propagated into the decision logic;
//! the adapter logs them and substitutes safe values (inputs read as off,
//! positions as unchanged zero).

use crate::bus::{MachineBus, Signals};
use crate::error::AppError;
use linuxcnc_hal::error::PinRegisterError;
use linuxcnc_hal::hal_pin::{InputPin, OutputPin};
use linuxcnc_hal::{HalComponent, RegisterResources, Resources};

pub struct LubePins {
    machine_on: InputPin<bool>,
    pressure_ok: InputPin<bool>,
    x_axis_position: InputPin<f64>,
    y_axis_position: InputPin<f64>,
    z_axis_position: InputPin<f64>,
    pump_active: OutputPin<bool>,
    error_active: OutputPin<bool>,
}

impl Resources for LubePins {
    type RegisterError = PinRegisterError;

    fn register_resources(comp: &RegisterResources) -> Result<Self, Self::RegisterError> {
        Ok(Self {
            machine_on: comp.register_pin::<InputPin<bool>>("machine_on")?,
            pressure_ok: comp.register_pin::<InputPin<bool>>("pressure_ok")?,
            x_axis_position: comp.register_pin::<InputPin<f64>>("x_axis_position")?,
            y_axis_position: comp.register_pin::<InputPin<f64>>("y_axis_position")?,
            z_axis_position: comp.register_pin::<InputPin<f64>>("z_axis_position")?,
            pump_active: comp.register_pin::<OutputPin<bool>>("pump_active")?,
            error_active: comp.register_pin::<OutputPin<bool>>("error_active")?,
        })
    }
}

/// Machine bus backed by LinuxCNC HAL pins.
pub struct HalBus {
    component: HalComponent<LubePins>,
}

impl HalBus {
    /// Register the HAL component and mark it ready.
    pub fn new() -> Result<Self, AppError> {
        let component =
            HalComponent::new("lube_pump").map_err(|e| AppError::Hal(e.to_string()))?;
        Ok(Self { component })
    }

    /// Whether the HAL runtime has asked the component to shut down.
    pub fn should_exit(&self) -> bool {
        self.component.should_exit()
    }
}

impl MachineBus for HalBus {
    fn signals(&mut self) -> Signals {
        let pins = self.component.resources();
        Signals {
            machine_on: read_bit(&pins.machine_on, "machine_on"),
            pressure_ok: read_bit(&pins.pressure_ok, "pressure_ok"),
            x_axis_position: read_float(&pins.x_axis_position, "x_axis_position"),
            y_axis_position: read_float(&pins.y_axis_position, "y_axis_position"),
            z_axis_position: read_float(&pins.z_axis_position, "z_axis_position"),
        }
    }

    fn set_pump_active(&mut self, on: bool) {
        let pins = self.component.resources();
        if let Err(e) = pins.pump_active.set_value(on) {
            tracing::warn!(error = %e, "failed to write pump_active pin");
        }
    }

    fn set_error_active(&mut self, on: bool) {
        let pins = self.component.resources();
        if let Err(e) = pins.error_active.set_value(on) {
            tracing::warn!(error = %e, "failed to write error_active pin");
        }
    }
}

fn read_bit(pin: &InputPin<bool>, name: &str) -> bool {
    match pin.value() {
        Ok(value) => *value,
        Err(e) => {
            tracing::warn!(pin = name, error = %e, "failed to read pin, assuming off");
            false
        }
    }
}

fn read_float(pin: &InputPin<f64>, name: &str) -> f64 {
    match pin.value() {
        Ok(value) => *value,
        Err(e) => {
            tracing::warn!(pin = name, error = %e, "failed to read pin, assuming 0.0");
            0.0
        }
    }
}
