//! LED state.
//!
//! Four independently controllable LEDs driven by the syscon CTRL_LED
//! command. The bluetooth LED only exists on the PSP Go; keeping the field
//! on every model is harmless since nothing selects it elsewhere.

use tracing::debug;

pub struct Led {
    pub memory_stick: bool,
    pub wlan: bool,
    pub power: bool,
    pub bluetooth: bool,
}

impl Led {
    pub fn new() -> Self {
        Led { memory_stick: false, wlan: false, power: false, bluetooth: false }
    }

    pub fn reset(&mut self) {
        *self = Led::new();
    }

    pub fn set_memory_stick_on(&mut self, on: bool) {
        debug!("memory stick LED {}", if on { "on" } else { "off" });
        self.memory_stick = on;
    }

    pub fn set_wlan_on(&mut self, on: bool) {
        debug!("WLAN LED {}", if on { "on" } else { "off" });
        self.wlan = on;
    }

    pub fn set_power_on(&mut self, on: bool) {
        debug!("power LED {}", if on { "on" } else { "off" });
        self.power = on;
    }

    pub fn set_bluetooth_on(&mut self, on: bool) {
        debug!("bluetooth LED {}", if on { "on" } else { "off" });
        self.bluetooth = on;
    }
}
