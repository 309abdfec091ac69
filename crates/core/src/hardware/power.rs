//! Power management state.
//!
//! Status words reported by the power/supply queries plus the radio power
//! lines the syscon switches. `force_suspend_capacity` is the battery
//! threshold (in mAh) below which the kernel force-suspends; retail units
//! report 72.

use tracing::debug;

/// Supply status bit: a battery pack is equipped.
pub const SUPPLY_STATUS_BATTERY_EQUIPPED: u32 = 0x02;

pub struct Power {
    pub force_suspend_capacity: u32,
    pub power_status: u32,
    pub supply_status: u32,
    pub hr_power: bool,
    pub wlan_power: bool,
}

impl Power {
    pub fn new() -> Self {
        Power {
            force_suspend_capacity: 72,
            power_status: 0,
            supply_status: SUPPLY_STATUS_BATTERY_EQUIPPED,
            hr_power: false,
            wlan_power: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Power::new();
    }

    /// Headphone-remote power line.
    pub fn set_hr_power(&mut self, on: bool) {
        debug!("HR power {}", if on { "on" } else { "off" });
        self.hr_power = on;
    }

    pub fn set_wlan_power(&mut self, on: bool) {
        debug!("WLAN power {}", if on { "on" } else { "off" });
        self.wlan_power = on;
    }
}
