//! Battery pack model.
//!
//! Telemetry values the syscon battery commands read back. Defaults
//! describe a healthy full retail pack; frontends can mutate the fields to
//! simulate drain or an aged pack.

pub struct Battery {
    pub present: bool,
    /// Remaining charge in percent of full capacity.
    pub charge_percent: u32,
    /// Design capacity in mAh.
    pub full_capacity: u32,
    /// Completed charge cycles.
    pub cycle_count: u32,
    /// Estimated remaining runtime in minutes.
    pub limit_time: u32,
    /// Pack temperature in degrees Celsius.
    pub temperature: u32,
    /// Terminal voltage in mV.
    pub voltage: u32,
    /// Discharge current in mA.
    pub current: u32,
}

impl Battery {
    pub fn new() -> Self {
        Battery {
            present: true,
            charge_percent: 100,
            full_capacity: 1800,
            cycle_count: 0,
            limit_time: 300,
            temperature: 28,
            voltage: 4154,
            current: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Battery::new();
    }

    /// Remaining capacity in mAh.
    pub fn status_cap1(&self) -> u32 {
        self.full_capacity * self.charge_percent / 100
    }

    /// Full-charge capacity in mAh.
    pub fn status_cap2(&self) -> u32 {
        self.full_capacity
    }
}
