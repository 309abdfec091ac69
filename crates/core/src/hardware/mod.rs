//! Onboard hardware consulted by the system controller.
//!
//! The syscon owns none of this state itself: every command that reports a
//! live value reads it from one of these models, and every control command
//! flips a switch here. Frontends mutate the same models to simulate user
//! input, battery drain, or a different hardware revision.
//!
//! - [`Battery`] — pack telemetry (capacities, temperature, voltage, …)
//! - [`Controller`] — digital button bitmask and analog sampling mode
//! - [`Led`] — the four independently controllable LEDs
//! - [`Power`] — power-management status words and radio power lines
//! - [`Clock`] — RTC counter, alarm, and manufacture timestamp
//! - [`Scratchpad`] — 32 bytes of syscon-resident non-volatile storage
//! - [`UmdDrive`] — UMD drive (lepton DSP) power line

pub mod battery;
pub mod ctrl;
pub mod led;
pub mod power;
pub mod rtc;
pub mod scratchpad;

pub use battery::Battery;
pub use ctrl::Controller;
pub use led::Led;
pub use power::Power;
pub use rtc::Clock;
pub use scratchpad::{Scratchpad, SCRATCHPAD_SIZE};

use tracing::debug;

/// Hardware revision. Commands with model-dependent behavior (LED layout,
/// version words) switch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Model {
    /// PSP-1000 "fat"
    Fat = 0,
    /// PSP-2000 slim
    Slim = 1,
    /// PSP-3000 brite
    Brite = 2,
    /// PSP Go (N1000), the compact revision
    Go = 3,
    /// PSP-E1000 street
    Street = 4,
}

impl Model {
    /// Syscon firmware ("baryon") version word reported by GET_BARYON.
    pub fn baryon_version(self) -> u32 {
        match self {
            Model::Fat => 0x0011_4000,
            Model::Slim => 0x0023_4000,
            Model::Brite => 0x0026_3100,
            Model::Go => 0x0028_5000,
            Model::Street => 0x002E_4000,
        }
    }

    /// Power-management companion chip ("pommel") version word.
    pub fn pommel_version(self) -> u32 {
        match self {
            Model::Fat => 0x0000_0103,
            Model::Slim => 0x0000_0301,
            Model::Brite => 0x0000_0303,
            Model::Go => 0x0000_0403,
            Model::Street => 0x0000_0503,
        }
    }

    pub fn from_byte(b: u8) -> Option<Model> {
        match b {
            0 => Some(Model::Fat),
            1 => Some(Model::Slim),
            2 => Some(Model::Brite),
            3 => Some(Model::Go),
            4 => Some(Model::Street),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Model::Fat => "PSP-1000",
            Model::Slim => "PSP-2000",
            Model::Brite => "PSP-3000",
            Model::Go => "PSP Go",
            Model::Street => "PSP-E1000",
        }
    }
}

/// UMD drive power line (the drive's DSP is powered through the syscon).
pub struct UmdDrive {
    pub power: bool,
}

impl UmdDrive {
    pub fn new() -> Self {
        UmdDrive { power: false }
    }

    pub fn set_power(&mut self, on: bool) {
        debug!("UMD drive power {}", if on { "on" } else { "off" });
        self.power = on;
    }
}

/// All hardware models, threaded by reference into command dispatch.
pub struct Hardware {
    pub model: Model,
    pub battery: Battery,
    pub ctrl: Controller,
    pub led: Led,
    pub power: Power,
    pub clock: Clock,
    pub scratchpad: Scratchpad,
    pub umd: UmdDrive,
}

impl Hardware {
    pub fn new(model: Model) -> Self {
        Hardware {
            model,
            battery: Battery::new(),
            ctrl: Controller::new(),
            led: Led::new(),
            power: Power::new(),
            clock: Clock::new(),
            scratchpad: Scratchpad::new(),
            umd: UmdDrive::new(),
        }
    }

    /// Power-on defaults; the hardware model is a physical property and
    /// survives reset.
    pub fn reset(&mut self) {
        let model = self.model;
        *self = Hardware::new(model);
    }
}
