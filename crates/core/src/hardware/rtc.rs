//! Syscon-resident clock state.
//!
//! The syscon keeps its own RTC counter and wake-up alarm, plus the 12-digit
//! manufacture timestamp burned in at the factory. All three are plain
//! read-backs at this level; ticking the RTC is the frontend's business.

pub struct Clock {
    /// RTC counter (seconds).
    pub clock: u32,
    /// Wake-up alarm counter (seconds).
    pub alarm: u32,
    /// Manufacture timestamp: 12 ASCII digits, YYYYMMDDhhmm.
    pub timestamp: [u8; 12],
}

impl Clock {
    pub fn new() -> Self {
        Clock { clock: 0, alarm: 0, timestamp: *b"200609220000" }
    }

    pub fn reset(&mut self) {
        *self = Clock::new();
    }
}
