//! Memory-mapped hardware register windows.
//!
//! Each peripheral claims a fixed range of the physical address space and
//! handles 32-bit accesses keyed by `address - base_address`. Offsets a
//! handler does not implement fall through to [`RegisterWindow`], which
//! behaves as plain register storage — unmapped-but-claimed registers
//! remember whatever was last written, like the real bus does.
//!
//! - [`syscon::Syscon`] — system controller command/response engine
//! - [`gpio::Gpio`] — GPIO port, carrying the syscon end-of-command line

pub mod gpio;
pub mod syscon;

use std::collections::BTreeMap;

/// Generic backing store for a peripheral's register window.
///
/// Handlers try their own offset table first and delegate everything else
/// here, so unknown registers read back what was written and read as zero
/// until then.
pub struct RegisterWindow {
    base: u32,
    regs: BTreeMap<u32, u32>,
}

impl RegisterWindow {
    pub fn new(base: u32) -> Self {
        RegisterWindow { base, regs: BTreeMap::new() }
    }

    pub fn base_address(&self) -> u32 {
        self.base
    }

    /// Offset of `address` from the window base.
    #[inline(always)]
    pub fn offset(&self, address: u32) -> u32 {
        address.wrapping_sub(self.base)
    }

    pub fn read32(&self, address: u32) -> u32 {
        self.regs.get(&self.offset(address)).copied().unwrap_or(0)
    }

    pub fn write32(&mut self, address: u32, value: u32) {
        self.regs.insert(self.offset(address), value);
    }

    pub fn reset(&mut self) {
        self.regs.clear();
    }

    /// Stored registers as (offset, value) pairs, for state capture.
    pub fn dump_regs(&self) -> Vec<(u32, u32)> {
        self.regs.iter().map(|(&k, &v)| (k, v)).collect()
    }

    pub fn restore_regs(&mut self, regs: &[(u32, u32)]) {
        self.regs = regs.iter().copied().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_storage() {
        let mut w = RegisterWindow::new(0xBE58_0000);
        assert_eq!(w.read32(0xBE58_0010), 0);
        w.write32(0xBE58_0010, 0x1234);
        assert_eq!(w.read32(0xBE58_0010), 0x1234);
        assert_eq!(w.read32(0xBE58_0014), 0);
    }

    #[test]
    fn test_dump_restore() {
        let mut w = RegisterWindow::new(0xBE58_0000);
        w.write32(0xBE58_0010, 7);
        w.write32(0xBE58_0024, 9);
        let regs = w.dump_regs();
        let mut w2 = RegisterWindow::new(0xBE58_0000);
        w2.restore_regs(&regs);
        assert_eq!(w2.read32(0xBE58_0010), 7);
        assert_eq!(w2.read32(0xBE58_0024), 9);
    }
}
