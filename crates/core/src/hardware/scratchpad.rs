//! Syscon scratchpad.
//!
//! 32 bytes of non-volatile storage inside the system controller, read back
//! through READ_SCRATCHPAD in 1/2/4/8-byte chunks addressed by a source
//! offset. Reads beyond the end return zeros instead of wrapping.

pub const SCRATCHPAD_SIZE: usize = 32;

pub struct Scratchpad {
    pub data: [u8; SCRATCHPAD_SIZE],
}

impl Scratchpad {
    pub fn new() -> Self {
        Scratchpad { data: [0; SCRATCHPAD_SIZE] }
    }

    pub fn reset(&mut self) {
        *self = Scratchpad::new();
    }

    /// Copy bytes starting at `src` into `out`; out-of-range bytes are zero.
    pub fn read(&self, src: usize, out: &mut [u8]) {
        for (i, b) in out.iter_mut().enumerate() {
            *b = self.data.get(src + i).copied().unwrap_or(0);
        }
    }

    pub fn write(&mut self, src: usize, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            if let Some(slot) = self.data.get_mut(src + i) {
                *slot = *b;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let mut s = Scratchpad::new();
        s.write(4, &[0xAA, 0xBB]);
        let mut out = [0u8; 4];
        s.read(3, &mut out);
        assert_eq!(out, [0x00, 0xAA, 0xBB, 0x00]);
    }

    #[test]
    fn test_read_past_end_is_zero() {
        let mut s = Scratchpad::new();
        s.write(SCRATCHPAD_SIZE - 1, &[0x11, 0x22]);
        let mut out = [0xFFu8; 2];
        s.read(SCRATCHPAD_SIZE - 1, &mut out);
        assert_eq!(out, [0x11, 0x00]);
    }
}
