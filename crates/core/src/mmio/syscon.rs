//! System controller ("syscon") emulation.
//!
//! The syscon is the always-on microcontroller owning power, battery, LED,
//! RTC, and low-level controller functions. The kernel talks to it through
//! a 16-byte transfer buffer exposed as a handful of 32-bit registers: it
//! writes a command frame 16 bits at a time, triggers execution, then reads
//! the response frame back through the same buffer.
//!
//! | Offset | Access | Effect |
//! |--------|--------|--------|
//! | 0x08   | read   | pop a big-endian 16-bit pair at the cursor |
//! | 0x08   | write  | push a big-endian 16-bit pair at the cursor |
//! | 0x0C   | read   | status flags; rearms the cursor once a transfer ended |
//! | 0x04   | write  | control: bit2 rearm, bit1 execute / clear completion |
//! | 0x18   | read   | always 0 |
//! | 0x20   | write  | clear error status |
//! | other  | r/w    | plain register storage |
//!
//! A response frame is `status, len, payload…, checksum` where `len` counts
//! the status byte plus payload and the checksum is the complement of the
//! byte sum. Command execution is synchronous: it completes before the
//! triggering write returns, then raises the GPIO end-of-command bit the
//! kernel driver polls.

use tracing::{debug, trace, warn};

use crate::hardware::{Hardware, Model};
use crate::mmio::gpio::{Gpio, GPIO_PORT_SYSCON_END_CMD};
use crate::mmio::RegisterWindow;

pub const SYSCON_BASE_ADDRESS: u32 = 0xBE58_0000;
pub const SYSCON_WINDOW_SIZE: u32 = 0x28;

/// Transfer buffer capacity. One physical buffer serves both directions.
pub const MAX_DATA_LENGTH: usize = 16;

// Shared buffer layout, receive (device→guest) view
pub const RX_STATUS: usize = 0;
pub const RX_LEN: usize = 1;
pub const RX_RESPONSE: usize = 2;
// Transmit (guest→device) view of the same bytes
pub const TX_CMD: usize = 0;
pub const TX_LEN: usize = 1;
pub const TX_DATA: usize = 2;

/// Leading status byte of every command response.
pub const RESPONSE_LEADER: u8 = 0x82;

// ─── Command codes ──────────────────────────────────────────────────────────

pub const CMD_GET_BARYON: u8 = 0x01;
pub const CMD_GET_KERNEL_DIGITAL_KEY: u8 = 0x07;
pub const CMD_READ_CLOCK: u8 = 0x09;
pub const CMD_READ_ALARM: u8 = 0x0A;
pub const CMD_GET_POWER_SUPPLY_STATUS: u8 = 0x0B;
pub const CMD_GET_TIMESTAMP: u8 = 0x11;
pub const CMD_READ_SCRATCHPAD: u8 = 0x24;
pub const CMD_SEND_SETPARAM: u8 = 0x25;
pub const CMD_RECEIVE_SETPARAM: u8 = 0x26;
pub const CMD_RESET_DEVICE: u8 = 0x32;
pub const CMD_CTRL_ANALOG_XY_POLLING: u8 = 0x33;
pub const CMD_CTRL_HR_POWER: u8 = 0x34;
pub const CMD_GET_POMMEL_VERSION: u8 = 0x40;
pub const CMD_GET_POWER_STATUS: u8 = 0x46;
pub const CMD_CTRL_LED: u8 = 0x47;
pub const CMD_CTRL_LEPTON_POWER: u8 = 0x4B;
pub const CMD_CTRL_WLAN_POWER: u8 = 0x4D;
pub const CMD_BATTERY_GET_STATUS_CAP: u8 = 0x61;
pub const CMD_BATTERY_GET_TEMP: u8 = 0x62;
pub const CMD_BATTERY_GET_VOLT: u8 = 0x63;
pub const CMD_BATTERY_GET_ELEC: u8 = 0x64;
pub const CMD_BATTERY_GET_FULL_CAP: u8 = 0x67;
pub const CMD_BATTERY_GET_LIMIT_TIME: u8 = 0x69;
pub const CMD_BATTERY_GET_CYCLE: u8 = 0x6B;

pub fn command_name(cmd: u8) -> &'static str {
    match cmd {
        CMD_GET_BARYON => "GET_BARYON",
        CMD_GET_KERNEL_DIGITAL_KEY => "GET_KERNEL_DIGITAL_KEY",
        CMD_READ_CLOCK => "READ_CLOCK",
        CMD_READ_ALARM => "READ_ALARM",
        CMD_GET_POWER_SUPPLY_STATUS => "GET_POWER_SUPPLY_STATUS",
        CMD_GET_TIMESTAMP => "GET_TIMESTAMP",
        CMD_READ_SCRATCHPAD => "READ_SCRATCHPAD",
        CMD_SEND_SETPARAM => "SEND_SETPARAM",
        CMD_RECEIVE_SETPARAM => "RECEIVE_SETPARAM",
        CMD_RESET_DEVICE => "RESET_DEVICE",
        CMD_CTRL_ANALOG_XY_POLLING => "CTRL_ANALOG_XY_POLLING",
        CMD_CTRL_HR_POWER => "CTRL_HR_POWER",
        CMD_GET_POMMEL_VERSION => "GET_POMMEL_VERSION",
        CMD_GET_POWER_STATUS => "GET_POWER_STATUS",
        CMD_CTRL_LED => "CTRL_LED",
        CMD_CTRL_LEPTON_POWER => "CTRL_LEPTON_POWER",
        CMD_CTRL_WLAN_POWER => "CTRL_WLAN_POWER",
        CMD_BATTERY_GET_STATUS_CAP => "BATTERY_GET_STATUS_CAP",
        CMD_BATTERY_GET_TEMP => "BATTERY_GET_TEMP",
        CMD_BATTERY_GET_VOLT => "BATTERY_GET_VOLT",
        CMD_BATTERY_GET_ELEC => "BATTERY_GET_ELEC",
        CMD_BATTERY_GET_FULL_CAP => "BATTERY_GET_FULL_CAP",
        CMD_BATTERY_GET_LIMIT_TIME => "BATTERY_GET_LIMIT_TIME",
        CMD_BATTERY_GET_CYCLE => "BATTERY_GET_CYCLE",
        _ => "UNKNOWN",
    }
}

// ─── Command dispatch ───────────────────────────────────────────────────────

fn push16(out: &mut Vec<u8>, value: u32) {
    out.push(value as u8);
    out.push((value >> 8) as u8);
}

fn push32(out: &mut Vec<u8>, value: u32) {
    out.push(value as u8);
    out.push((value >> 8) as u8);
    out.push((value >> 16) as u8);
    out.push((value >> 24) as u8);
}

/// Execute the command framed in `tx` against the hardware models and
/// return the response payload.
///
/// `tx` is the raw transfer buffer: command at [`TX_CMD`], frame length at
/// [`TX_LEN`], arguments from [`TX_DATA`]. Every response starts with the
/// fixed [`RESPONSE_LEADER`] byte; an unrecognized command returns just
/// that, which is also what the real chip answers.
pub fn execute_command(tx: &[u8; MAX_DATA_LENGTH], hw: &mut Hardware) -> Vec<u8> {
    let cmd = tx[TX_CMD];
    let mut response = vec![RESPONSE_LEADER];

    match cmd {
        CMD_CTRL_LEPTON_POWER => hw.umd.set_power(tx[TX_DATA] != 0),
        CMD_RESET_DEVICE => {}
        CMD_GET_KERNEL_DIGITAL_KEY => {
            let buttons = hw.ctrl.poll();
            // The four response bytes shuffle the kernel button mask into
            // the chip's native key-matrix order.
            response.push((((buttons & 0xF000) >> 8) | ((buttons & 0xF0) >> 4)) as u8);
            response.push(
                (((buttons & 0xF_0000) >> 12) | ((buttons & 0x300) >> 7) | (buttons & 0x9)) as u8,
            );
            response.push(((buttons & 0x0BF0_0000) >> 20) as u8);
            response.push(((buttons & 0x3000_0000) >> 28) as u8);
        }
        CMD_CTRL_ANALOG_XY_POLLING => hw.ctrl.set_sampling_mode(tx[TX_DATA]),
        CMD_CTRL_LED => {
            let flag = tx[TX_DATA];
            let (set_on, led) = if hw.model == Model::Go {
                ((flag & 0x01) != 0, flag & 0xF0)
            } else {
                ((flag & 0x10) != 0, flag & 0xE0)
            };
            match led {
                0x40 => hw.led.set_memory_stick_on(set_on),
                0x80 => hw.led.set_wlan_on(set_on),
                0x20 => hw.led.set_power_on(set_on),
                0x10 => hw.led.set_bluetooth_on(set_on),
                _ => warn!("CTRL_LED unknown flag value 0x{:02X}", flag),
            }
        }
        CMD_RECEIVE_SETPARAM => {
            // Older baryon revisions frame this without a parameter id
            let parameter_id = if tx[TX_LEN] >= 3 { tx[TX_DATA] } else { 0 };
            debug!("RECEIVE_SETPARAM parameter_id=0x{:X}", parameter_id);
            push16(&mut response, hw.power.force_suspend_capacity);
            for _ in 2..8 {
                response.push(0);
            }
        }
        CMD_SEND_SETPARAM => {
            let parameter_id = if tx[TX_LEN] >= 11 { tx[TX_DATA + 10] } else { 0 };
            let force_suspend_capacity = tx[TX_DATA] as u32 | ((tx[TX_DATA + 1] as u32) << 8);
            debug!(
                "SEND_SETPARAM parameter_id=0x{:X} force_suspend_capacity=0x{:X}",
                parameter_id, force_suspend_capacity
            );
        }
        CMD_CTRL_HR_POWER => hw.power.set_hr_power(tx[TX_DATA] != 0),
        CMD_CTRL_WLAN_POWER => hw.power.set_wlan_power(tx[TX_DATA] != 0),
        CMD_GET_POWER_SUPPLY_STATUS => push32(&mut response, hw.power.supply_status),
        CMD_BATTERY_GET_STATUS_CAP => {
            push16(&mut response, hw.battery.status_cap1());
            push16(&mut response, hw.battery.status_cap2());
        }
        CMD_BATTERY_GET_FULL_CAP => push32(&mut response, hw.battery.full_capacity),
        CMD_BATTERY_GET_CYCLE => push32(&mut response, hw.battery.cycle_count),
        CMD_BATTERY_GET_LIMIT_TIME => push32(&mut response, hw.battery.limit_time),
        CMD_BATTERY_GET_TEMP => push32(&mut response, hw.battery.temperature),
        CMD_BATTERY_GET_ELEC => push32(&mut response, hw.battery.current),
        CMD_BATTERY_GET_VOLT => push32(&mut response, hw.battery.voltage),
        CMD_GET_BARYON => push32(&mut response, hw.model.baryon_version()),
        CMD_GET_POMMEL_VERSION => push32(&mut response, hw.model.pommel_version()),
        CMD_GET_POWER_STATUS => push32(&mut response, hw.power.power_status),
        CMD_GET_TIMESTAMP => response.extend_from_slice(&hw.clock.timestamp),
        CMD_READ_SCRATCHPAD => {
            // Source offset and size share one argument byte: the low two
            // bits encode a power-of-two size, the rest the offset.
            let src = ((tx[TX_DATA] & 0xFC) >> 2) as usize;
            let size = 1usize << (tx[TX_DATA] & 0x03);
            let mut values = [0u8; 8];
            hw.scratchpad.read(src, &mut values[..size]);
            response.extend_from_slice(&values[..size]);
        }
        CMD_READ_CLOCK => push32(&mut response, hw.clock.clock),
        CMD_READ_ALARM => push32(&mut response, hw.clock.alarm),
        _ => warn!("unknown syscon command 0x{:02X}", cmd),
    }

    response
}

// ─── Register-level state machine ───────────────────────────────────────────

pub struct Syscon {
    window: RegisterWindow,
    /// Shared transfer buffer; command frame in, response frame out.
    pub data: [u8; MAX_DATA_LENGTH],
    /// Read/write cursor into `data`, advanced 2 bytes per 0x08 access.
    pub index: usize,
    /// Set when the transfer reached its end; cleared by the rearm paths.
    pub end_of_data: bool,
    /// Pending error code; 0 means none.
    pub error: u32,
}

impl Syscon {
    pub fn new() -> Self {
        Syscon {
            window: RegisterWindow::new(SYSCON_BASE_ADDRESS),
            data: [0; MAX_DATA_LENGTH],
            index: 0,
            end_of_data: false,
            error: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Syscon::new();
    }

    pub fn read32(&mut self, address: u32) -> u32 {
        let value = match self.window.offset(address) {
            0x08 => self.read_data16(),
            0x0C => self.flags_0c(),
            0x18 => 0,
            _ => self.window.read32(address),
        };
        trace!("syscon read32(0x{:08X}) -> 0x{:08X}", address, value);
        value
    }

    pub fn write32(&mut self, address: u32, value: u32, hw: &mut Hardware, gpio: &mut Gpio) {
        trace!("syscon write32(0x{:08X}, 0x{:08X})", address, value);
        match self.window.offset(address) {
            0x04 => self.set_flags_04(value, hw, gpio),
            0x08 => self.write_data16(value),
            0x20 => self.set_flags_20(value),
            // Transfer-status register: the driver's 0xCF handshake value
            // is consumed by the chip and never lands in storage
            0x00 if value == 0xCF => {}
            0x14 | 0x24 if value == 0 => {}
            _ => self.window.write32(address, value),
        }
    }

    /// Pop one big-endian 16-bit pair at the cursor. Reaching the declared
    /// response length sets the end flag.
    fn read_data16(&mut self) -> u32 {
        let mut value = 0;
        if self.index + 1 < MAX_DATA_LENGTH {
            value = ((self.data[self.index] as u32) << 8) | self.data[self.index + 1] as u32;
            self.index += 2;
        }
        if self.index >= self.data[RX_LEN] as usize {
            self.end_of_data = true;
        }
        value
    }

    /// Push one big-endian 16-bit pair at the cursor. Filling the buffer
    /// sets the end flag.
    fn write_data16(&mut self, value: u32) {
        if self.index + 1 < MAX_DATA_LENGTH {
            self.data[self.index] = (value >> 8) as u8;
            self.data[self.index + 1] = value as u8;
            self.index += 2;
        }
        if self.index >= MAX_DATA_LENGTH {
            self.end_of_data = true;
        }
    }

    /// Status query: bit0 set while no error is pending, bit2 set while the
    /// transfer has not reached its end. Reading after a completed transfer
    /// rearms the cursor for the next one.
    fn flags_0c(&mut self) -> u32 {
        let mut flags = 0;

        if self.end_of_data {
            self.index = 0;
            self.end_of_data = false;
        } else {
            flags |= 4;
        }

        if self.error == 0 {
            flags |= 1;
        }

        flags
    }

    /// Control register: bit2 rearms the cursor, bit1 executes the buffered
    /// command — or, when clear, drops the completion line instead.
    fn set_flags_04(&mut self, flags: u32, hw: &mut Hardware, gpio: &mut Gpio) {
        if flags & 4 != 0 {
            self.index = 0;
            self.end_of_data = false;
        }

        if flags & 2 != 0 {
            self.start_command(hw, gpio);
        } else {
            gpio.clear_port_bit(GPIO_PORT_SYSCON_END_CMD);
        }
    }

    /// Error-status register. Only the two low bits are understood: either
    /// clears the pending error code.
    fn set_flags_20(&mut self, flags: u32) {
        if flags & 3 != 0 {
            self.error = 0;
        }
    }

    fn start_command(&mut self, hw: &mut Hardware, gpio: &mut Gpio) {
        let cmd = self.data[TX_CMD];
        debug!("syscon command 0x{:02X} ({})", cmd, command_name(cmd));

        let response = execute_command(&self.data, hw);
        self.set_response_data(0, &response);

        debug!("syscon command 0x{:02X} complete", cmd);
        gpio.set_port_bit(GPIO_PORT_SYSCON_END_CMD);
    }

    /// Assemble a response frame: clear the buffer, then lay out status,
    /// length, payload, and checksum. An oversized payload leaves the
    /// buffer cleared — the real chip drops such responses silently.
    pub fn set_response_data(&mut self, status: u8, response: &[u8]) {
        self.data = [0; MAX_DATA_LENGTH];
        if response.len() <= MAX_DATA_LENGTH - 3 {
            self.data[RX_STATUS] = status;
            self.data[RX_LEN] = (response.len() + 2) as u8;
            self.data[RX_RESPONSE..RX_RESPONSE + response.len()].copy_from_slice(response);
            self.add_hash_value();
        }
    }

    /// Append the frame checksum: complement of the sum of all bytes up to
    /// (excluding) the checksum slot.
    fn add_hash_value(&mut self) {
        let length = self.data[RX_LEN] as usize;
        let mut hash = 0u8;
        for i in 0..length {
            hash = hash.wrapping_add(self.data[i]);
        }
        self.data[length] = !hash;
    }

    /// Capture state for save state.
    pub fn save_state(&self) -> crate::savestate::SysconState {
        crate::savestate::SysconState {
            data: self.data,
            index: self.index,
            end_of_data: self.end_of_data,
            error: self.error,
            regs: self.window.dump_regs(),
        }
    }

    /// Restore state from save state.
    pub fn load_state(&mut self, s: &crate::savestate::SysconState) {
        self.data = s.data;
        self.index = s.index.min(MAX_DATA_LENGTH);
        self.end_of_data = s.end_of_data;
        self.error = s.error;
        self.window.restore_regs(&s.regs);
    }
}

impl Default for Syscon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::ctrl::{CTRL_CROSS, CTRL_HOME, CTRL_LTRIGGER, CTRL_SELECT, CTRL_VOL_UP};

    fn setup(model: Model) -> (Syscon, Hardware, Gpio) {
        (Syscon::new(), Hardware::new(model), Gpio::new())
    }

    /// Drive a full guest-side transaction: rearm, push the command frame,
    /// execute.
    fn send_command(syscon: &mut Syscon, hw: &mut Hardware, gpio: &mut Gpio, cmd: u8, args: &[u8]) {
        let mut packet = vec![cmd, (args.len() + 2) as u8];
        packet.extend_from_slice(args);
        let mut hash = 0u8;
        for b in &packet {
            hash = hash.wrapping_add(*b);
        }
        packet.push(!hash);
        if packet.len() % 2 != 0 {
            packet.push(0);
        }

        syscon.write32(SYSCON_BASE_ADDRESS + 0x04, 4, hw, gpio);
        for pair in packet.chunks(2) {
            let value = ((pair[0] as u32) << 8) | pair[1] as u32;
            syscon.write32(SYSCON_BASE_ADDRESS + 0x08, value, hw, gpio);
        }
        syscon.write32(SYSCON_BASE_ADDRESS + 0x04, 2, hw, gpio);
    }

    fn frame_checksum_ok(data: &[u8; MAX_DATA_LENGTH]) -> bool {
        let len = data[RX_LEN] as usize;
        let mut sum = 0u8;
        for b in &data[..=len] {
            sum = sum.wrapping_add(*b);
        }
        // hash + !hash == 0xFF, so a valid frame always sums to 0xFF
        sum == 0xFF
    }

    #[test]
    fn test_get_baryon_response_frame() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Slim);
        send_command(&mut syscon, &mut hw, &mut gpio, CMD_GET_BARYON, &[]);

        assert_eq!(syscon.data[RX_STATUS], 0);
        assert_eq!(syscon.data[RX_LEN], 7); // status + leader + 4 payload + checksum slot
        assert_eq!(syscon.data[RX_RESPONSE], RESPONSE_LEADER);
        let baryon = Model::Slim.baryon_version();
        assert_eq!(syscon.data[3], baryon as u8);
        assert_eq!(syscon.data[4], (baryon >> 8) as u8);
        assert_eq!(syscon.data[5], (baryon >> 16) as u8);
        assert_eq!(syscon.data[6], (baryon >> 24) as u8);
        assert!(gpio.port_bit(GPIO_PORT_SYSCON_END_CMD));
    }

    #[test]
    fn test_checksum_property() {
        for cmd in [CMD_GET_BARYON, CMD_BATTERY_GET_VOLT, CMD_GET_TIMESTAMP, CMD_READ_CLOCK] {
            let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
            send_command(&mut syscon, &mut hw, &mut gpio, cmd, &[]);
            assert!(frame_checksum_ok(&syscon.data), "bad checksum for cmd 0x{:02X}", cmd);
        }
    }

    #[test]
    fn test_response_read_back() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        send_command(&mut syscon, &mut hw, &mut gpio, CMD_BATTERY_GET_VOLT, &[]);
        assert!(gpio.port_bit(GPIO_PORT_SYSCON_END_CMD));

        // The driver acknowledges with one control write: rearm the cursor
        // and drop the completion line
        syscon.write32(SYSCON_BASE_ADDRESS + 0x04, 4, &mut hw, &mut gpio);
        assert!(!gpio.port_bit(GPIO_PORT_SYSCON_END_CMD));
        let flags = syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(flags, 5);

        // Pop the whole frame 16 bits at a time
        let len = syscon.data[RX_LEN] as usize;
        let mut bytes = Vec::new();
        while !syscon.end_of_data {
            let pair = syscon.read32(SYSCON_BASE_ADDRESS + 0x08);
            bytes.push((pair >> 8) as u8);
            bytes.push(pair as u8);
        }
        assert_eq!(bytes[0], 0);
        assert_eq!(bytes[1], len as u8);
        assert_eq!(bytes[2], RESPONSE_LEADER);
        let volt = u32::from_le_bytes(bytes[3..7].try_into().unwrap());
        assert_eq!(volt, hw.battery.voltage);

        // End flag is up; the next status read rearms exactly once
        let flags = syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(flags & 4, 0);
        assert_eq!(syscon.index, 0);
        assert!(!syscon.end_of_data);
        let flags = syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(flags, 5);
    }

    #[test]
    fn test_write_until_full_sets_end_flag() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        for i in 0..8 {
            assert!(!syscon.end_of_data, "end flag before pair {}", i);
            syscon.write32(SYSCON_BASE_ADDRESS + 0x08, 0x1234, &mut hw, &mut gpio);
        }
        assert!(syscon.end_of_data);
        assert_eq!(syscon.index, MAX_DATA_LENGTH);

        // Status read rearms
        syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(syscon.index, 0);
        assert!(!syscon.end_of_data);
    }

    #[test]
    fn test_rearm_without_execute_clears_completion() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        send_command(&mut syscon, &mut hw, &mut gpio, CMD_GET_BARYON, &[]);
        assert!(gpio.port_bit(GPIO_PORT_SYSCON_END_CMD));

        syscon.index = 6;
        syscon.end_of_data = true;
        // bit2 set, bit1 clear: rearm and drop the completion line
        syscon.write32(SYSCON_BASE_ADDRESS + 0x04, 4, &mut hw, &mut gpio);
        assert_eq!(syscon.index, 0);
        assert!(!syscon.end_of_data);
        assert!(!gpio.port_bit(GPIO_PORT_SYSCON_END_CMD));
    }

    #[test]
    fn test_oversized_response_dropped() {
        let mut syscon = Syscon::new();
        syscon.set_response_data(0, &[0u8; MAX_DATA_LENGTH - 2]);
        assert_eq!(syscon.data, [0; MAX_DATA_LENGTH]);
        assert_eq!(syscon.data[RX_LEN], 0);
        // Largest payload that still fits is laid out normally
        syscon.set_response_data(0, &[0x11; MAX_DATA_LENGTH - 3]);
        assert_eq!(syscon.data[RX_LEN], (MAX_DATA_LENGTH - 1) as u8);
        assert!(frame_checksum_ok(&syscon.data));
    }

    #[test]
    fn test_error_flag_and_clear() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        syscon.error = 0x80;
        let flags = syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(flags & 1, 0);

        // Bits outside the two low ones leave the error pending
        syscon.write32(SYSCON_BASE_ADDRESS + 0x20, 8, &mut hw, &mut gpio);
        assert_eq!(syscon.error, 0x80);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x20, 1, &mut hw, &mut gpio);
        assert_eq!(syscon.error, 0);
        let flags = syscon.read32(SYSCON_BASE_ADDRESS + 0x0C);
        assert_eq!(flags & 1, 1);
    }

    #[test]
    fn test_unhandled_offsets_are_storage() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x10, 0xABCD, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x10), 0xABCD);
        // 0x18 always reads zero even after a write
        syscon.write32(SYSCON_BASE_ADDRESS + 0x18, 0x5555, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x18), 0);
    }

    #[test]
    fn test_storage_suppression_quirks() {
        let (mut syscon, mut hw, mut gpio) = setup(Model::Fat);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x00, 0xCF, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x00), 0);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x00, 0x12, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x00), 0x12);

        syscon.write32(SYSCON_BASE_ADDRESS + 0x14, 0, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x14), 0);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x14, 7, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x14), 7);
        syscon.write32(SYSCON_BASE_ADDRESS + 0x24, 9, &mut hw, &mut gpio);
        assert_eq!(syscon.read32(SYSCON_BASE_ADDRESS + 0x24), 9);
    }

    // ── Per-command dispatch ────────────────────────────────────────────

    fn tx(cmd: u8, args: &[u8]) -> [u8; MAX_DATA_LENGTH] {
        let mut buf = [0u8; MAX_DATA_LENGTH];
        buf[TX_CMD] = cmd;
        buf[TX_LEN] = (args.len() + 2) as u8;
        buf[TX_DATA..TX_DATA + args.len()].copy_from_slice(args);
        buf
    }

    #[test]
    fn test_unknown_command_default_response() {
        let mut hw = Hardware::new(Model::Fat);
        let response = execute_command(&tx(0xEE, &[]), &mut hw);
        assert_eq!(response, vec![RESPONSE_LEADER]);
    }

    #[test]
    fn test_digital_key_shuffle() {
        let mut hw = Hardware::new(Model::Fat);
        hw.ctrl.press(CTRL_CROSS | CTRL_SELECT | CTRL_LTRIGGER | CTRL_HOME | CTRL_VOL_UP);
        let response = execute_command(&tx(CMD_GET_KERNEL_DIGITAL_KEY, &[]), &mut hw);
        assert_eq!(response.len(), 5);
        assert_eq!(response[1], 0x40); // CROSS: bit 14 → bit 6
        assert_eq!(response[2], 0x10 | 0x02 | 0x01); // HOME, LTRIGGER, SELECT
        assert_eq!(response[3], 0x01); // VOL_UP: bit 20 → bit 0
        assert_eq!(response[4], 0x00);
    }

    #[test]
    fn test_led_power_on_regular_model() {
        let mut hw = Hardware::new(Model::Slim);
        execute_command(&tx(CMD_CTRL_LED, &[0x30]), &mut hw);
        assert!(hw.led.power);
        assert!(!hw.led.memory_stick);
        assert!(!hw.led.wlan);
        execute_command(&tx(CMD_CTRL_LED, &[0x20]), &mut hw);
        assert!(!hw.led.power);
    }

    #[test]
    fn test_led_layout_on_go() {
        let mut hw = Hardware::new(Model::Go);
        // Go packs the on/off bit in bit0 and selects with the high nibble
        execute_command(&tx(CMD_CTRL_LED, &[0x41]), &mut hw);
        assert!(hw.led.memory_stick);
        execute_command(&tx(CMD_CTRL_LED, &[0x10 | 0x01]), &mut hw);
        assert!(hw.led.bluetooth);
        execute_command(&tx(CMD_CTRL_LED, &[0x10]), &mut hw);
        assert!(!hw.led.bluetooth);
    }

    #[test]
    fn test_battery_telemetry_commands() {
        let mut hw = Hardware::new(Model::Fat);
        hw.battery.voltage = 3970;
        hw.battery.temperature = 31;
        hw.battery.cycle_count = 42;

        let volt = execute_command(&tx(CMD_BATTERY_GET_VOLT, &[]), &mut hw);
        assert_eq!(volt[1..], 3970u32.to_le_bytes());
        let temp = execute_command(&tx(CMD_BATTERY_GET_TEMP, &[]), &mut hw);
        assert_eq!(temp[1..], 31u32.to_le_bytes());
        let cycle = execute_command(&tx(CMD_BATTERY_GET_CYCLE, &[]), &mut hw);
        assert_eq!(cycle[1..], 42u32.to_le_bytes());
        let caps = execute_command(&tx(CMD_BATTERY_GET_STATUS_CAP, &[]), &mut hw);
        assert_eq!(caps[1..3], (hw.battery.status_cap1() as u16).to_le_bytes());
        assert_eq!(caps[3..5], (hw.battery.status_cap2() as u16).to_le_bytes());
    }

    #[test]
    fn test_power_toggles() {
        let mut hw = Hardware::new(Model::Fat);
        execute_command(&tx(CMD_CTRL_WLAN_POWER, &[1]), &mut hw);
        assert!(hw.power.wlan_power);
        execute_command(&tx(CMD_CTRL_WLAN_POWER, &[0]), &mut hw);
        assert!(!hw.power.wlan_power);
        execute_command(&tx(CMD_CTRL_HR_POWER, &[1]), &mut hw);
        assert!(hw.power.hr_power);
        execute_command(&tx(CMD_CTRL_LEPTON_POWER, &[1]), &mut hw);
        assert!(hw.umd.power);
        execute_command(&tx(CMD_CTRL_ANALOG_XY_POLLING, &[1]), &mut hw);
        assert_eq!(hw.ctrl.sampling_mode, 1);
    }

    #[test]
    fn test_receive_setparam_payload() {
        let mut hw = Hardware::new(Model::Fat);
        // With and without the optional parameter-id byte
        for args in [&[][..], &[0x01][..]] {
            let response = execute_command(&tx(CMD_RECEIVE_SETPARAM, args), &mut hw);
            assert_eq!(response.len(), 9);
            assert_eq!(response[1], 72);
            assert_eq!(response[2], 0);
            assert_eq!(&response[3..], &[0; 6]);
        }
    }

    #[test]
    fn test_scratchpad_size_encodings() {
        let mut hw = Hardware::new(Model::Fat);
        hw.scratchpad.write(0, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        for (arg, expected) in [
            (0x00u8, &[1u8][..]),
            (0x01, &[1, 2][..]),
            (0x02, &[1, 2, 3, 4][..]),
            (0x03, &[1, 2, 3, 4, 5, 6, 7, 8][..]),
            (0x04 | 0x01, &[2, 3][..]), // offset 1, size 2
        ] {
            let response = execute_command(&tx(CMD_READ_SCRATCHPAD, &[arg]), &mut hw);
            assert_eq!(&response[1..], expected, "arg 0x{:02X}", arg);
        }
    }

    #[test]
    fn test_timestamp_raw_bytes() {
        let mut hw = Hardware::new(Model::Fat);
        let response = execute_command(&tx(CMD_GET_TIMESTAMP, &[]), &mut hw);
        assert_eq!(&response[1..], &hw.clock.timestamp);
    }

    #[test]
    fn test_version_words_per_model() {
        for model in [Model::Fat, Model::Slim, Model::Brite, Model::Go, Model::Street] {
            let mut hw = Hardware::new(model);
            let baryon = execute_command(&tx(CMD_GET_BARYON, &[]), &mut hw);
            assert_eq!(baryon[1..], model.baryon_version().to_le_bytes());
            let pommel = execute_command(&tx(CMD_GET_POMMEL_VERSION, &[]), &mut hw);
            assert_eq!(pommel[1..], model.pommel_version().to_le_bytes());
        }
    }
}
