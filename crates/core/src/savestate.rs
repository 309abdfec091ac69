//! Save state (quick save / quick load) for the emulation core.
//!
//! Captures the full core state — RAM, the syscon transfer engine, GPIO,
//! and every hardware model — to a file using bincode serialization with
//! deflate compression.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "PSYS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Hardware model   |  u8 (Model discriminant)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```
//!
//! The hardware model is part of the header because a state saved on one
//! revision is meaningless on another (different LED layout, version words).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::hardware::Model;

/// Magic bytes identifying a psp-core save state file.
const MAGIC: &[u8; 4] = b"PSYS";
/// Current save state format version.
const FORMAT_VERSION: u32 = 1;

// ─── Per-component state structs ────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SysconState {
    pub data: [u8; 16],
    pub index: usize,
    pub end_of_data: bool,
    pub error: u32,
    pub regs: Vec<(u32, u32)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GpioState {
    pub direction: u32,
    pub ports: u32,
    pub regs: Vec<(u32, u32)>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatteryState {
    pub present: bool,
    pub charge_percent: u32,
    pub full_capacity: u32,
    pub cycle_count: u32,
    pub limit_time: u32,
    pub temperature: u32,
    pub voltage: u32,
    pub current: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControllerState {
    pub buttons: u32,
    pub sampling_mode: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LedState {
    pub memory_stick: bool,
    pub wlan: bool,
    pub power: bool,
    pub bluetooth: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PowerState {
    pub force_suspend_capacity: u32,
    pub power_status: u32,
    pub supply_status: u32,
    pub hr_power: bool,
    pub wlan_power: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClockState {
    pub clock: u32,
    pub alarm: u32,
    pub timestamp: [u8; 12],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScratchpadState {
    pub data: [u8; 32],
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UmdDriveState {
    pub power: bool,
}

// ─── Top-level save state ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    // Memory
    pub ram: Vec<u8>,

    // MMIO handlers
    pub syscon: SysconState,
    pub gpio: GpioState,

    // Hardware models
    pub battery: BatteryState,
    pub ctrl: ControllerState,
    pub led: LedState,
    pub power: PowerState,
    pub clock: ClockState,
    pub scratchpad: ScratchpadState,
    pub umd: UmdDriveState,
}

// ─── Encoding ───────────────────────────────────────────────────────────────

/// Serialize a state to the on-disk byte format (header + compressed body).
pub fn encode(state: &SaveState, model: Model) -> Result<Vec<u8>, String> {
    let payload = bincode::serialize(state).map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(9 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.push(model as u8);
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Decode the on-disk byte format, verifying magic, version, and model.
pub fn decode(data: &[u8], expected_model: Model) -> Result<SaveState, String> {
    if data.len() < 9 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid save state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!(
            "Unsupported save state version {} (expected {})",
            version, FORMAT_VERSION
        ));
    }
    match Model::from_byte(data[8]) {
        Some(model) if model == expected_model => {}
        Some(model) => {
            return Err(format!(
                "Hardware model mismatch: save={} current={}",
                model.name(),
                expected_model.name()
            ));
        }
        None => return Err(format!("Unknown hardware model byte {}", data[8])),
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[9..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    bincode::deserialize(&decompressed).map_err(|e| format!("Deserialize error: {}", e))
}

// ─── File I/O ───────────────────────────────────────────────────────────────

pub fn save_to_file(state: &SaveState, model: Model, path: &Path) -> Result<(), String> {
    let bytes = encode(state, model)?;
    std::fs::write(path, &bytes).map_err(|e| format!("Write error: {}", e))
}

pub fn load_from_file(path: &Path, expected_model: Model) -> Result<SaveState, String> {
    let data = std::fs::read(path).map_err(|e| format!("Read error: {}", e))?;
    decode(&data, expected_model)
}
