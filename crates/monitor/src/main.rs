//! Interactive register monitor for psp-core.
//!
//! Drives the emulated bus the way kernel code would: raw 32-bit register
//! pokes, whole syscon transactions, button input, and save states, from a
//! small line-oriented REPL. Useful for poking at protocol behavior and
//! for scripted regression runs (`--script`).
//!
//! ```text
//! psp-monitor [--model fat|slim|brite|go|street] [--script FILE]
//! ```
//!
//! Set `RUST_LOG=debug` (or `trace` for raw register traffic) to watch the
//! core's diagnostics while poking.

use psp_core::hardware::ctrl;
use psp_core::mmio::syscon::{self, SYSCON_BASE_ADDRESS};
use psp_core::{Model, Psp, GPIO_BASE_ADDRESS, GPIO_PORT_SYSCON_END_CMD};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut model = Model::Fat;
    let mut script: Option<String> = None;

    let args: Vec<String> = env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--model" => {
                i += 1;
                model = match args.get(i).map(String::as_str) {
                    Some("fat") => Model::Fat,
                    Some("slim") => Model::Slim,
                    Some("brite") => Model::Brite,
                    Some("go") => Model::Go,
                    Some("street") => Model::Street,
                    other => {
                        eprintln!("unknown model {:?}", other.unwrap_or(""));
                        std::process::exit(2);
                    }
                };
            }
            "--script" => {
                i += 1;
                match args.get(i) {
                    Some(path) => script = Some(path.clone()),
                    None => {
                        eprintln!("--script needs a file argument");
                        std::process::exit(2);
                    }
                }
            }
            "-h" | "--help" => {
                print_help();
                return;
            }
            other => {
                eprintln!("unknown argument {}", other);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let mut psp = Psp::new(model);
    println!("psp-monitor: model {} — type 'help' for commands", model.name());

    if let Some(path) = script {
        match fs::read_to_string(&path) {
            Ok(text) => {
                for line in text.lines() {
                    println!("> {}", line);
                    if !run_line(&mut psp, line) {
                        return;
                    }
                }
            }
            Err(e) => {
                eprintln!("cannot read {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if !run_line(&mut psp, &line) {
                    break;
                }
            }
            Err(e) => {
                eprintln!("read error: {}", e);
                break;
            }
        }
    }
}

fn print_help() {
    println!("commands:");
    println!("  r <addr>              read a 32-bit register or RAM word");
    println!("  w <addr> <value>      write a 32-bit register or RAM word");
    println!("  cmd <code> [args..]   run a whole syscon transaction, print the frame");
    println!("  regs                  dump the syscon transfer engine state");
    println!("  hw                    dump hardware model state");
    println!("  press <button>        hold a controller button (cross, start, home, ...)");
    println!("  release <button>      release a controller button");
    println!("  save <file>           write a save state");
    println!("  load <file>           restore a save state");
    println!("  reset                 power-on reset (RAM preserved)");
    println!("  quit");
}

/// Execute one monitor command. Returns false to exit the REPL.
fn run_line(psp: &mut Psp, line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => {}
        ["help"] => print_help(),
        ["q"] | ["quit"] | ["exit"] => return false,
        ["r", addr] => match parse_u32(addr) {
            Some(a) => println!("[0x{:08X}] = 0x{:08X}", a, psp.read32(a)),
            None => eprintln!("bad address {}", addr),
        },
        ["w", addr, value] => match (parse_u32(addr), parse_u32(value)) {
            (Some(a), Some(v)) => psp.write32(a, v),
            _ => eprintln!("bad address or value"),
        },
        ["cmd", code, args @ ..] => {
            let code = match parse_u32(code) {
                Some(c) if c <= 0xFF => c as u8,
                _ => {
                    eprintln!("bad command code {}", code);
                    return true;
                }
            };
            let mut bytes = Vec::new();
            for a in args {
                match parse_u32(a) {
                    Some(v) if v <= 0xFF => bytes.push(v as u8),
                    _ => {
                        eprintln!("bad argument byte {}", a);
                        return true;
                    }
                }
            }
            let frame = send_command(psp, code, &bytes);
            print!("{} ->", syscon::command_name(code));
            for b in &frame {
                print!(" {:02X}", b);
            }
            println!();
        }
        ["regs"] => {
            print!("buffer:");
            for b in &psp.syscon.data {
                print!(" {:02X}", b);
            }
            println!();
            println!(
                "cursor={} end_of_data={} error=0x{:X} end_cmd_line={}",
                psp.syscon.index,
                psp.syscon.end_of_data,
                psp.syscon.error,
                psp.gpio.port_bit(GPIO_PORT_SYSCON_END_CMD) as u8
            );
        }
        ["hw"] => {
            let hw = &psp.hw;
            println!(
                "model {} baryon=0x{:08X} pommel=0x{:08X}",
                hw.model.name(),
                hw.model.baryon_version(),
                hw.model.pommel_version()
            );
            println!(
                "battery: {}% of {} mAh, {} mV, {} degC, {} cycles",
                hw.battery.charge_percent,
                hw.battery.full_capacity,
                hw.battery.voltage,
                hw.battery.temperature,
                hw.battery.cycle_count
            );
            println!(
                "leds: ms={} wlan={} power={} bt={}",
                hw.led.memory_stick as u8, hw.led.wlan as u8, hw.led.power as u8,
                hw.led.bluetooth as u8
            );
            println!(
                "power: hr={} wlan={} umd={} sampling_mode={}",
                hw.power.hr_power as u8, hw.power.wlan_power as u8, hw.umd.power as u8,
                hw.ctrl.sampling_mode
            );
        }
        ["press", button] => match button_mask(button) {
            Some(mask) => psp.hw.ctrl.press(mask),
            None => eprintln!("unknown button {}", button),
        },
        ["release", button] => match button_mask(button) {
            Some(mask) => psp.hw.ctrl.release(mask),
            None => eprintln!("unknown button {}", button),
        },
        ["save", path] => match psp.save_to_file(Path::new(path)) {
            Ok(()) => println!("saved {}", path),
            Err(e) => eprintln!("save failed: {}", e),
        },
        ["load", path] => match psp.load_from_file(Path::new(path)) {
            Ok(()) => println!("loaded {}", path),
            Err(e) => eprintln!("load failed: {}", e),
        },
        ["reset"] => psp.reset(),
        _ => eprintln!("unrecognized command; type 'help'"),
    }
    true
}

/// Run one whole command/response transaction the way the kernel driver
/// does, returning the raw response frame (status, len, payload, checksum).
fn send_command(psp: &mut Psp, code: u8, args: &[u8]) -> Vec<u8> {
    let mut packet = vec![code, (args.len() + 2) as u8];
    packet.extend_from_slice(args);
    let mut hash = 0u8;
    for b in &packet {
        hash = hash.wrapping_add(*b);
    }
    packet.push(!hash);
    if packet.len() % 2 != 0 {
        packet.push(0);
    }

    // Rearm, push the frame 16 bits at a time, execute
    psp.write32(SYSCON_BASE_ADDRESS + 0x04, 4);
    for pair in packet.chunks(2) {
        psp.write32(SYSCON_BASE_ADDRESS + 0x08, ((pair[0] as u32) << 8) | pair[1] as u32);
    }
    psp.write32(SYSCON_BASE_ADDRESS + 0x04, 2);

    // Wait for the end-of-command line (execution is synchronous, so one
    // poll suffices), then acknowledge: rearm + drop the line
    let _ = psp.read32(GPIO_BASE_ADDRESS + 0x04);
    psp.write32(SYSCON_BASE_ADDRESS + 0x04, 4);

    let mut frame = Vec::new();
    loop {
        let flags = psp.read32(SYSCON_BASE_ADDRESS + 0x0C);
        if flags & 4 == 0 {
            break;
        }
        let pair = psp.read32(SYSCON_BASE_ADDRESS + 0x08);
        frame.push((pair >> 8) as u8);
        frame.push(pair as u8);
    }
    frame
}

fn parse_u32(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

fn button_mask(name: &str) -> Option<u32> {
    let mask = match name {
        "select" => ctrl::CTRL_SELECT,
        "start" => ctrl::CTRL_START,
        "up" => ctrl::CTRL_UP,
        "right" => ctrl::CTRL_RIGHT,
        "down" => ctrl::CTRL_DOWN,
        "left" => ctrl::CTRL_LEFT,
        "ltrigger" => ctrl::CTRL_LTRIGGER,
        "rtrigger" => ctrl::CTRL_RTRIGGER,
        "triangle" => ctrl::CTRL_TRIANGLE,
        "circle" => ctrl::CTRL_CIRCLE,
        "cross" => ctrl::CTRL_CROSS,
        "square" => ctrl::CTRL_SQUARE,
        "home" => ctrl::CTRL_HOME,
        "hold" => ctrl::CTRL_HOLD,
        "wlanup" => ctrl::CTRL_WLAN_UP,
        "remote" => ctrl::CTRL_REMOTE,
        "volup" => ctrl::CTRL_VOL_UP,
        "voldown" => ctrl::CTRL_VOL_DOWN,
        "screen" => ctrl::CTRL_SCREEN,
        "note" => ctrl::CTRL_NOTE,
        "disc" => ctrl::CTRL_DISC,
        "ms" => ctrl::CTRL_MS,
        _ => return None,
    };
    Some(mask)
}
