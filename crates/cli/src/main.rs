//! eedrv command-line frontend.
//!
//! Loads an EEPROM image (Intel HEX or raw binary), performs read, write,
//! fill, and dump operations through the byte driver against the simulated
//! controller, and writes the result back as an image or a resumable state
//! file. Every edit goes through the full register protocol — busy-poll,
//! address/data setup, arm, strobe — so the access trace (`--trace`) shows
//! exactly what a real part would see on its bus.

use eedrv_core::{dump, image, state, Access, EepromCtrl, EepromDriver, RegisterBus, EEPROM_SIZE};
use std::env;
use std::fs;
use std::path::Path;

/// Parsed command line.
struct Options {
    image: String,
    reads: Vec<u16>,
    writes: Vec<(u16, u8)>,
    fills: Vec<(u16, u16, u8)>,
    /// None = no dump; Some(None) = whole array; Some(Some(range))
    dump: Option<Option<(u16, u16)>>,
    out: Option<String>,
    save_state: Option<String>,
    load_state: Option<String>,
    size: usize,
    delay: u64,
    trace: bool,
    debug: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Options, String> {
        let mut opts = Options {
            image: String::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            fills: Vec::new(),
            dump: None,
            out: None,
            save_state: None,
            load_state: None,
            size: EEPROM_SIZE,
            delay: eedrv_core::DEFAULT_PROGRAM_TICKS,
            trace: false,
            debug: false,
        };

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--read" => {
                    opts.reads.push(parse_addr(value_of(args, i, "--read")?)?);
                    i += 2;
                }
                "--write" => {
                    opts.writes.push(parse_assign(value_of(args, i, "--write")?)?);
                    i += 2;
                }
                "--fill" => {
                    opts.fills.push(parse_fill(value_of(args, i, "--fill")?)?);
                    i += 2;
                }
                "--dump" => {
                    // Optional range argument
                    match args.get(i + 1) {
                        Some(next) if !next.starts_with("--") => {
                            opts.dump = Some(Some(parse_range(next)?));
                            i += 2;
                        }
                        _ => {
                            opts.dump = Some(None);
                            i += 1;
                        }
                    }
                }
                "--out" => {
                    opts.out = Some(value_of(args, i, "--out")?.to_string());
                    i += 2;
                }
                "--save-state" => {
                    opts.save_state = Some(value_of(args, i, "--save-state")?.to_string());
                    i += 2;
                }
                "--load-state" => {
                    opts.load_state = Some(value_of(args, i, "--load-state")?.to_string());
                    i += 2;
                }
                "--size" => {
                    opts.size = parse_num(value_of(args, i, "--size")?)? as usize;
                    i += 2;
                }
                "--delay" => {
                    opts.delay = parse_num(value_of(args, i, "--delay")?)?;
                    i += 2;
                }
                "--trace" => {
                    opts.trace = true;
                    i += 1;
                }
                "--debug" => {
                    opts.debug = true;
                    i += 1;
                }
                _ if arg.starts_with("--") => {
                    return Err(format!("Unknown option: {}", arg));
                }
                _ => {
                    if !opts.image.is_empty() {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                    opts.image = arg.clone();
                    i += 1;
                }
            }
        }

        if opts.image.is_empty() {
            return Err("No image file given".into());
        }
        if opts.size == 0 || opts.size > 0xFFFF {
            return Err(format!("Bad EEPROM size: {}", opts.size));
        }
        Ok(opts)
    }
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(|s| s.as_str())
        .ok_or_else(|| format!("{} needs a value", flag))
}

/// Parse a number: `0x` prefix for hex, plain decimal otherwise.
fn parse_num(s: &str) -> Result<u64, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("Bad number: {}", s))
}

fn parse_addr(s: &str) -> Result<u16, String> {
    let n = parse_num(s)?;
    if n > 0xFFFF {
        return Err(format!("Address out of range: {}", s));
    }
    Ok(n as u16)
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let n = parse_num(s)?;
    if n > 0xFF {
        return Err(format!("Byte value out of range: {}", s));
    }
    Ok(n as u8)
}

/// `ADDR=VAL`
fn parse_assign(s: &str) -> Result<(u16, u8), String> {
    let (addr, val) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected ADDR=VAL, got: {}", s))?;
    Ok((parse_addr(addr)?, parse_byte(val)?))
}

/// `START..END` (end exclusive)
fn parse_range(s: &str) -> Result<(u16, u16), String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("Expected START..END, got: {}", s))?;
    let (start, end) = (parse_addr(start)?, parse_addr(end)?);
    if end < start {
        return Err(format!("Backwards range: {}", s));
    }
    Ok((start, end))
}

/// `START..END=VAL`
fn parse_fill(s: &str) -> Result<(u16, u16, u8), String> {
    let (range, val) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected START..END=VAL, got: {}", s))?;
    let (start, end) = parse_range(range)?;
    Ok((start, end, parse_byte(val)?))
}

fn is_hex_image(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".hex") || lower.ends_with(".eep") || lower.ends_with(".ihx")
}

fn run(opts: &Options) -> Result<(), String> {
    let mut ctrl = EepromCtrl::new_with_size(opts.size);
    ctrl.set_program_ticks(opts.delay);

    if let Some(ref path) = opts.load_state {
        let st = state::load_from_file(Path::new(path))?;
        ctrl.restore_state(&st);
        if opts.debug {
            println!("State restored from {} ({} bytes)", path, ctrl.contents().len());
        }
    } else {
        match fs::read(&opts.image) {
            Ok(raw) => {
                let size = if is_hex_image(&opts.image) {
                    let text = String::from_utf8_lossy(&raw);
                    let mut buf = ctrl.save();
                    let n = image::parse_hex(&text, &mut buf)?;
                    ctrl.load(&buf);
                    n
                } else {
                    let mut buf = ctrl.save();
                    let n = image::load_raw(&raw, &mut buf)?;
                    ctrl.load(&buf);
                    n
                };
                if opts.debug {
                    println!("Loaded {} bytes from {}", size, opts.image);
                }
            }
            Err(e) => {
                if Path::new(&opts.image).exists() {
                    return Err(format!("{}: {}", opts.image, e));
                }
                eprintln!("Warning: {} not found, starting from an erased array", opts.image);
            }
        }
    }

    // A restored state may carry a different array size than --size.
    let size = ctrl.contents().len();
    let original = ctrl.save();
    ctrl.trace_enabled = opts.trace;
    let mut drv = EepromDriver::with_capacity(ctrl, size as u16);

    for &(start, end, value) in &opts.fills {
        if end as usize > size {
            return Err(format!("Fill range 0x{:04X}..0x{:04X} exceeds EEPROM size", start, end));
        }
        for addr in start..end {
            drv.write_byte(addr, value);
        }
    }

    for &(addr, value) in &opts.writes {
        if addr as usize >= size {
            return Err(format!("Write address 0x{:04X} exceeds EEPROM size", addr));
        }
        drv.write_byte(addr, value);
    }

    for &addr in &opts.reads {
        if addr as usize >= size {
            return Err(format!("Read address 0x{:04X} exceeds EEPROM size", addr));
        }
        let value = drv.read_byte(addr);
        println!("0x{:04X} = 0x{:02X}", addr, value);
    }

    // Let the last program cycle run out before looking at the array.
    while drv.bus.is_busy() {}

    if let Some(range) = opts.dump {
        let (start, end) = match range {
            Some((s, e)) => (s, e),
            None => (0, size as u16),
        };
        print!("{}", dump::dump_region(drv.bus.contents(), start, end - start));
    }

    if opts.debug {
        println!("Changes:");
        print!("{}", dump::dump_diff(&original, drv.bus.contents()));
    }

    if opts.trace {
        for access in &drv.bus.trace {
            match access {
                Access::Read { addr, value } => println!("R 0x{:02X} -> 0x{:02X}", addr, value),
                Access::Write { addr, value } => println!("W 0x{:02X} <- 0x{:02X}", addr, value),
            }
        }
    }

    if let Some(ref path) = opts.out {
        if is_hex_image(path) {
            fs::write(path, image::dump_hex(drv.bus.contents()))
                .map_err(|e| format!("{}: {}", path, e))?;
        } else {
            fs::write(path, drv.bus.contents()).map_err(|e| format!("{}: {}", path, e))?;
        }
        if opts.debug {
            println!("Image written to {}", path);
        }
    }

    if let Some(ref path) = opts.save_state {
        state::save_to_file(&drv.bus.capture_state(), Path::new(path))?;
        if opts.debug {
            println!("State written to {}", path);
        }
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("eedrv - EEPROM image tool over the simulated byte driver");
        eprintln!("Usage: {} <image.eep|image.bin> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --read ADDR          Read one byte (repeatable)");
        eprintln!("  --write ADDR=VAL     Write one byte (repeatable)");
        eprintln!("  --fill A..B=VAL      Fill an address range (end exclusive)");
        eprintln!("  --dump [A..B]        Hex+ASCII dump (default: whole array)");
        eprintln!("  --out FILE           Save the edited image (.hex/.eep/.ihx or raw)");
        eprintln!("  --save-state FILE    Save resumable controller state");
        eprintln!("  --load-state FILE    Resume from a state file instead of the image");
        eprintln!("  --size N             EEPROM capacity in bytes (default 1024)");
        eprintln!("  --delay N            Programming delay in register accesses (default 16)");
        eprintln!("  --trace              Print the register access trace");
        eprintln!("  --debug              Verbose diagnostics");
        eprintln!();
        eprintln!("Numbers take a 0x prefix for hex: --write 0x10=0xAB");
        std::process::exit(1);
    }

    let opts = match Options::parse(&args[1..]) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&opts) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_num("0x10").unwrap(), 16);
        assert_eq!(parse_num("16").unwrap(), 16);
        assert!(parse_num("0xZZ").is_err());
        assert_eq!(parse_assign("0x10=0xAB").unwrap(), (0x10, 0xAB));
        assert_eq!(parse_range("0..0x40").unwrap(), (0, 0x40));
        assert_eq!(parse_fill("0x20..0x30=0").unwrap(), (0x20, 0x30, 0));
        assert!(parse_range("0x40..0x20").is_err());
        assert!(parse_byte("0x100").is_err());
    }

    #[test]
    fn test_parse_options() {
        let opts = Options::parse(&args(&[
            "save.eep", "--write", "0x10=0xAB", "--write", "0x11=0xCD",
            "--read", "0x10", "--dump", "0..0x20", "--delay", "1", "--trace",
        ]))
        .unwrap();
        assert_eq!(opts.image, "save.eep");
        assert_eq!(opts.writes, vec![(0x10, 0xAB), (0x11, 0xCD)]);
        assert_eq!(opts.reads, vec![0x10]);
        assert_eq!(opts.dump, Some(Some((0, 0x20))));
        assert_eq!(opts.delay, 1);
        assert!(opts.trace);
    }

    #[test]
    fn test_parse_dump_without_range() {
        let opts = Options::parse(&args(&["x.bin", "--dump", "--debug"])).unwrap();
        assert_eq!(opts.dump, Some(None));
        assert!(opts.debug);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Options::parse(&args(&["--read", "0"])).is_err()); // no image
        assert!(Options::parse(&args(&["x.bin", "--write"])).is_err());
        assert!(Options::parse(&args(&["x.bin", "--bogus"])).is_err());
        assert!(Options::parse(&args(&["a.bin", "b.bin"])).is_err());
    }
}
