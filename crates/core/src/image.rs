//! EEPROM image files.
//!
//! Loads and saves EEPROM contents as Intel HEX (the `.eep` files avr-gcc
//! and avrdude exchange, `:LLAAAATT[DD...]CC`) or as raw binary. EEPROM
//! images are bounded by the part's capacity, so unlike a flash loader a
//! record outside the array is an error, not something to skip: the image
//! does not fit the part. Extended-addressing records (types 02/04) are
//! only accepted with a zero base for the same reason.

/// Parse an Intel HEX image into the EEPROM buffer.
///
/// Returns the number of bytes loaded (highest address reached).
pub fn parse_hex(hex: &str, eeprom: &mut [u8]) -> Result<usize, String> {
    let mut max_addr = 0usize;

    for line in hex.lines() {
        let line = line.trim();
        if line.is_empty() { continue; }
        if !line.starts_with(':') {
            continue; // skip non-hex lines
        }

        let bytes = hex_line_to_bytes(&line[1..])?;
        if bytes.len() < 5 {
            return Err("Line too short".into());
        }

        let byte_count = bytes[0] as usize;
        let addr = (((bytes[1] as u16) << 8) | bytes[2] as u16) as usize;
        let record_type = bytes[3];
        if bytes.len() < 5 + byte_count {
            return Err("Record shorter than its byte count".into());
        }

        // Verify checksum
        let sum: u8 = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != 0 {
            return Err(format!("Checksum error: sum={}", sum));
        }

        match record_type {
            0x00 => {
                // Data record
                if addr + byte_count > eeprom.len() {
                    return Err(format!(
                        "Record at 0x{:04X}+{} exceeds EEPROM capacity ({} bytes)",
                        addr, byte_count, eeprom.len()
                    ));
                }
                for i in 0..byte_count {
                    eeprom[addr + i] = bytes[4 + i];
                }
                if addr + byte_count > max_addr {
                    max_addr = addr + byte_count;
                }
            }
            0x01 => {
                // End of file
                break;
            }
            0x02 | 0x04 => {
                // Extended segment/linear address: only a zero base stays
                // inside the EEPROM address space.
                if bytes[4] != 0 || bytes[5] != 0 {
                    return Err("Extended address record outside EEPROM address space".into());
                }
            }
            0x03 | 0x05 => {
                // Start address records - irrelevant for data images
            }
            _ => {
                // Unknown record type, skip
            }
        }
    }

    Ok(max_addr)
}

/// Format EEPROM contents as Intel HEX with 16-byte data records.
pub fn dump_hex(eeprom: &[u8]) -> String {
    let mut out = String::new();
    let mut addr = 0usize;
    while addr < eeprom.len() {
        let end = (addr + 16).min(eeprom.len());
        let chunk = &eeprom[addr..end];
        let mut sum = chunk.len() as u8;
        sum = sum
            .wrapping_add((addr >> 8) as u8)
            .wrapping_add(addr as u8);
        out.push_str(&format!(":{:02X}{:04X}00", chunk.len(), addr));
        for i in 0..chunk.len() {
            out.push_str(&format!("{:02X}", chunk[i]));
            sum = sum.wrapping_add(chunk[i]);
        }
        out.push_str(&format!("{:02X}\n", 0u8.wrapping_sub(sum)));
        addr = end;
    }
    out.push_str(":00000001FF\n");
    out
}

/// Load a raw binary image. Shorter images leave the tail untouched.
pub fn load_raw(bin: &[u8], eeprom: &mut [u8]) -> Result<usize, String> {
    if bin.len() > eeprom.len() {
        return Err(format!(
            "Raw image is {} bytes but the EEPROM holds {}",
            bin.len(),
            eeprom.len()
        ));
    }
    eeprom[..bin.len()].copy_from_slice(bin);
    Ok(bin.len())
}

/// Convert hex character pairs to bytes
fn hex_line_to_bytes(hex_str: &str) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::with_capacity(hex_str.len() / 2);
    let chars: Vec<char> = hex_str.chars().collect();

    if chars.len() % 2 != 0 {
        return Err("Odd number of hex characters".into());
    }

    for chunk in chars.chunks(2) {
        let hi = hex_char(chunk[0])?;
        let lo = hex_char(chunk[1])?;
        bytes.push((hi << 4) | lo);
    }

    Ok(bytes)
}

fn hex_char(c: char) -> Result<u8, String> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(format!("Invalid hex character: {}", c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_image() {
        let hex = ":0400100041424344E2\n:00000001FF\n";
        let mut eeprom = vec![0xFFu8; 64];
        let size = parse_hex(hex, &mut eeprom).unwrap();
        assert_eq!(size, 0x14);
        assert_eq!(&eeprom[0x10..0x14], b"ABCD");
        assert_eq!(eeprom[0x0F], 0xFF);
        assert_eq!(eeprom[0x14], 0xFF);
    }

    #[test]
    fn test_checksum_error() {
        let hex = ":0400100041424344FF\n:00000001FF\n";
        let mut eeprom = vec![0xFFu8; 64];
        assert!(parse_hex(hex, &mut eeprom).is_err());
    }

    #[test]
    fn test_record_beyond_capacity() {
        let hex = ":01002000AA35\n:00000001FF\n";
        let mut eeprom = vec![0xFFu8; 16];
        let err = parse_hex(hex, &mut eeprom).unwrap_err();
        assert!(err.contains("capacity"), "{}", err);
    }

    #[test]
    fn test_extended_address_rejected() {
        let hex = ":020000021000EC\n:00000001FF\n";
        let mut eeprom = vec![0xFFu8; 64];
        assert!(parse_hex(hex, &mut eeprom).is_err());
    }

    #[test]
    fn test_dump_parse_round_trip() {
        let mut eeprom = vec![0u8; 80];
        for i in 0..eeprom.len() {
            eeprom[i] = (i as u8).wrapping_mul(7).wrapping_add(3);
        }
        let hex = dump_hex(&eeprom);
        let mut back = vec![0u8; 80];
        let size = parse_hex(&hex, &mut back).unwrap();
        assert_eq!(size, 80);
        assert_eq!(back, eeprom);
    }

    #[test]
    fn test_raw_too_large() {
        let bin = vec![0u8; 32];
        let mut eeprom = vec![0xFFu8; 16];
        assert!(load_raw(&bin, &mut eeprom).is_err());
    }

    #[test]
    fn test_raw_partial_load() {
        let bin = [1u8, 2, 3];
        let mut eeprom = vec![0xFFu8; 8];
        let size = load_raw(&bin, &mut eeprom).unwrap();
        assert_eq!(size, 3);
        assert_eq!(eeprom, [1, 2, 3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
