//! Controller state persistence.
//!
//! Captures the full simulated controller — storage array, registers, and
//! the protocol/delay counters — to a file using bincode serialization
//! with deflate compression, so a session can be resumed mid-protocol
//! (including an in-flight programming cycle).
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "EEPS"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes identifying an eedrv state file.
const MAGIC: &[u8; 4] = b"EEPS";
/// Current state file format version.
const FORMAT_VERSION: u32 = 1;

/// Serializable snapshot of [`crate::EepromCtrl`].
#[derive(Debug, Serialize, Deserialize)]
pub struct CtrlState {
    pub eeprom: Vec<u8>,
    pub eearl: u8,
    pub eearh: u8,
    pub eedr: u8,
    pub tick: u64,
    pub busy_until: u64,
    pub armed_until: u64,
    pub program_ticks: u64,
    pub dirty: bool,
}

/// Encode a state to the on-disk representation.
pub fn encode(state: &CtrlState) -> Result<Vec<u8>, String> {
    let payload = bincode::serialize(state)
        .map_err(|e| format!("Serialize error: {}", e))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(8 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);
    Ok(out)
}

/// Decode the on-disk representation, verifying magic and version.
pub fn decode(data: &[u8]) -> Result<CtrlState, String> {
    if data.len() < 8 {
        return Err("File too small".into());
    }
    if &data[0..4] != MAGIC {
        return Err("Invalid state file (bad magic)".into());
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(format!(
            "Unsupported state file version {} (expected {})",
            version, FORMAT_VERSION
        ));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[8..])
        .map_err(|e| format!("Decompress error: {:?}", e))?;

    bincode::deserialize(&decompressed)
        .map_err(|e| format!("Deserialize error: {}", e))
}

/// Save state to a file.
pub fn save_to_file(state: &CtrlState, path: &Path) -> Result<(), String> {
    let out = encode(state)?;
    std::fs::write(path, &out).map_err(|e| format!("Write error: {}", e))
}

/// Load state from a file.
pub fn load_from_file(path: &Path) -> Result<CtrlState, String> {
    let data = std::fs::read(path).map_err(|e| format!("Read error: {}", e))?;
    decode(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> CtrlState {
        CtrlState {
            eeprom: vec![0xA5u8; 1024],
            eearl: 0x34,
            eearh: 0x02,
            eedr: 0x7F,
            tick: 42,
            busy_until: 50,
            armed_until: 0,
            program_ticks: 16,
            dirty: true,
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let state = sample_state();
        let data = encode(&state).unwrap();
        assert_eq!(&data[0..4], b"EEPS");
        let back = decode(&data).unwrap();
        assert_eq!(back.eeprom, state.eeprom);
        assert_eq!(back.eearl, 0x34);
        assert_eq!(back.eearh, 0x02);
        assert_eq!(back.tick, 42);
        assert_eq!(back.busy_until, 50);
        assert!(back.dirty);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = encode(&sample_state()).unwrap();
        data[0] = b'X';
        assert!(decode(&data).is_err());
    }

    #[test]
    fn test_version_mismatch() {
        let mut data = encode(&sample_state()).unwrap();
        data[4] = 99;
        let err = decode(&data).unwrap_err();
        assert!(err.contains("version"), "{}", err);
    }

    #[test]
    fn test_truncated_file() {
        assert!(decode(b"EEP").is_err());
    }
}
