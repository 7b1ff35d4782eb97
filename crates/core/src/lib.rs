//! # eedrv-core
//!
//! Byte-level EEPROM driver for the AVR ATmega (32u4/328P family) EEPROM
//! controller, together with a register-accurate simulation of that
//! controller.
//!
//! The EEPROM peripheral is reached through four data-space registers:
//! EECR (0x3F), EEDR (0x40), EEARL (0x41), EEARH (0x42). A read loads the
//! addressed cell into EEDR when the EERE strobe is set; a write arms the
//! controller with EEMPE and then commits EEDR with the EEPE strobe, which
//! must land inside the short arm window or the write is silently dropped.
//! EEPE doubles as the busy flag: it reads 1 while a programming cycle is
//! in progress, and no new transaction may begin until it clears.
//!
//! ## Architecture
//!
//! - [`RegisterBus`] — register access capability the driver is generic
//!   over: byte read/write at data-space addresses plus a busy query
//! - [`EepromDriver`] — busy-poll + register sequencing for byte reads and
//!   writes, with block and update conveniences
//! - [`EepromCtrl`] — simulated controller implementing [`RegisterBus`]
//!   with a configurable programming-delay model and an access trace
//! - [`image`] — Intel HEX / raw binary EEPROM image loading and dumping
//! - [`dump`] — hex + ASCII formatting of EEPROM regions
//! - [`state`] — controller state persistence (compressed bincode files)

pub mod bus;
pub mod driver;
pub mod ctrl;
pub mod image;
pub mod dump;
pub mod state;

pub use bus::RegisterBus;
pub use driver::EepromDriver;
pub use ctrl::{Access, EepromCtrl};

/// EEPROM capacity of the modeled part: 1 KB
pub const EEPROM_SIZE: usize = 1024;

// EEPROM register addresses (data space addresses, not I/O addresses)
pub const EECR_ADDR: u16 = 0x3F;
pub const EEDR_ADDR: u16 = 0x40;
pub const EEARL_ADDR: u16 = 0x41;
pub const EEARH_ADDR: u16 = 0x42;

// EECR bit positions
/// Read enable strobe: latches the addressed cell into EEDR
pub const EERE: u8 = 0;
/// Write strobe; also reads 1 while a programming cycle is in progress
pub const EEPE: u8 = 1;
/// Master write enable: arms the controller for a following EEPE strobe
pub const EEMPE: u8 = 2;

/// Accesses after an EEMPE write during which an EEPE strobe commits.
/// Real silicon specifies 4 CPU cycles; the simulation counts register
/// accesses at the same width.
pub const EEMPE_WINDOW: u64 = 4;

/// Default programming-cycle length in register accesses. Real parts take
/// ~3.4 ms; the default only has to be long enough that a skipped busy-poll
/// is observable.
pub const DEFAULT_PROGRAM_TICKS: u64 = 16;
