//! EEPROM byte driver.
//!
//! Synchronous, polling-based single-byte transactions against the EEPROM
//! controller registers. Both operations block in a busy-poll until any
//! prior programming cycle has finished, then run the register sequence:
//!
//! - read: EEAR ← address, strobe EERE, return EEDR
//! - write: EEAR ← address, EEDR ← value, arm EEMPE, strobe EEPE
//!
//! The arm and strobe are two back-to-back EECR writes with no register
//! traffic in between; the controller drops a strobe that arrives outside
//! the arm window. `write_byte` returns once the write is initiated — the
//! programming cycle completes on its own and is only observed by the next
//! operation's busy-poll.
//!
//! There is no timeout: a busy flag that never clears (hardware fault)
//! blocks the caller forever. Addresses must be below the configured
//! capacity; this is a precondition checked in debug builds only, matching
//! the bounds-unchecked hardware access it models.

use crate::bus::RegisterBus;
use crate::{EEARH_ADDR, EEARL_ADDR, EECR_ADDR, EEDR_ADDR, EEMPE, EEPE, EERE, EEPROM_SIZE};

/// Byte-level EEPROM driver over a [`RegisterBus`].
pub struct EepromDriver<B> {
    pub bus: B,
    capacity: u16,
}

impl<B: RegisterBus> EepromDriver<B> {
    /// Driver for the modeled part's full 1 KB address space.
    pub fn new(bus: B) -> Self {
        Self::with_capacity(bus, EEPROM_SIZE as u16)
    }

    /// Driver bounded to the first `capacity` bytes (smaller parts).
    pub fn with_capacity(bus: B, capacity: u16) -> Self {
        EepromDriver { bus, capacity }
    }

    /// Read one byte.
    ///
    /// Blocks until the controller is idle, then latches the cell into
    /// EEDR with the EERE strobe. Never disturbs storage contents.
    pub fn read_byte(&mut self, addr: u16) -> u8 {
        debug_assert!(addr < self.capacity, "EEPROM address 0x{:04X} out of range", addr);
        self.wait_ready();
        self.set_address(addr);
        self.bus.write(EECR_ADDR, 1 << EERE);
        self.bus.read(EEDR_ADDR)
    }

    /// Write one byte.
    ///
    /// Blocks until the controller is idle, then initiates the program
    /// cycle. The value is not durably stored until a later busy-poll has
    /// observed the cycle complete.
    pub fn write_byte(&mut self, addr: u16, value: u8) {
        debug_assert!(addr < self.capacity, "EEPROM address 0x{:04X} out of range", addr);
        self.wait_ready();
        self.set_address(addr);
        self.bus.write(EEDR_ADDR, value);
        // Arm, then strobe. Strictly ordered, nothing in between.
        self.bus.write(EECR_ADDR, 1 << EEMPE);
        self.bus.write(EECR_ADDR, (1 << EEMPE) | (1 << EEPE));
    }

    /// Write one byte only if the cell does not already hold it.
    ///
    /// Saves a program cycle (and cell wear) for unchanged data.
    pub fn update_byte(&mut self, addr: u16, value: u8) {
        if self.read_byte(addr) != value {
            self.write_byte(addr, value);
        }
    }

    /// Fill `buf` from consecutive cells starting at `start`.
    pub fn read_block(&mut self, start: u16, buf: &mut [u8]) {
        for i in 0..buf.len() {
            buf[i] = self.read_byte(start + i as u16);
        }
    }

    /// Write `data` to consecutive cells starting at `start`.
    pub fn write_block(&mut self, start: u16, data: &[u8]) {
        for i in 0..data.len() {
            self.write_byte(start + i as u16, data[i]);
        }
    }

    /// Spin until no programming cycle is in progress.
    fn wait_ready(&mut self) {
        while self.bus.is_busy() {}
    }

    fn set_address(&mut self, addr: u16) {
        self.bus.write(EEARL_ADDR, addr as u8);
        self.bus.write(EEARH_ADDR, (addr >> 8) as u8);
    }
}
