//! MICRO-II memory: 8 banks of 256 words, word-addressed, bank-switched.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Number of words in a page (5-bit word-in-page field).
pub const WORDS_PER_PAGE: u8 = 32;
/// Number of pages per bank (3-bit page field).
pub const PAGES_PER_BANK: u8 = 8;
/// Number of memory banks a MICRO-II can ever address.
pub const MAX_BANKS: usize = 8;

/// Splits an address into its (page, word-in-page) components.
///
/// Page is the top 3 bits, word is the low 5 bits.
pub fn page_word(addr: u8) -> (u8, u8) {
    ((addr >> 5) & 0b111, addr & 0b1_1111)
}

/// A sparse address -> word mapping, the assembler's natural output.
///
/// Gaps are allowed; only addresses actually written are present. Callers
/// that need a dense image materialize it against a [`Memory`] bank via
/// [`Memory::load_image`], where unmentioned cells are left untouched.
pub type Image = BTreeMap<u8, u8>;

/// One 256-word bank.
#[derive(Clone)]
struct Bank([u8; 256]);

impl Default for Bank {
    fn default() -> Self {
        Bank([0u8; 256])
    }
}

/// The 8-bank, 256-word-per-bank memory system.
pub struct Memory {
    banks: [Bank; MAX_BANKS],
    current_bank: u8,
    n_active: u8,
}

impl Default for Memory {
    fn default() -> Self {
        Memory {
            banks: Default::default(),
            current_bank: 0,
            n_active: 1,
        }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Memory {{ bank: {}/{}, nonzero: {} }}",
            self.current_bank,
            self.n_active,
            self.banks[self.current_bank as usize]
                .0
                .iter()
                .filter(|&&w| w != 0)
                .count()
        )
    }
}

impl Memory {
    pub fn new() -> Self {
        Memory::default()
    }

    /// Read the word at `addr` in the current bank. `addr` is masked to 8 bits.
    pub fn read(&self, addr: u8) -> u8 {
        self.banks[self.current_bank as usize].0[addr as usize]
    }

    /// Write `word` at `addr` in the current bank. Both are masked to 8 bits.
    pub fn write(&mut self, addr: u8, word: u8) {
        self.banks[self.current_bank as usize].0[addr as usize] = word;
    }

    /// Select bank `i` as current. A no-op if `i >= n_active_banks()`.
    pub fn select_bank(&mut self, i: u8) {
        if i < self.n_active {
            self.current_bank = i;
        }
    }

    pub fn current_bank(&self) -> u8 {
        self.current_bank
    }

    pub fn n_active_banks(&self) -> u8 {
        self.n_active
    }

    /// Configure how many of the 8 banks are active (1..=8). Out-of-range
    /// values are clamped, matching the reference's `max(1, min(8, n))`.
    pub fn set_active_banks(&mut self, n: u8) {
        self.n_active = n.clamp(1, MAX_BANKS as u8);
        if self.current_bank >= self.n_active {
            self.current_bank = 0;
        }
    }

    /// Zero every cell of the current bank.
    pub fn clear_current_bank(&mut self) {
        self.banks[self.current_bank as usize] = Bank::default();
    }

    /// Zero every cell of every bank and reselect bank 0.
    pub fn reset(&mut self) {
        for bank in &mut self.banks {
            *bank = Bank::default();
        }
        self.current_bank = 0;
    }

    /// Write every (address, word) pair of `image` into the current bank.
    /// Addresses not present in `image` are left untouched.
    pub fn load_image(&mut self, image: &Image, base: u8) {
        for (&addr, &word) in image {
            self.write(addr.wrapping_add(base), word);
        }
    }

    /// Reference table of historical front-panel bank-switch toggle words,
    /// keyed by active-bank count. Display/diagnostics only — never
    /// consulted by `select_bank`.
    pub fn bank_switch_word(n_active: u8) -> Option<u8> {
        match n_active {
            1 => Some(0b1010_0010),
            2 => Some(0b0110_0010),
            3 => Some(0b1110_0100),
            4 => Some(0b0110_1000),
            5 => Some(0b0110_1001),
            6 => Some(0b0110_1010),
            7 => Some(0b0110_1100),
            8 => Some(0b0110_1011),
            _ => None,
        }
    }

    /// Render the current bank as the `<addr-binary>: <data-binary> [<dec>]`
    /// text format described by the external memory-dump interface.
    pub fn export(&self) -> String {
        let bank = self.current_bank;
        let mut out = String::new();
        out.push_str(&format!("# MICRO II Memory Dump - Bank {}\n", bank));
        out.push_str("# Address: Data (Binary) [Decimal]\n");
        for addr in 0..=255u16 {
            let data = self.read(addr as u8);
            out.push_str(&format!("{:08b}: {:08b} [{:3}]\n", addr, data, data));
        }
        out
    }

    /// Parse the text format produced by [`Memory::export`] into the current
    /// bank. Mirrors `original_source/micro2_memory.py`'s `import_memory`
    /// inner loop: a line missing `:`, whose data field isn't 8-bit binary,
    /// or that otherwise fails to parse is skipped rather than treated as an
    /// error — per spec.md §7 point 6, the only hard failure this crate
    /// recognizes for a snapshot is a genuine I/O error reading the dump
    /// file, and that happens at the caller's `std::fs::read_to_string`
    /// boundary, not here. Returns the number of cells successfully written.
    pub fn import(&mut self, text: &str) -> usize {
        let mut addr: u8 = 0;
        let mut applied = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, ':');
            let _addr_part = parts.next();
            let Some(rest) = parts.next() else { continue };
            let Some(data_part) = rest.split_whitespace().next() else {
                continue;
            };
            if data_part.len() != 8 || !data_part.chars().all(|c| c == '0' || c == '1') {
                continue;
            }
            let Ok(data) = u8::from_str_radix(data_part, 2) else {
                continue;
            };
            self.write(addr, data);
            addr = addr.wrapping_add(1);
            applied += 1;
        }
        applied
    }
}

/// Hard failure serializing or deserializing a snapshot, per spec.md §7
/// point 6 — the one runtime condition in this crate surfaced as a typed
/// error rather than an in-band diagnostic. Memory-dump text import never
/// raises this (see [`Memory::import`]); it covers genuine file I/O and the
/// whole-snapshot JSON codec in `emulator.rs`.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed snapshot: {0}")]
    Format(String),
}
