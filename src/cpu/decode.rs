//! Instruction encoding and decoding for the MICRO-II's 16-instruction set.
//!
//! Mirrors the teacher's `ops`/`addr` split (a static opcode table plus an
//! addressing-mode enum) but collapses both into the single tagged variant
//! spec.md §9 recommends, since MICRO-II's decode is a two-tier bit match
//! rather than a per-opcode byte lookup table.

use std::fmt;

/// A memory-reference opcode (top 2 bits of the instruction word).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemOp {
    Jmp,
    Str,
    Add,
}

impl MemOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            MemOp::Jmp => "JMP",
            MemOp::Str => "STR",
            MemOp::Add => "ADD",
        }
    }

    /// The 2-bit opcode field this mnemonic encodes to.
    pub fn bits(self) -> u8 {
        match self {
            MemOp::Jmp => 0b00,
            MemOp::Str => 0b01,
            MemOp::Add => 0b10,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s {
            "JMP" => Some(MemOp::Jmp),
            "STR" => Some(MemOp::Str),
            "ADD" => Some(MemOp::Add),
            _ => None,
        }
    }
}

/// A register/control instruction (`11 000 xxx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    Clr,
    Cmp,
    Rtl,
    Rtr,
    Ors,
    Nop,
    Hlt,
}

impl RegOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            RegOp::Clr => "CLR",
            RegOp::Cmp => "CMP",
            RegOp::Rtl => "RTL",
            RegOp::Rtr => "RTR",
            RegOp::Ors => "ORS",
            RegOp::Nop => "NOP",
            RegOp::Hlt => "HLT",
        }
    }

    fn bits(self) -> u8 {
        match self {
            RegOp::Clr => 0,
            RegOp::Cmp => 1,
            RegOp::Rtl => 2,
            RegOp::Rtr => 3,
            RegOp::Ors => 4,
            RegOp::Nop => 5,
            RegOp::Hlt => 6,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(RegOp::Clr),
            1 => Some(RegOp::Cmp),
            2 => Some(RegOp::Rtl),
            3 => Some(RegOp::Rtr),
            4 => Some(RegOp::Ors),
            5 => Some(RegOp::Nop),
            6 => Some(RegOp::Hlt),
            _ => None,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s {
            "CLR" => Some(RegOp::Clr),
            "CMP" => Some(RegOp::Cmp),
            "RTL" => Some(RegOp::Rtl),
            "RTR" => Some(RegOp::Rtr),
            "ORS" => Some(RegOp::Ors),
            "NOP" => Some(RegOp::Nop),
            "HLT" => Some(RegOp::Hlt),
            _ => None,
        }
    }
}

/// A skip instruction (`11 001 xxx`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOp {
    Sno,
    Sna,
    Szs,
}

impl SkipOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            SkipOp::Sno => "SNO",
            SkipOp::Sna => "SNA",
            SkipOp::Szs => "SZS",
        }
    }

    fn bits(self) -> u8 {
        match self {
            SkipOp::Sno => 0,
            SkipOp::Sna => 1,
            SkipOp::Szs => 2,
        }
    }

    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(SkipOp::Sno),
            1 => Some(SkipOp::Sna),
            2 => Some(SkipOp::Szs),
            _ => None,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s {
            "SNO" => Some(SkipOp::Sno),
            "SNA" => Some(SkipOp::Sna),
            "SZS" => Some(SkipOp::Szs),
            _ => None,
        }
    }
}

/// An I/O instruction (`11 0dd ddd` family, where `dd...` selects the op).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Sfg,
    Inp,
    Out,
}

impl IoOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            IoOp::Sfg => "SFG",
            IoOp::Inp => "INP",
            IoOp::Out => "OUT",
        }
    }

    /// The 5-bit prefix (top 5 bits of the word) this I/O op encodes to.
    fn prefix(self) -> u8 {
        match self {
            IoOp::Sfg => 0b11010,
            IoOp::Inp => 0b11100,
            IoOp::Out => 0b11110,
        }
    }

    fn from_prefix(prefix: u8) -> Option<Self> {
        match prefix {
            0b11010 => Some(IoOp::Sfg),
            0b11100 => Some(IoOp::Inp),
            0b11110 => Some(IoOp::Out),
            _ => None,
        }
    }

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s {
            "SFG" => Some(IoOp::Sfg),
            "INP" => Some(IoOp::Inp),
            "OUT" => Some(IoOp::Out),
            _ => None,
        }
    }
}

/// A fully decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    MemRef { op: MemOp, indirect: bool, a5: u8 },
    Reg(RegOp),
    Skip(SkipOp),
    Io { op: IoOp, device: u8 },
    /// Any 8-bit pattern that matches none of the above — executes as NOP.
    Unknown(u8),
}

/// Decode a single instruction word. Exhaustive: anything not matching a
/// known pattern decodes to `Instruction::Unknown`, which the CPU executes
/// as NOP (spec.md §7 point 4 — deliberate, not an error).
pub fn decode(word: u8) -> Instruction {
    let top2 = (word >> 6) & 0b11;
    if top2 != 0b11 {
        let op = match top2 {
            0b00 => MemOp::Jmp,
            0b01 => MemOp::Str,
            0b10 => MemOp::Add,
            _ => unreachable!(),
        };
        let indirect = (word >> 5) & 1 != 0;
        let a5 = word & 0b1_1111;
        return Instruction::MemRef { op, indirect, a5 };
    }

    let top5 = (word >> 3) & 0b1_1111;
    if let Some(io_op) = IoOp::from_prefix(top5) {
        return Instruction::Io {
            op: io_op,
            device: word & 0b111,
        };
    }

    let group = (word >> 3) & 0b111;
    match group {
        0b000 => {
            if let Some(reg_op) = RegOp::from_bits(word & 0b111) {
                return Instruction::Reg(reg_op);
            }
        }
        0b001 => {
            if let Some(skip_op) = SkipOp::from_bits(word & 0b111) {
                return Instruction::Skip(skip_op);
            }
        }
        _ => {}
    }
    Instruction::Unknown(word)
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::MemRef { op, indirect, a5 } => {
                if *indirect {
                    write!(f, "{} *{}", op.mnemonic(), a5)
                } else {
                    write!(f, "{} {}", op.mnemonic(), a5)
                }
            }
            Instruction::Reg(r) => write!(f, "{}", r.mnemonic()),
            Instruction::Skip(s) => write!(f, "{}", s.mnemonic()),
            Instruction::Io { op, device } => write!(f, "{} {}", op.mnemonic(), device),
            Instruction::Unknown(w) => write!(f, "DATA 0x{:02X}  ; Unknown instruction", w),
        }
    }
}

/// Encode a decoded instruction back to its word, the inverse of [`decode`]
/// for every variant except `Unknown` (which has no canonical encoding).
pub fn encode(inst: &Instruction) -> Option<u8> {
    match inst {
        Instruction::MemRef { op, indirect, a5 } => {
            Some((op.bits() << 6) | ((*indirect as u8) << 5) | (a5 & 0b1_1111))
        }
        Instruction::Reg(r) => Some(0b1100_0000 | r.bits()),
        Instruction::Skip(s) => Some(0b1100_1000 | s.bits()),
        Instruction::Io { op, device } => Some((op.prefix() << 3) | (device & 0b111)),
        Instruction::Unknown(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_register_ops() {
        assert_eq!(decode(0b1100_0000), Instruction::Reg(RegOp::Clr));
        assert_eq!(decode(0b1100_0110), Instruction::Reg(RegOp::Hlt));
    }

    #[test]
    fn test_decode_skip_ops() {
        assert_eq!(decode(0b1100_1000), Instruction::Skip(SkipOp::Sno));
        assert_eq!(decode(0b1100_1010), Instruction::Skip(SkipOp::Szs));
    }

    #[test]
    fn test_decode_io_ops() {
        assert_eq!(
            decode(0b1110_0001),
            Instruction::Io {
                op: IoOp::Inp,
                device: 1
            }
        );
        assert_eq!(
            decode(0b1111_0010),
            Instruction::Io {
                op: IoOp::Out,
                device: 2
            }
        );
    }

    #[test]
    fn test_decode_memory_reference_direct_and_indirect() {
        assert_eq!(
            decode(0b10_0_10000),
            Instruction::MemRef {
                op: MemOp::Add,
                indirect: false,
                a5: 16
            }
        );
        assert_eq!(
            decode(0b10_1_10001),
            Instruction::MemRef {
                op: MemOp::Add,
                indirect: true,
                a5: 17
            }
        );
    }

    #[test]
    fn test_unknown_pattern_is_data_not_error() {
        match decode(0b1100_0111) {
            Instruction::Unknown(w) => assert_eq!(w, 0b1100_0111),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_decode_round_trip_register_ops() {
        for m in ["CLR", "CMP", "RTL", "RTR", "ORS", "NOP", "HLT"] {
            let op = RegOp::from_mnemonic(m).unwrap();
            let word = encode(&Instruction::Reg(op)).unwrap();
            assert_eq!(format!("{}", decode(word)), m);
        }
    }

    #[test]
    fn test_encode_decode_round_trip_direct_mem_ref_at_page_zero() {
        for n in 0..32u8 {
            for (mnem, op) in [("JMP", MemOp::Jmp), ("STR", MemOp::Str), ("ADD", MemOp::Add)] {
                let inst = Instruction::MemRef {
                    op,
                    indirect: false,
                    a5: n,
                };
                let word = encode(&inst).unwrap();
                assert_eq!(format!("{}", decode(word)), format!("{} {}", mnem, n));
            }
        }
    }
}
