//! Word -> mnemonic disassembly and whole-program structural analysis.
//!
//! Decoding itself is never heuristic (`cpu::decode` is the single source of
//! truth); the "is this data?" heuristic here is advisory annotation only,
//! per spec.md §4.E.

use crate::cpu::decode::{decode, Instruction, MemOp};
use crate::memory::Memory;

/// Disassemble a single instruction word to its mnemonic text.
pub fn disassemble_one(word: u8) -> String {
    format!("{}", decode(word))
}

/// One line of a full-program disassembly listing.
#[derive(Debug, Clone)]
pub struct ListingLine {
    pub address: u8,
    pub word: u8,
    pub mnemonic: String,
    pub is_jump_target: bool,
    pub looks_like_data: bool,
}

/// A page-in-use summary entry.
#[derive(Debug, Clone, Copy)]
pub struct PageUsage {
    pub page: u8,
    pub start: u8,
    pub end: u8,
}

/// Structural analysis of a program resident in memory.
#[derive(Debug, Clone)]
pub struct ProgramAnalysis {
    pub end_address: u8,
    pub lines: Vec<ListingLine>,
    pub pages_in_use: Vec<PageUsage>,
}

/// Advisory-only heuristic: does this word decode to something that isn't a
/// recognized instruction pattern? MUST NOT be used to alter decoding.
fn looks_like_data(word: u8) -> bool {
    matches!(decode(word), Instruction::Unknown(_))
}

/// Find the jump target of a JMP word at `addr`, per the effective-address
/// rule: direct targets stay within the instruction's own page; indirect
/// targets are the pointer *location*, not its contents (a second disasm
/// pass would need to read memory to resolve the indirect target for real
/// execution, but for jump-target annotation the pointer cell itself is
/// what spec.md §4.E asks to mark).
fn jump_target(addr: u8, word: u8) -> Option<u8> {
    if let Instruction::MemRef {
        op: MemOp::Jmp,
        indirect,
        a5,
    } = decode(word)
    {
        if indirect {
            Some(a5)
        } else {
            Some((addr & 0xE0) | a5)
        }
    } else {
        None
    }
}

/// Disassemble memory contents into a full structured program analysis.
///
/// Returns `None` if every cell in memory is zero ("no program").
pub fn analyze_program(mem: &Memory) -> Option<ProgramAnalysis> {
    let end_address = (0..=255u16)
        .rev()
        .map(|a| a as u8)
        .find(|&a| mem.read(a) != 0)?;

    let mut jump_targets = std::collections::HashSet::new();
    for addr in 0..=end_address {
        let word = mem.read(addr);
        if let Some(target) = jump_target(addr, word) {
            jump_targets.insert(target);
        }
        if addr == u8::MAX {
            break;
        }
    }

    let mut lines = Vec::new();
    for addr in 0..=end_address {
        let word = mem.read(addr);
        lines.push(ListingLine {
            address: addr,
            word,
            mnemonic: disassemble_one(word),
            is_jump_target: jump_targets.contains(&addr),
            looks_like_data: looks_like_data(word),
        });
        if addr == u8::MAX {
            break;
        }
    }

    let mut pages_in_use = Vec::new();
    for page in 0..crate::memory::PAGES_PER_BANK {
        let start = page * crate::memory::WORDS_PER_PAGE;
        let end = start + crate::memory::WORDS_PER_PAGE - 1;
        let has_content = (start..=end).any(|a| mem.read(a) != 0);
        if has_content {
            pages_in_use.push(PageUsage { page, start, end });
        }
    }

    Some(ProgramAnalysis {
        end_address,
        lines,
        pages_in_use,
    })
}

/// Render a [`ProgramAnalysis`] as the human-readable listing spec.md §4.E
/// describes (address, binary encoding, mnemonic, annotations, page summary).
pub fn render_analysis(analysis: &ProgramAnalysis) -> String {
    let mut out = String::new();
    out.push_str("MICRO II Program Analysis\n");
    out.push_str(&"=".repeat(40));
    out.push('\n');
    out.push_str(&format!(
        "Program size: {} words\n\n",
        analysis.end_address as u16 + 1
    ));
    out.push_str("Address  Binary    Instruction     Comment\n");
    out.push_str(&"-".repeat(50));
    out.push('\n');
    for line in &analysis.lines {
        let mut comment = String::new();
        if line.is_jump_target {
            comment.push_str("; <-- Jump target ");
        }
        if line.looks_like_data {
            comment.push_str("; (Data)");
        }
        out.push_str(&format!(
            "{:02X}:     {:08b}  {:<15} {}\n",
            line.address, line.word, line.mnemonic, comment
        ));
    }
    out.push_str("\nMemory Layout Summary:\n");
    out.push_str(&"-".repeat(25));
    out.push('\n');
    for page in &analysis.pages_in_use {
        out.push_str(&format!(
            "Page {} ({:02X}-{:02X}): In use\n",
            page.page, page.start, page.end
        ));
    }
    out
}

/// Render a full `00`..`FF` memory disassembly listing (not limited to the
/// detected program bounds) — the plain `disassemble_memory` surface spec.md
/// §4.F's facade exposes.
pub fn disassemble_memory(mem: &Memory, start_addr: u8, length: Option<u16>) -> String {
    let length = length.unwrap_or_else(|| {
        for addr in (0..=255u8).rev() {
            if mem.read(addr) != 0 {
                return addr as u16 + 1;
            }
        }
        256
    });

    let mut out = String::new();
    out.push_str("# MICRO II Disassembly\n");
    out.push_str("# Addr: Binary    Assembly\n");
    out.push_str(&format!("#{}\n", "-".repeat(35)));
    for i in 0..length.min(256) {
        let addr = start_addr.wrapping_add(i as u8);
        let word = mem.read(addr);
        out.push_str(&format!(
            "{:02X}: {:08b} {}\n",
            addr,
            word,
            disassemble_one(word)
        ));
        if start_addr as u16 + i >= 255 {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_register_ops() {
        assert_eq!(disassemble_one(0b1100_0000), "CLR");
        assert_eq!(disassemble_one(0b1100_0110), "HLT");
    }

    #[test]
    fn test_disassemble_memory_reference() {
        assert_eq!(disassemble_one(0b10_0_10000), "ADD 16");
        assert_eq!(disassemble_one(0b10_1_10001), "ADD *17");
        assert_eq!(disassemble_one(0b00_0_01010), "JMP 10");
    }

    #[test]
    fn test_disassemble_io() {
        assert_eq!(disassemble_one(0b1110_0001), "INP 1");
        assert_eq!(disassemble_one(0b1111_0010), "OUT 2");
    }

    #[test]
    fn test_unknown_pattern_annotated() {
        let s = disassemble_one(0b1100_0111);
        assert!(s.contains("Unknown instruction"));
        assert!(s.starts_with("DATA 0x"));
    }

    #[test]
    fn test_no_program_is_none() {
        let mem = Memory::new();
        assert!(analyze_program(&mem).is_none());
    }

    #[test]
    fn test_jump_target_direct_stays_in_page() {
        let mut mem = Memory::new();
        // JMP 5 at address 0x21 (page 1) -> target page 1 word 5 = 0x25
        mem.write(0x21, 0b00_0_00101);
        let analysis = analyze_program(&mem).unwrap();
        assert!(analysis.lines.iter().all(|l| !l.is_jump_target || l.address == 0x25 || l.address == 0x21));
    }

    #[test]
    fn test_page_summary_detects_used_pages() {
        let mut mem = Memory::new();
        mem.write(40, 0xFF); // page 1 (40 = 0x28)
        let analysis = analyze_program(&mem).unwrap();
        assert!(analysis.pages_in_use.iter().any(|p| p.page == 1));
        assert!(!analysis.pages_in_use.iter().any(|p| p.page == 0));
    }
}
