//! The MICRO-II CPU: registers, fetch/decode/execute, and front-panel ops.

pub mod decode;
pub mod reg;

use crate::io::Hub;
use crate::memory::Memory;

use self::decode::{decode, Instruction, IoOp, MemOp, RegOp, SkipOp};
use self::reg::RegisterSet;

/// The MICRO-II CPU core.
#[derive(Default)]
pub struct Cpu {
    pub reg: RegisterSet,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu::default()
    }

    pub fn reset(&mut self) {
        self.reg.reset();
    }

    /// Execute exactly one fetch/decode/execute cycle. Returns `false` once
    /// the CPU is halted (mirroring the reference's `execute_instruction`
    /// return value), so a caller can tell "nothing happened" from "ran".
    pub fn step(&mut self, mem: &mut Memory, hub: &mut Hub) -> bool {
        if self.reg.halted {
            return false;
        }

        self.reg.mar = self.reg.pc;
        self.reg.ir = mem.read(self.reg.mar);
        self.reg.pc = self.reg.pc.wrapping_add(1);

        let instruction_page = self.reg.pc.wrapping_sub(1) & 0xE0;
        let inst = decode(self.reg.ir);
        log::trace!(
            "pc={:#04x} ir={:#04x} decoded={}",
            self.reg.mar,
            self.reg.ir,
            inst
        );
        self.execute(inst, instruction_page, mem, hub);
        true
    }

    fn execute(&mut self, inst: Instruction, instruction_page: u8, mem: &mut Memory, hub: &mut Hub) {
        match inst {
            Instruction::MemRef { op, indirect, a5 } => {
                let effective = if indirect {
                    self.reg.mdr = mem.read(a5);
                    self.reg.mdr
                } else {
                    instruction_page | a5
                };
                self.reg.mar = effective;

                match op {
                    MemOp::Jmp => self.reg.pc = effective,
                    MemOp::Str => mem.write(effective, self.reg.ac),
                    MemOp::Add => {
                        let data = mem.read(effective);
                        let sum = self.reg.ac as u16 + data as u16;
                        self.reg.overflow = sum > 255;
                        self.reg.ac = (sum & 0xFF) as u8;
                    }
                }
            }
            Instruction::Reg(op) => self.execute_reg(op),
            Instruction::Skip(op) => self.execute_skip(op),
            Instruction::Io { op, device } => self.execute_io(op, device, mem, hub),
            Instruction::Unknown(_) => {}
        }
    }

    fn execute_reg(&mut self, op: RegOp) {
        match op {
            RegOp::Clr => {
                self.reg.ac = 0;
                self.reg.overflow = false;
            }
            RegOp::Cmp => self.reg.ac = !self.reg.ac,
            RegOp::Rtl => self.reg.ac = self.reg.ac.rotate_left(1),
            RegOp::Rtr => self.reg.ac = self.reg.ac.rotate_right(1),
            RegOp::Ors => self.reg.ac |= self.reg.data_switches,
            RegOp::Nop => {}
            RegOp::Hlt => {
                self.reg.halted = true;
                self.reg.running = false;
            }
        }
    }

    fn skip_next(&mut self) {
        self.reg.pc = self.reg.pc.wrapping_add(1);
    }

    fn execute_skip(&mut self, op: SkipOp) {
        match op {
            SkipOp::Sno => {
                if !self.reg.overflow {
                    self.skip_next();
                }
                self.reg.overflow = false;
            }
            SkipOp::Sna => {
                if self.reg.ac != 0 {
                    self.skip_next();
                }
            }
            SkipOp::Szs => {
                if self.reg.ac & 0x80 == 0 {
                    self.skip_next();
                }
            }
        }
    }

    fn execute_io(&mut self, op: IoOp, device: u8, mem: &mut Memory, hub: &mut Hub) {
        match op {
            IoOp::Sfg => {
                if hub.flag(device) {
                    self.skip_next();
                }
            }
            IoOp::Inp => {
                let v = hub.input(device);
                self.reg.ac |= !v;
            }
            IoOp::Out => {
                if device == 0 {
                    self.reg.msr = self.reg.ac & 0x0F;
                    mem.select_bank(self.reg.msr);
                } else {
                    hub.output(device, self.reg.ac);
                }
            }
        }
    }

    // --- Front-panel operations, valid only when not running. ---

    pub fn press_load_address(&mut self) {
        if !self.reg.run_stop {
            self.reg.pc = self.reg.data_switches;
        }
    }

    pub fn press_load_data(&mut self, mem: &mut Memory) {
        if !self.reg.run_stop {
            mem.write(self.reg.pc, self.reg.data_switches);
            self.reg.ir = self.reg.data_switches;
            self.reg.pc = self.reg.pc.wrapping_add(1);
        }
    }

    pub fn press_display(&mut self, mem: &Memory) {
        if !self.reg.run_stop {
            self.reg.ir = mem.read(self.reg.pc);
            self.reg.pc = self.reg.pc.wrapping_add(1);
        }
    }

    pub fn set_data_switches(&mut self, w: u8) {
        self.reg.data_switches = w;
    }

    pub fn set_run_stop(&mut self, run: bool) {
        self.reg.run_stop = run;
        if !run {
            self.reg.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Cpu, Memory, Hub) {
        (Cpu::new(), Memory::new(), Hub::new())
    }

    #[test]
    fn test_pc_monotonicity_per_step() {
        let (mut cpu, mut mem, mut hub) = setup();
        mem.write(0, 0b1100_0101); // NOP
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.pc, 1);
    }

    #[test]
    fn test_add_overflow() {
        let (mut cpu, mut mem, mut hub) = setup();
        cpu.reg.ac = 255;
        mem.write(5, 1);
        // ADD 5 (direct, page 0)
        mem.write(0, 0b10_0_00101);
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.ac, 0);
        assert!(cpu.reg.overflow);
    }

    #[test]
    fn test_sno_consumes_overflow() {
        let (mut cpu, mut mem, mut hub) = setup();
        cpu.reg.overflow = true;
        mem.write(0, 0b1100_1000); // SNO
        cpu.step(&mut mem, &mut hub);
        assert!(!cpu.reg.overflow);
    }

    #[test]
    fn test_clr_idempotence() {
        let (mut cpu1, mut mem1, mut hub1) = setup();
        cpu1.reg.ac = 0xAB;
        cpu1.reg.overflow = true;
        mem1.write(0, 0b1100_0000); // CLR
        cpu1.step(&mut mem1, &mut hub1);

        let (mut cpu2, mut mem2, mut hub2) = setup();
        cpu2.reg.ac = 0xAB;
        cpu2.reg.overflow = true;
        mem2.write(0, 0b1100_0000);
        mem2.write(1, 0b1100_0000);
        cpu2.step(&mut mem2, &mut hub2);
        cpu2.step(&mut mem2, &mut hub2);

        assert_eq!(cpu1.reg.ac, cpu2.reg.ac);
        assert_eq!(cpu1.reg.overflow, cpu2.reg.overflow);
    }

    #[test]
    fn test_rotate_periodicity() {
        let (mut cpu, mut mem, mut hub) = setup();
        cpu.reg.ac = 0b1101_0010;
        mem.write(0, 0b1100_0010); // RTL
        for _ in 0..8 {
            cpu.reg.pc = 0;
            cpu.step(&mut mem, &mut hub);
        }
        assert_eq!(cpu.reg.ac, 0b1101_0010);
    }

    #[test]
    fn test_complement_involution() {
        let (mut cpu, mut mem, mut hub) = setup();
        cpu.reg.ac = 0x3C;
        mem.write(0, 0b1100_0001); // CMP
        mem.write(1, 0b1100_0001); // CMP
        cpu.step(&mut mem, &mut hub);
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.ac, 0x3C);
    }

    #[test]
    fn test_szs_boundary() {
        let (mut cpu, mut mem, mut hub) = setup();
        mem.write(0, 0b1100_1010); // SZS
        mem.write(1, 0b1100_1010);
        cpu.reg.ac = 0x80;
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.pc, 1); // did not skip

        cpu.reg.pc = 1;
        cpu.reg.ac = 0x7F;
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.pc, 3); // skipped
    }

    #[test]
    fn test_indirect_addressing_reads_full_byte_pointer() {
        let (mut cpu, mut mem, mut hub) = setup();
        mem.write(16, 20); // pointer cell: points at address 20
        mem.write(20, 77);
        mem.write(0, 0b10_1_10000); // ADD *16
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.ac, 77);
    }

    #[test]
    fn test_direct_reference_stays_in_instruction_page() {
        let (mut cpu, mut mem, mut hub) = setup();
        // last word of page 0 (addr 0x1F) does a direct ADD 0 -> must stay
        // in page 0, not spill into page 1.
        cpu.reg.pc = 0x1F;
        mem.write(0x1F, 0b10_0_00000); // ADD 0 (direct)
        mem.write(0x00, 9);
        mem.write(0x20, 99);
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.ac, 9);
    }

    #[test]
    fn test_out_zero_switches_bank() {
        let (mut cpu, mut mem, mut hub) = setup();
        mem.set_active_banks(2);
        cpu.reg.ac = 1;
        mem.write(0, 0b1111_0000); // OUT 0
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.msr, 1);
        assert_eq!(mem.current_bank(), 1);
    }

    #[test]
    fn test_sna_skips_iff_ac_nonzero() {
        let (mut cpu, mut mem, mut hub) = setup();
        mem.write(0, 0b1100_1001); // SNA
        mem.write(1, 0b1100_1001);
        cpu.reg.ac = 0;
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.pc, 1); // AC==0: no skip

        cpu.reg.pc = 1;
        cpu.reg.ac = 7;
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.pc, 3); // AC!=0: skipped
    }

    #[test]
    fn test_skip_on_nonzero_loop_terminates_after_three_iterations() {
        // A counter at mem[22] increments by one (mem[20]) each pass; AC is
        // compared to the target by adding its two's complement (mem[21] =
        // -3 mod 256 = 253) and testing the result with SNA. SNA skips the
        // exit jump while the comparison is nonzero (not yet matched) and
        // falls through to it once the comparison lands on zero (matched),
        // the exit/continue double-jump idiom the ISA's "skip if nonzero"
        // polarity requires. AC is reloaded from the counter on both the
        // continue and exit paths since the comparison add clobbers it.
        let (mut cpu, mut mem, mut hub) = setup();
        mem.write(0, 0b1100_0000); // 0:  CLR
        mem.write(1, 0b10_0_10100); // 1: LOOP: ADD 20 (+1)
        mem.write(2, 0b01_0_10110); // 2:  STR 22
        mem.write(3, 0b10_0_10101); // 3:  ADD 21 (+253 == -3 mod 256)
        mem.write(4, 0b1100_1001); // 4:  SNA
        mem.write(5, 0b00_0_01010); // 5:  JMP 10 (EXIT, taken iff matched)
        mem.write(6, 0b00_0_00111); // 6:  JMP 7  (RELOAD, taken otherwise)
        mem.write(7, 0b1100_0000); // 7: RELOAD: CLR
        mem.write(8, 0b10_0_10110); // 8:  ADD 22 (restore count)
        mem.write(9, 0b00_0_00001); // 9:  JMP 1 (LOOP)
        mem.write(10, 0b1100_0000); // 10: EXIT: CLR
        mem.write(11, 0b10_0_10110); // 11: ADD 22 (restore count)
        mem.write(12, 0b1100_0110); // 12: HLT
        mem.write(20, 1);
        mem.write(21, 253);

        let mut steps = 0;
        while !cpu.reg.halted && steps < 100 {
            cpu.step(&mut mem, &mut hub);
            steps += 1;
        }
        assert!(cpu.reg.halted);
        assert_eq!(mem.read(22), 3);
        assert_eq!(cpu.reg.ac, 3);
    }

    #[test]
    fn test_input_complement_protocol() {
        let (mut cpu, mut mem, mut hub) = setup();
        hub.console_input_mut().queue(0x55);
        mem.write(0, 0b1110_0001); // INP 1
        cpu.step(&mut mem, &mut hub);
        assert_eq!(cpu.reg.ac, !0x55u8);
    }
}
