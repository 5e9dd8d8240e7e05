//! Facade wiring the CPU, memory, and I/O hub into one emulator session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::asm::{self, AsmError};
use crate::cpu::Cpu;
use crate::disasm::{self, ProgramAnalysis};
use crate::io::{DeviceStatus, Hub};
use crate::memory::{Memory, SnapshotError};

/// Outcome of a `run()` call: the reason stepping stopped, plus how many
/// instructions actually executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Halted { steps: u32 },
    Breakpoint { address: u8, steps: u32 },
    StepLimitReached { steps: u32 },
}

/// A single recorded step, kept only while `debug_mode` is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub pc: u8,
    pub instruction: u8,
    pub ac: u8,
    pub overflow: bool,
}

/// JSON-serializable snapshot of the whole machine, per the external
/// memory-dump/state interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
    pub io_devices: Vec<Option<IoDeviceSnapshot>>,
    pub breakpoints: Vec<u8>,
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub ac: u8,
    pub pc: u8,
    pub ir: u8,
    pub mar: u8,
    pub mdr: u8,
    pub msr: u8,
    pub overflow: bool,
    pub halted: bool,
    pub running: bool,
    pub data_switches: u8,
    pub run_stop: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub current_bank: u8,
    pub n_active: u8,
    pub words: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoDeviceSnapshot {
    pub name: String,
    pub flag: bool,
    pub enabled: bool,
}

/// The top-level emulator session: owns the CPU, memory, and I/O hub, and
/// adds the debugging/analysis/persistence surface around them.
pub struct Emulator {
    pub cpu: Cpu,
    pub memory: Memory,
    pub hub: Hub,
    pub debug_mode: bool,
    breakpoints: BTreeSet<u8>,
    execution_history: Vec<ExecutionRecord>,
    max_history: usize,
}

impl Default for Emulator {
    fn default() -> Self {
        Emulator {
            cpu: Cpu::new(),
            memory: Memory::new(),
            hub: Hub::new(),
            debug_mode: false,
            breakpoints: BTreeSet::new(),
            execution_history: Vec::new(),
            max_history: 100,
        }
    }
}

impl Emulator {
    pub fn new() -> Self {
        Emulator::default()
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.reset();
        self.hub.reset_all();
        self.breakpoints.clear();
        self.execution_history.clear();
    }

    /// Assemble `source` and load it at `start_address`, only if assembly
    /// produced no errors. Returns the errors otherwise, leaving memory and
    /// the PC untouched.
    pub fn load_assembly(&mut self, source: &str, start_address: u8) -> Result<(), Vec<AsmError>> {
        let out = asm::assemble(source);
        if !out.errors.is_empty() {
            return Err(out.errors);
        }
        self.memory.load_image(&out.image, start_address);
        self.cpu.reg.pc = start_address;
        Ok(())
    }

    /// Load a pre-assembled sparse image directly.
    pub fn load_image(&mut self, image: &crate::memory::Image, start_address: u8) {
        self.memory.load_image(image, start_address);
        self.cpu.reg.pc = start_address;
    }

    /// Execute a single instruction. Returns `false` if the CPU was already
    /// halted or a breakpoint at the current PC stopped it before fetch.
    pub fn single_step(&mut self) -> bool {
        if self.cpu.reg.halted {
            return false;
        }
        if self.breakpoints.contains(&self.cpu.reg.pc) {
            return false;
        }
        if self.debug_mode {
            self.record_step();
        }
        self.cpu.step(&mut self.memory, &mut self.hub)
    }

    fn record_step(&mut self) {
        let record = ExecutionRecord {
            pc: self.cpu.reg.pc,
            instruction: self.memory.read(self.cpu.reg.pc),
            ac: self.cpu.reg.ac,
            overflow: self.cpu.reg.overflow,
        };
        self.execution_history.push(record);
        if self.execution_history.len() > self.max_history {
            self.execution_history.remove(0);
        }
    }

    /// Run until halt, a breakpoint, or `max_steps` instructions have
    /// executed (default 10,000 in the front-end convenience wrapper).
    pub fn run(&mut self, max_steps: u32) -> RunOutcome {
        self.cpu.reg.running = true;
        let mut steps = 0;
        while self.cpu.reg.running && !self.cpu.reg.halted && steps < max_steps {
            if self.breakpoints.contains(&self.cpu.reg.pc) {
                self.cpu.reg.running = false;
                return RunOutcome::Breakpoint {
                    address: self.cpu.reg.pc,
                    steps,
                };
            }
            if self.debug_mode {
                self.record_step();
            }
            if !self.cpu.step(&mut self.memory, &mut self.hub) {
                break;
            }
            steps += 1;
        }

        if steps >= max_steps {
            self.cpu.reg.running = false;
            return RunOutcome::StepLimitReached { steps };
        }
        self.cpu.reg.running = false;
        RunOutcome::Halted { steps }
    }

    // --- Breakpoints ---

    pub fn set_breakpoint(&mut self, address: u8) {
        self.breakpoints.insert(address);
    }

    pub fn clear_breakpoint(&mut self, address: u8) {
        self.breakpoints.remove(&address);
    }

    pub fn clear_all_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoints(&self) -> Vec<u8> {
        self.breakpoints.iter().copied().collect()
    }

    pub fn enable_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
        if !enabled {
            self.execution_history.clear();
        }
    }

    pub fn execution_history(&self) -> &[ExecutionRecord] {
        &self.execution_history
    }

    // --- Front panel ---

    pub fn press_load_address(&mut self) {
        self.cpu.press_load_address();
    }

    pub fn press_load_data(&mut self) {
        self.cpu.press_load_data(&mut self.memory);
    }

    pub fn press_display(&mut self) {
        self.cpu.press_display(&self.memory);
    }

    pub fn set_run_stop(&mut self, run: bool) {
        self.cpu.set_run_stop(run);
    }

    /// Simulate a START/STEP button press: runs continuously if RUN/STOP is
    /// set to RUN, otherwise executes exactly one instruction.
    pub fn press_start_step(&mut self, max_steps: u32) -> RunOutcome {
        if self.cpu.reg.run_stop {
            self.run(max_steps)
        } else {
            let ran = self.single_step();
            RunOutcome::Halted {
                steps: ran as u32,
            }
        }
    }

    pub fn set_data_switches(&mut self, value: u8) {
        self.cpu.set_data_switches(value);
        self.hub.switches_mut().set(value);
    }

    // --- Analysis ---

    pub fn disassemble_memory(&self, start_addr: u8, length: Option<u16>) -> String {
        disasm::disassemble_memory(&self.memory, start_addr, length)
    }

    pub fn analyze_program(&self) -> Option<ProgramAnalysis> {
        disasm::analyze_program(&self.memory)
    }

    pub fn device_status(&self) -> Vec<Option<DeviceStatus>> {
        self.hub.status()
    }

    /// Build a full JSON-serializable snapshot of the machine.
    pub fn snapshot(&self) -> Snapshot {
        let mut words = Vec::with_capacity(256);
        for addr in 0..=255u16 {
            words.push(self.memory.read(addr as u8));
        }

        let io_devices = self
            .hub
            .status()
            .into_iter()
            .map(|s| {
                s.map(|d| IoDeviceSnapshot {
                    name: d.name,
                    flag: d.flag,
                    enabled: d.enabled,
                })
            })
            .collect();

        Snapshot {
            cpu: CpuSnapshot {
                ac: self.cpu.reg.ac,
                pc: self.cpu.reg.pc,
                ir: self.cpu.reg.ir,
                mar: self.cpu.reg.mar,
                mdr: self.cpu.reg.mdr,
                msr: self.cpu.reg.msr,
                overflow: self.cpu.reg.overflow,
                halted: self.cpu.reg.halted,
                running: self.cpu.reg.running,
                data_switches: self.cpu.reg.data_switches,
                run_stop: self.cpu.reg.run_stop,
            },
            memory: MemorySnapshot {
                current_bank: self.memory.current_bank(),
                n_active: self.memory.n_active_banks(),
                words,
            },
            io_devices,
            breakpoints: self.breakpoints(),
            debug_mode: self.debug_mode,
        }
    }

    /// Serialize the current state to a JSON string.
    pub fn export_state(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| SnapshotError::Format(e.to_string()))
    }

    /// Restore CPU registers, breakpoints, and debug mode from a snapshot.
    /// Memory words are restored too; I/O device identity/state is not
    /// reconstructed (devices are live objects, not data).
    pub fn import_state(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snap: Snapshot =
            serde_json::from_str(json).map_err(|e| SnapshotError::Format(e.to_string()))?;

        self.cpu.reg.ac = snap.cpu.ac;
        self.cpu.reg.pc = snap.cpu.pc;
        self.cpu.reg.ir = snap.cpu.ir;
        self.cpu.reg.mar = snap.cpu.mar;
        self.cpu.reg.mdr = snap.cpu.mdr;
        self.cpu.reg.msr = snap.cpu.msr;
        self.cpu.reg.overflow = snap.cpu.overflow;
        self.cpu.reg.halted = snap.cpu.halted;
        self.cpu.reg.running = snap.cpu.running;
        self.cpu.reg.data_switches = snap.cpu.data_switches;
        self.cpu.reg.run_stop = snap.cpu.run_stop;

        self.memory.set_active_banks(snap.memory.n_active);
        self.memory.select_bank(snap.memory.current_bank);
        for (addr, &word) in snap.memory.words.iter().enumerate() {
            self.memory.write(addr as u8, word);
        }

        self.breakpoints = snap.breakpoints.into_iter().collect();
        self.debug_mode = snap.debug_mode;
        Ok(())
    }
}
