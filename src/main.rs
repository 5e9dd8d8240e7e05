use std::env;

use micro2_rs::emulator::{Emulator, RunOutcome};
use micro2_rs::samples;

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let program_name = args.next().unwrap_or_else(|| "addition".to_string());

    let source = samples::all()
        .into_iter()
        .find(|(name, _)| *name == program_name)
        .map(|(_, src)| src)
        .unwrap_or_else(|| {
            eprintln!("unknown sample '{program_name}', running 'addition' instead");
            samples::ADDITION
        });

    let mut emu = Emulator::new();
    if let Err(errors) = emu.load_assembly(source, 0) {
        for e in errors {
            eprintln!("{e}");
        }
        std::process::exit(1);
    }

    match emu.run(10_000) {
        RunOutcome::Halted { steps } => log::info!("halted after {steps} steps"),
        RunOutcome::Breakpoint { address, steps } => {
            log::info!("breakpoint at {address:#04x} after {steps} steps")
        }
        RunOutcome::StepLimitReached { steps } => {
            log::warn!("step limit reached after {steps} steps")
        }
    }

    println!("{}", emu.analyze_program().map(|a| micro2_rs::disasm::render_analysis(&a)).unwrap_or_else(|| "no program resident".to_string()));
    println!("AC = {:#04x}", emu.cpu.reg.ac);
}
