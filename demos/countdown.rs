use color_eyre::eyre::{eyre, Result};

use ls8::machine::Machine;
use ls8::write_instructions;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Trace)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?; // logging

    let mut machine = Machine::new();
    let mem = &mut machine.memory;

    use ls8::processor::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 0, 10,     // 0x00 counter
        LDI, 1, 255,    // 0x03 -1
        LDI, 2, 0,      // 0x06
        LDI, 3, 0x0C,   // 0x09 loop start
        PRN, 0,         // 0x0C
        ADD, 0, 1,      // 0x0E
        CMP, 0, 2,      // 0x11
        JNE, 3,         // 0x14
        HLT             // 0x16
    );

    machine.run()?;

    Ok(())
}
