use color_eyre::eyre::{eyre, Result};

use ls8::machine::Machine;
use ls8::write_instructions;
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Where the `double` subroutine lives
const SUBROUTINE: u8 = 0x20;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?; // logging

    let mut machine = Machine::new();
    let mem = &mut machine.memory;

    use ls8::processor::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 0, 21,
        LDI, 1, SUBROUTINE,
        CALL, 1,
        PRN, 0,
        CALL, 1,
        PRN, 0,
        HLT
    );
    // R0 = R0 * 2, keeping the caller's R2
    write_instructions!(mem : SUBROUTINE =>
        PUSH, 2,
        LDI, 2, 2,
        MUL, 0, 2,
        POP, 2,
        RET
    );

    machine.run()?; // prints 42 and 84

    Ok(())
}
