use color_eyre::eyre::{eyre, Result};

use ls8::machine::Machine;
use ls8::memory::Memory;
use ls8::output::Stdout;
use log::LevelFilter;
use simple_logger::SimpleLogger;

const PROGRAMS: &[&str] = &["print8.ls8", "mult.ls8", "stack.ls8", "call.ls8", "sctest.ls8"];

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?; // logging

    for program in PROGRAMS {
        let path = format!("{}/demos/programs/{}", env!("CARGO_MANIFEST_DIR"), program);
        log::info!("Running {}", program);

        let mem = Memory::from_file(&path)?;
        mem.dump();
        Machine::with_memory(mem, Stdout).run()?;
    }

    Ok(())
}
