use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use ls8::machine::Machine;
use ls8::memory::Memory;
use ls8::output::Stdout;

/// Runs an LS-8 program
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Program file, one byte per line in binary, `#` starts a comment
    program: PathBuf,

    /// Log PC, the next three bytes and all registers before every instruction
    #[arg(long)]
    trace: bool,

    /// error, warn, info, debug or trace
    #[arg(long, default_value = "warn", value_parser = parse_level)]
    log_level: LevelFilter,

    /// Dump the loaded memory image (logged at debug level)
    #[arg(long)]
    dump: bool,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("unknown log level `{}`", s))
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling

    let args = Args::parse();
    let level = if args.trace {
        LevelFilter::Trace
    } else {
        args.log_level
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|err| eyre!("Failed to set up logging: {}", err))?;

    let memory = Memory::from_file(&args.program)?;
    if args.dump {
        memory.dump();
    }

    let mut machine = Machine::with_memory(memory, Stdout);
    machine.run()
}
