use std::io::{self, Write};

use crate::memory::Byte;

/// Receives the values printed by `PRN`
pub trait Output {
    fn emit(&mut self, value: Byte) -> io::Result<()>;
}

/// Prints every value as a decimal number on its own line
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn emit(&mut self, value: Byte) -> io::Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", value)
    }
}

/// Collects the printed values, mostly useful for tests
impl Output for Vec<Byte> {
    fn emit(&mut self, value: Byte) -> io::Result<()> {
        self.push(value);
        Ok(())
    }
}
