use color_eyre::eyre::{ensure, Result};

use crate::memory::{Address, Byte, Memory, MEMORY_SIZE};
use crate::output::{Output, Stdout};
use crate::processor::Processor;

/// A complete computer: processor, memory and the device `PRN` writes to.
#[derive(Debug, Clone)]
pub struct Machine<O: Output = Stdout> {
    pub processor: Processor,
    pub memory: Memory,
    output: O,
}

impl Machine<Stdout> {
    /// Creates a machine printing to standard output
    pub fn new() -> Self {
        Self::with_output(Stdout)
    }
}

impl Default for Machine<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Output> Machine<O> {
    pub fn with_output(output: O) -> Self {
        Self::with_memory(Memory::default(), output)
    }

    /// Creates a machine around an already loaded memory image
    pub fn with_memory(memory: Memory, output: O) -> Self {
        Self {
            processor: Processor::new(),
            memory,
            output,
        }
    }

    /// Writes a single byte of the program image
    pub fn load(&mut self, address: Address, value: Byte) {
        self.memory.write_byte(address, value);
    }

    /// Writes `program` to memory starting at address 0
    pub fn load_program(&mut self, program: &[Byte]) -> Result<()> {
        ensure!(
            program.len() <= MEMORY_SIZE,
            "program of {} bytes does not fit into {} bytes of memory",
            program.len(),
            MEMORY_SIZE
        );

        self.memory.write_array(0, program);
        log::debug!("Loaded {} bytes", program.len());

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.processor.running
    }

    /// Executes one instruction
    pub fn step(&mut self) -> Result<()> {
        self.processor.execute(&mut self.memory, &mut self.output)
    }

    /// Runs until `HLT` or the first fatal error
    pub fn run(&mut self) -> Result<()> {
        self.processor
            .execute_until_halt(&mut self.memory, &mut self.output)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }
}
