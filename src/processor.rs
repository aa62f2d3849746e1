use std::cmp::Ordering;
use std::convert::TryFrom;
use std::{error, fmt};

use crate::memory::{Address, Byte, Memory};
use crate::output::Output;
use color_eyre::eyre::{Result, WrapErr};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;
/// Register holding the stack pointer
pub const SP: usize = 7;
/// Initial stack pointer. The stack grows down from here.
pub const STACK_BASE: Address = 0xF4;

/// Result of the last `CMP`. Exactly one flag is set at a time.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Less = 0b100,
    Greater = 0b010,
    Equal = 0b001,
}

impl Flag {
    pub fn bits(self) -> Byte {
        self as Byte
    }
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Equal
    }
}

/// Fatal errors raised while executing a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorError {
    InvalidOpcode { opcode: Byte },
    UnsupportedAluOperation { instruction: Instruction },
    InvalidRegister { index: Byte },
}

impl fmt::Display for ProcessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorError::InvalidOpcode { opcode } => {
                write!(f, "invalid opcode 0x{:02X}, expected one of [", opcode)?;
                for (i, instruction) in Instruction::ALL.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}=0x{:02X}", instruction, Byte::from(*instruction))?;
                }
                f.write_str("]")
            }
            ProcessorError::UnsupportedAluOperation { instruction } => {
                write!(f, "unsupported ALU operation `{}`", instruction)
            }
            ProcessorError::InvalidRegister { index } => {
                write!(f, "no register with index {}", index)
            }
        }
    }
}

impl error::Error for ProcessorError {}

/// Emulates the CPU core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// General purpose registers, R7 doubles as stack pointer
    pub registers: [Byte; REGISTER_COUNT],
    /// Program counter
    pub pc: Address,
    /// Set by `CMP`
    pub flags: Flag,
    /// Cleared by `HLT`
    pub running: bool,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU with the program starting at address 0
    pub fn new() -> Self {
        let mut registers = [0; REGISTER_COUNT];
        registers[SP] = STACK_BASE;

        Self {
            registers,
            pc: 0,
            flags: Flag::default(),
            running: true,
        }
    }

    /// Resolves an operand to a register index
    fn register(index: Byte) -> Result<usize, ProcessorError> {
        let index_usize = index as usize;
        if index_usize < REGISTER_COUNT {
            Ok(index_usize)
        } else {
            Err(ProcessorError::InvalidRegister { index })
        }
    }

    pub fn sp(&self) -> Address {
        self.registers[SP]
    }

    fn push(&mut self, memory: &mut Memory, value: Byte) {
        self.registers[SP] = self.registers[SP].wrapping_sub(1);
        memory.write_byte(self.registers[SP], value);
    }

    fn pop(&mut self, memory: &Memory) -> Byte {
        let value = memory.read_byte(self.registers[SP]);
        self.registers[SP] = self.registers[SP].wrapping_add(1);
        value
    }

    /// Runs an arithmetic or compare operation on two registers
    pub fn alu(&mut self, operation: Instruction, a: Byte, b: Byte) -> Result<(), ProcessorError> {
        if !operation.is_alu() {
            return Err(ProcessorError::UnsupportedAluOperation {
                instruction: operation,
            });
        }

        let (a, b) = (Self::register(a)?, Self::register(b)?);
        let (x, y) = (self.registers[a], self.registers[b]);

        match operation {
            Instruction::ADD => self.registers[a] = x.wrapping_add(y),
            Instruction::MUL => self.registers[a] = x.wrapping_mul(y),
            Instruction::CMP => {
                self.flags = match x.cmp(&y) {
                    Ordering::Less => Flag::Less,
                    Ordering::Greater => Flag::Greater,
                    Ordering::Equal => Flag::Equal,
                };

                debug!("CMP {} {}: flags=0b{:03b}", x, y, self.flags.bits());
            }
            other => {
                return Err(ProcessorError::UnsupportedAluOperation { instruction: other })
            }
        }

        Ok(())
    }

    /// Executes a single decoded instruction. Operands `a` and `b` are the two
    /// bytes following the opcode, whether the instruction uses them or not.
    pub fn execute_instruction<O: Output>(
        &mut self,
        instruction: Instruction,
        a: Byte,
        b: Byte,
        memory: &mut Memory,
        output: &mut O,
    ) -> Result<()> {
        match instruction {
            Instruction::HLT => {
                self.running = false;

                debug!("HLT");
            }
            Instruction::LDI => {
                let reg = Self::register(a)?;
                self.registers[reg] = b;
                self.pc = self.pc.wrapping_add(instruction.size());

                debug!("LDI R{} {}", reg, b);
            }
            Instruction::PRN => {
                let reg = Self::register(a)?;
                let value = self.registers[reg];
                output
                    .emit(value)
                    .wrap_err_with(|| format!("Failed to print R{}", reg))?;
                self.pc = self.pc.wrapping_add(instruction.size());

                debug!("PRN R{}: {}", reg, value);
            }
            Instruction::ADD | Instruction::MUL | Instruction::CMP => {
                self.alu(instruction, a, b)?;
                self.pc = self.pc.wrapping_add(instruction.size());

                debug!("{} R{} R{}", instruction, a, b);
            }
            Instruction::PUSH => {
                let reg = Self::register(a)?;
                let value = self.registers[reg];
                self.push(memory, value);
                self.pc = self.pc.wrapping_add(instruction.size());

                debug!("PUSH R{}: {}", reg, value);
            }
            Instruction::POP => {
                let reg = Self::register(a)?;
                let value = self.pop(memory);
                self.registers[reg] = value;
                self.pc = self.pc.wrapping_add(instruction.size());

                debug!("POP R{}: {}", reg, value);
            }
            Instruction::CALL => {
                let reg = Self::register(a)?;
                let return_address = self.pc.wrapping_add(instruction.size());
                self.push(memory, return_address);
                // read after the push, so `CALL R7` jumps to the new stack top
                self.pc = self.registers[reg];

                debug!("CALL R{}: 0x{:02X}", reg, self.pc);
            }
            Instruction::RET => {
                self.pc = self.pop(memory);

                debug!("RET 0x{:02X}", self.pc);
            }
            Instruction::JMP => {
                let reg = Self::register(a)?;
                self.pc = self.registers[reg];

                debug!("JMP R{}: 0x{:02X}", reg, self.pc);
            }
            Instruction::JEQ | Instruction::JNE => {
                let reg = Self::register(a)?;
                let equal = self.flags == Flag::Equal;
                let taken = (instruction == Instruction::JEQ) == equal;

                if taken {
                    self.pc = self.registers[reg];
                } else {
                    self.pc = self.pc.wrapping_add(instruction.size());
                }

                debug!("{} R{}: taken={}", instruction, reg, taken);
            }
        }

        Ok(())
    }

    /// Fetches, decodes and executes the instruction at the program counter
    pub fn execute<O: Output>(&mut self, memory: &mut Memory, output: &mut O) -> Result<()> {
        if log_enabled!(Level::Trace) {
            trace!("{}", self.trace(memory));
        }

        let opcode = memory.read_byte(self.pc); // Read opcode where PC is
        let a = memory.read_byte(self.pc.wrapping_add(1));
        let b = memory.read_byte(self.pc.wrapping_add(2));

        let instruction = Instruction::try_from(opcode)
            .map_err(|_| ProcessorError::InvalidOpcode { opcode })?;
        self.execute_instruction(instruction, a, b, memory, output)
    }

    /// Run program until `HLT` or a fatal error
    pub fn execute_until_halt<O: Output>(
        &mut self,
        memory: &mut Memory,
        output: &mut O,
    ) -> Result<()> {
        while self.running {
            self.execute(memory, output)?;
        }

        info!("Program halted at 0x{:02X}", self.pc);

        Ok(())
    }

    /// Formats the PC, the next three bytes and all registers
    pub fn trace(&self, memory: &Memory) -> String {
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            memory.read_byte(self.pc),
            memory.read_byte(self.pc.wrapping_add(1)),
            memory.read_byte(self.pc.wrapping_add(2)),
        );

        for register in &self.registers {
            line.push_str(&format!(" {:02X}", register));
        }

        line
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , $len:literal , )+ ) => {
        /// Defines the instructions and their encoded lengths
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            /// Number of bytes the instruction occupies, opcode included
            pub fn size(&self) -> u8 {
                match self {
                    $( Self::$name => $len , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

instructions! {
    /// Stop the execution of the program
    HLT = 0b0000_0001, 1,
    /// Return from a subroutine to the address on top of the stack
    RET = 0b0001_0001, 1,
    /// Load a value into a register
    /// @param register, value
    LDI = 0b1000_0010, 3,
    /// Print the decimal value of a register
    /// @param register
    PRN = 0b0100_0111, 2,
    /// Push a register onto the stack
    /// @param register
    PUSH = 0b0100_0101, 2,
    /// Pop the top of the stack into a register
    /// @param register
    POP = 0b0100_0110, 2,
    /// Add register B to register A
    /// @param register A, register B
    ADD = 0b1010_0000, 3,
    /// Multiply register A by register B
    /// @param register A, register B
    MUL = 0b1010_0010, 3,
    /// Compare two registers and set the flags
    /// @param register A, register B
    CMP = 0b1010_0111, 3,
    /// Push the return address and jump to the address in a register
    /// @param register
    CALL = 0b0101_0000, 2,
    /// Jump to the address in a register
    /// @param register
    JMP = 0b0101_0100, 2,
    /// Jump if the equal flag is set
    /// @param register
    JEQ = 0b0101_0101, 2,
    /// Jump if the equal flag is clear
    /// @param register
    JNE = 0b0101_0110, 2,
}

impl Instruction {
    /// Whether the ALU handles this instruction
    pub fn is_alu(&self) -> bool {
        matches!(self, Self::ADD | Self::MUL | Self::CMP)
    }
}
