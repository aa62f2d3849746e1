use std::fs;
use std::path::Path;
use std::str::FromStr;

use color_eyre::eyre::{eyre, Result, WrapErr};

pub mod parse;

pub type Byte = u8; // 1 byte
pub type Address = u8; // memory is 256 bytes, addresses wrap

/// Number of addressable cells
pub const MEMORY_SIZE: usize = 256;

/// Emulates memory for use with the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory {
    /// The actual data of the memory
    pub data: [Byte; MEMORY_SIZE],
}

impl Default for Memory {
    /// Initializes the memory
    fn default() -> Self {
        Memory {
            data: [0; MEMORY_SIZE],
        }
    }
}

impl Memory {
    /// Reads a byte from the memory
    pub fn read_byte(&self, position: Address) -> Byte {
        self.data[position as usize]
    }

    /// Writes a byte to the memory
    pub fn write_byte(&mut self, position: Address, value: Byte) {
        self.data[position as usize] = value;
    }

    /// Writes an array of bytes to the memory, wrapping around at the end
    pub fn write_array(&mut self, position: Address, data: &[Byte]) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(position.wrapping_add(offset as Address), *byte);
        }
    }

    /// Reads a program file into a fresh memory image
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read program `{}`", path.display()))?;

        Self::from_str(&data).wrap_err_with(|| format!("Failed to load `{}`", path.display()))
    }

    /// Logs a hex dump of the memory, 16 bytes per row
    pub fn dump(&self) {
        for (row, chunk) in self.data.chunks(16).enumerate() {
            let bytes = chunk
                .iter()
                .map(|byte| format!("{:02X}", byte))
                .collect::<Vec<_>>()
                .join(" ");
            log::debug!("{:02X}: {}", row * 16, bytes);
        }
    }
}

impl FromStr for Memory {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        parse::Parser::new(s, Memory::default())
            .parse()
            .map_err(|errors| {
                let lines = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n");
                eyre!("{} error(s) while parsing program:\n{}", errors.len(), lines)
            })
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ ) => {
        $mem.write_array($pos, &[
            $(
                $byte as $crate::memory::Byte,
            )+
        ]);
    };
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;

    use super::*;
    use color_eyre::eyre::Result;

    #[test]
    fn test_read_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.data[0x2] = 0x12;
        assert_eq!(mem.read_byte(0x2), 0x12);

        Ok(())
    }

    #[test]
    fn test_write_byte() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_byte(0x44, 12);
        assert_eq!(mem.data[0x44], 12);

        Ok(())
    }

    #[test]
    fn test_write_array() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(0x44, &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(mem.data[0x44], 0x12);
        assert_eq!(mem.data[0x45], 0x34);
        assert_eq!(mem.data[0x46], 0x56);
        assert_eq!(mem.data[0x47], 0x78);

        Ok(())
    }

    #[test]
    fn test_write_array_wraps() -> Result<()> {
        let mut mem = Memory::default();
        mem.write_array(0xFE, &[1, 2, 3]);
        assert_eq!(mem.data[0xFE], 1);
        assert_eq!(mem.data[0xFF], 2);
        assert_eq!(mem.data[0x00], 3);

        Ok(())
    }

    #[test]
    fn test_write_instructions() -> Result<()> {
        let mut mem = Memory::default();

        mem.write_array(
            0x10,
            &[
                Instruction::LDI as Byte,
                0,
                42,
                Instruction::PRN as Byte,
                0,
                Instruction::HLT as Byte,
            ],
        );

        let mut mem2 = Memory::default();
        use crate::processor::Instruction::*;
        write_instructions!(mem2 : 0x10 => LDI, 0, 42, PRN, 0, HLT);

        assert_eq!(mem, mem2);

        Ok(())
    }

    #[test]
    fn test_from_str_reports_errors() {
        let err = Memory::from_str("10000010\n2\n").unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }
}
