//! Loader for program text. One byte per line, written in binary unless a
//! radix prefix says otherwise. Everything after `#` is a comment.
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::borrow::Cow;
use std::error;
use std::{fmt, str::Lines};

use super::{Address, Byte, Memory, MEMORY_SIZE};

const COMMENT_MARKER: char = '#';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumber { radix: u32 },
    ProgramTooLarge,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNumber { radix } => {
                write!(f, "failed to parse byte with radix `{}`", radix)
            }
            ParseErrorKind::ProgramTooLarge => {
                write!(f, "program does not fit into {} bytes of memory", MEMORY_SIZE)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

/// Splits an optional radix prefix off `token`. Bare digits are binary.
fn split_radix(token: &str) -> (u32, &str) {
    match token.as_bytes() {
        [b'0', b'b', ..] => (2, &token[2..]),
        [b'0', b'o', ..] => (8, &token[2..]),
        [b'0', b'x', ..] => (16, &token[2..]),
        _ => (2, token),
    }
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    position: usize,
    memory: Memory,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data` which will try to populate `memory`
    /// starting at address 0.
    pub fn new(data: &'a str, memory: Memory) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            position: 0,
            memory,
        }
    }

    /// Consumes `self` and tries to parse all lines into memory.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn parse(mut self) -> Result<Memory, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            log::debug!("Loaded {} bytes", self.position);
            Ok(self.memory)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Returns `None` once all lines are
    /// consumed.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        let line = match line.split_once(COMMENT_MARKER) {
            Some((code, _comment)) => code,
            None => line,
        }
        .trim();

        if line.is_empty() {
            // Comment or empty line; skip
            return Some(Ok(()));
        }

        Some(self.parse_byte(line))
    }

    /// Parses `token` as a single byte and writes it to the next free cell.
    ///
    /// # Examples
    ///
    /// - `10000010`
    /// - `0x82`
    fn parse_byte(&mut self, token: &str) -> Result<()> {
        let (radix, digits) = split_radix(token);

        let byte = Byte::from_str_radix(digits, radix).map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber { radix },
                format!("`{}` is not a byte", token),
                self.line_nr,
            )
        })?;

        self.write_byte(byte)
    }

    /// Writes `byte` at the current position and advances it by one.
    ///
    /// # Errors
    ///
    /// Fails once all memory cells are taken.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        if self.position >= MEMORY_SIZE {
            return Err(ParseError::new::<_, &'static str>(
                ParseErrorKind::ProgramTooLarge,
                None,
                self.line_nr,
            ));
        }

        self.memory.write_byte(self.position as Address, byte);
        self.position += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::processor::Instruction;
    use std::str::FromStr;

    use super::*;
    use color_eyre::Result;

    #[test]
    fn parse_print8() -> Result<()> {
        let data = r#"
            # print8.ls8: Print the number 8 on the screen

            10000010 # LDI R0,8
            00000000
            00001000
            01000111 # PRN R0
            00000000
            00000001 # HLT
        "#;

        let mem = Memory::from_str(data)?;

        assert_eq!(mem.read_byte(0), Instruction::LDI.into());
        assert_eq!(mem.read_byte(1), 0);
        assert_eq!(mem.read_byte(2), 8);
        assert_eq!(mem.read_byte(3), Instruction::PRN.into());
        assert_eq!(mem.read_byte(4), 0);
        assert_eq!(mem.read_byte(5), Instruction::HLT.into());
        assert_eq!(mem.read_byte(6), 0);

        Ok(())
    }

    #[test]
    fn parse_radix_prefixes() -> Result<()> {
        let data = "0x82\n0o0\n0o10\n0b01000111\n0\n1\n";

        let mem = Memory::from_str(data)?;

        assert_eq!(&mem.data[..6], &[0x82, 0, 8, 0x47, 0, 1]);

        Ok(())
    }

    #[test]
    fn parse_collects_all_errors() {
        let data = "10000010\n00000002\n\nhello # not a number\n00000001\n";

        let errors = Parser::new(data, Memory::default()).parse().unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidNumber { radix: 2 });
        assert_eq!(errors[0].line_nr(), 2);
        assert_eq!(errors[1].line_nr(), 4);
    }

    #[test]
    fn parse_rejects_value_above_byte() {
        let errors = Parser::new("100000000", Memory::default())
            .parse()
            .unwrap_err();

        assert_eq!(errors[0].kind(), ParseErrorKind::InvalidNumber { radix: 2 });
    }

    #[test]
    fn parse_fills_whole_memory() {
        let full = "00000001\n".repeat(MEMORY_SIZE);
        let mem = Parser::new(&full, Memory::default()).parse().unwrap();
        assert!(mem.data.iter().all(|&byte| byte == 1));

        let too_large = "00000001\n".repeat(MEMORY_SIZE + 1);
        let errors = Parser::new(&too_large, Memory::default())
            .parse()
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ParseErrorKind::ProgramTooLarge);
        assert_eq!(errors[0].line_nr(), MEMORY_SIZE + 1);
    }

    #[test]
    fn error_display_has_line_number() {
        let err = ParseError::new::<_, &'static str>(ParseErrorKind::ProgramTooLarge, None, 7);
        assert_eq!(
            err.to_string(),
            "error [ln: 7]: program does not fit into 256 bytes of memory"
        );
    }
}
