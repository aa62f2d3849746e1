//! An LS-8 style virtual CPU: 256 bytes of memory, eight byte registers and a
//! small fixed instruction set.

pub mod machine;
pub mod memory;
pub mod output;
pub mod processor;
