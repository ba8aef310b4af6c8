//! Bytecode representation and encoding
//!
//! ### Structure
//!
//! A method body is a [`CodeBody`]: a flat list of [`Instruction`]s interleaved with placed
//! [`Label`]s. Instructions refer to branch targets by label and to constants by cell, so nothing
//! in a body depends on final program counters or pool indices until it is written.
//!
//! ### Encoding
//!
//! Encoding goes in two passes. [`CodeBody::layout`] walks the instructions once to fix every
//! program counter (instruction lengths depend only on the opcode table and, for switches, on
//! alignment, but never on branch targets). The resulting [`CodeLayout`] then lets each
//! instruction be written as a pure function of its program counter and the finalized pool.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-6.html#jvms-6.5

mod code;
mod instruction;
mod label;
mod opcode;
mod switch;

pub use code::*;
pub use instruction::*;
pub use label::*;
pub use opcode::*;
pub use switch::*;
