//! Assemble JVM classes
//!
//! ### Structure
//!
//! A class arrives here already parsed, but with a lot of its references still symbolic:
//!
//!   - operands refer to constants through [`constants::ConstCell`] handles whose pool index is
//!     only assigned once the whole pool is known (and some of which are forward references to
//!     constants that don't exist yet)
//!   - branches refer to [`code::Label`]s whose program counter is only known once every
//!     preceding instruction in the method has a fixed size
//!   - `invokedynamic` and `ldc` of dynamic constants refer to bootstrap methods by their index in
//!     a table that is only written out at the very end
//!
//! [`class_file::ClassModel::assemble`] resolves all of these in two explicit passes and then
//! writes out the class file.

mod access_flags;
mod binary_format;
pub mod class_file;
pub mod code;
pub mod constants;
mod descriptors;
mod diagnostics;
mod errors;

pub use access_flags::*;
pub use binary_format::*;
pub use descriptors::*;
pub use diagnostics::*;
pub use errors::*;
