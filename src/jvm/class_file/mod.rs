//! Class file structures
//!
//! These mirror the [`class` file format of the JVM][0] closely, except that every reference into
//! the constant pool is a [`ConstCell`](crate::jvm::constants::ConstCell) and every reference into
//! a method's code is a [`Label`](crate::jvm::code::Label). Everything here implements
//! [`Record`](crate::jvm::Record), so that lengths can be computed before cells get resolved.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html

mod annotation;
mod attribute;
mod bootstrap;
mod class;
mod field;
mod method;
mod module;
mod record;
mod version;

pub use annotation::*;
pub use attribute::*;
pub use bootstrap::*;
pub use class::*;
pub use field::*;
pub use method::*;
pub use module::*;
pub use record::*;
pub use version::*;
