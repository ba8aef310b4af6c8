//! Back end of a JVM bytecode assembler
//!
//! The front end (scanner and parser) produces a [`jvm::class_file::ClassModel`]: a constant pool
//! full of possibly forward-referenced cells, fields, methods with their instruction streams, and
//! attribute payloads. This crate resolves all of those references and emits a byte-exact class
//! file.
//!
//! Assembly happens in two passes:
//!
//!   1. every method body is laid out (program counters assigned, labels bound, switch padding
//!      computed) and the constant pool is finalized (indices assigned, forward references bound)
//!   2. the class file is written out, resolving every cell to its final index
//!
//! ```
//! use jasm::jvm::class_file::{Attribute, AttributeBody, ClassModel, Method, Version};
//! use jasm::jvm::code::{CodeAttribute, CodeBody, Instruction, Opcode};
//! use jasm::jvm::constants::ConstValue;
//! use jasm::jvm::{ClassAccessFlags, Diagnostics, MethodAccessFlags};
//!
//! # fn assemble() -> Result<(), jasm::jvm::Error> {
//! let mut class = ClassModel::new(Version::JAVA8, ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER);
//! class.this_class = class.pool.class("me/alec/Empty")?;
//! class.super_class = Some(class.pool.class("java/lang/Object")?);
//!
//! let mut body = CodeBody::new();
//! body.push(Instruction::simple(Opcode::RETURN));
//! let code = CodeAttribute::new(0, 1, body);
//!
//! let name = class.pool.utf8("run")?;
//! let descriptor = class.pool.utf8("()V")?;
//! let code = Attribute::new(&mut class.pool, AttributeBody::Code(Box::new(code)))?;
//! class.methods.push(Method {
//!     access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
//!     name,
//!     descriptor,
//!     attributes: vec![code],
//! });
//!
//! let mut diagnostics = Diagnostics::new();
//! let mut bytes: Vec<u8> = vec![];
//! class.assemble(&mut diagnostics, &mut bytes)?;
//! assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
//! # Ok(())
//! # }
//! # assemble().unwrap();
//! ```

pub mod driver;
pub mod jvm;
pub mod util;
