use crate::jvm::code::Label;
use crate::jvm::constants::{ConstCell, ConstTag};

/// Fatal errors
///
/// Any of these stops the emission of the current class file. Like warnings, they carry no
/// message text: [`Error::id`] and [`Error::args`] are what gets looked up in the message catalog.
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),

    /// Pool would need more than 65535 slots
    ConstantPoolOverflow { slots: usize },

    /// Pool can't take new entries once indices have been handed out
    PoolFinalized,

    /// Cell has no value or no index by the time it is needed
    UnresolvedConstant(ConstCell),

    /// Explicit `#n` reference to a pool slot which doesn't start an entry
    InvalidConstantReference(u16),

    /// Constant has the wrong tag for where it is used
    UnexpectedConstant { expected: ConstTag, found: ConstTag },

    /// `Dynamic` or `InvokeDynamic` constant refers past the end of the bootstrap method table
    UndefinedBootstrapMethod(u16),

    /// String is too long to fit in a `CONSTANT_Utf8_info`
    Utf8TooLong(usize),

    /// Instruction operand refers to a constant which could not be resolved
    UnresolvedOperand { method: String, pc: u32 },

    /// `ldc` operand doesn't fit in the one byte the instruction has for it
    LdcIndexOverflow { method: String, pc: u32, index: i64 },

    /// Operand is missing, or of the wrong kind for the opcode
    MalformedOperand { method: String, pc: u32, opcode: &'static str },

    /// Switch has a different number of keys and targets
    SwitchTargetMismatch { keys: usize, targets: usize },

    /// Byte has no entry in the opcode table
    UnknownOpcode(u8),

    /// Opcode table entry declares a length the encoder can't produce
    MalformedOpcodeLength { opcode: &'static str, length: u8 },

    /// Label was referenced but never placed
    UndefinedLabel(String),

    /// Label was placed twice
    DuplicateLabel(String),

    /// Label used outside of the code it belongs to
    LabelOutsideCode(Label),

    /// Method code was written before it was laid out
    CodeNotLaidOut,

    /// Method code exceeds 65535 bytes
    MethodCodeOverflow(u32),

    /// Number of elements doesn't fit in the count prefix
    CountOverflow { what: &'static str, count: usize },

    /// Mandatory constant reference was never set
    MissingReference(&'static str),
}

impl Error {
    /// Identifier of the message in the diagnostics catalog
    pub fn id(&self) -> &'static str {
        match self {
            Error::IoError(_) => "err.io",
            Error::ConstantPoolOverflow { .. } => "err.cpool.overflow",
            Error::PoolFinalized => "err.cpool.finalized",
            Error::UnresolvedConstant(_) => "err.cpool.unresolved",
            Error::InvalidConstantReference(_) => "err.cpool.invalid.ref",
            Error::UnexpectedConstant { .. } => "err.cpool.unexpected.tag",
            Error::UndefinedBootstrapMethod(_) => "err.bsm.undefined",
            Error::Utf8TooLong(_) => "err.utf8.too.long",
            Error::UnresolvedOperand { .. } => "err.operand.unresolved",
            Error::LdcIndexOverflow { .. } => "err.ldc.index.overflow",
            Error::MalformedOperand { .. } => "err.operand.malformed",
            Error::SwitchTargetMismatch { .. } => "err.switch.targets",
            Error::UnknownOpcode(_) => "err.opcode.unknown",
            Error::MalformedOpcodeLength { .. } => "err.opcode.length",
            Error::UndefinedLabel(_) => "err.label.undefined",
            Error::DuplicateLabel(_) => "err.label.duplicate",
            Error::LabelOutsideCode(_) => "err.label.outside.code",
            Error::CodeNotLaidOut => "err.code.layout",
            Error::MethodCodeOverflow(_) => "err.code.overflow",
            Error::CountOverflow { .. } => "err.count.overflow",
            Error::MissingReference(_) => "err.cpool.missing.ref",
        }
    }

    /// Attach the name of the method being assembled to errors that mention one
    pub fn in_method(self, name: &str) -> Error {
        match self {
            Error::UnresolvedOperand { method, pc } if method.is_empty() => {
                Error::UnresolvedOperand { method: name.to_owned(), pc }
            }
            Error::LdcIndexOverflow { method, pc, index } if method.is_empty() => {
                Error::LdcIndexOverflow { method: name.to_owned(), pc, index }
            }
            Error::MalformedOperand { method, pc, opcode } if method.is_empty() => {
                Error::MalformedOperand { method: name.to_owned(), pc, opcode }
            }
            other => other,
        }
    }

    /// Positional arguments for the diagnostics catalog
    pub fn args(&self) -> Vec<String> {
        match self {
            Error::IoError(err) => vec![err.to_string()],
            Error::ConstantPoolOverflow { slots } => vec![slots.to_string()],
            Error::PoolFinalized | Error::CodeNotLaidOut => vec![],
            Error::UnresolvedConstant(cell) => vec![format!("{:?}", cell)],
            Error::InvalidConstantReference(index) => vec![index.to_string()],
            Error::UnexpectedConstant { expected, found } => {
                vec![format!("{:?}", expected), format!("{:?}", found)]
            }
            Error::UndefinedBootstrapMethod(index) => vec![index.to_string()],
            Error::Utf8TooLong(len) => vec![len.to_string()],
            Error::UnresolvedOperand { method, pc } => vec![method.clone(), pc.to_string()],
            Error::LdcIndexOverflow { method, pc, index } => {
                vec![method.clone(), pc.to_string(), index.to_string()]
            }
            Error::MalformedOperand { method, pc, opcode } => {
                vec![method.clone(), pc.to_string(), opcode.to_string()]
            }
            Error::SwitchTargetMismatch { keys, targets } => {
                vec![keys.to_string(), targets.to_string()]
            }
            Error::UnknownOpcode(byte) => vec![format!("{:#04x}", byte)],
            Error::MalformedOpcodeLength { opcode, length } => {
                vec![opcode.to_string(), length.to_string()]
            }
            Error::UndefinedLabel(name) | Error::DuplicateLabel(name) => vec![name.clone()],
            Error::LabelOutsideCode(label) => vec![format!("{:?}", label)],
            Error::MethodCodeOverflow(len) => vec![len.to_string()],
            Error::CountOverflow { what, count } => vec![what.to_string(), count.to_string()],
            Error::MissingReference(what) => vec![what.to_string()],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
