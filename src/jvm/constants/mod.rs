//! Constant pool entries and the pool itself
//!
//! Entries refer to each other through [`ConstCell`] handles into the pool's arena, so the same
//! logical constant can be shared by every instruction and attribute that mentions it while its
//! final index is still unknown.

mod pool;

pub use pool::*;

use crate::util::Width;

/// Constants as in the constant pool
///
/// Each variant matches one constant pool tag, with nested constants referenced by cell. The
/// derived equality is _structural_: two values are equal when their tags match and their nested
/// cells are the very same cells. See [`ConstPool::value_eq`] for equality by value.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConstValue {
    /// Reserved entry at index 0 (used for "no class", "no name", etc.)
    Zero,

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the null character
    /// `\u{0000}` and the encoding of supplementary characters is different).
    Utf8(String),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float` (raw IEEE 754 bits, so that every NaN is kept distinct)
    Float(u32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double` (raw IEEE 754 bits)
    Double(u64),

    /// Class or an interface (name is a `Utf8`)
    Class(ConstCell),

    /// Constant object of type `java.lang.String` (contents is a `Utf8`)
    String(ConstCell),

    /// Field (class and `NameAndType`)
    FieldRef(ConstCell, ConstCell),

    /// Method on a class (class and `NameAndType`)
    MethodRef(ConstCell, ConstCell),

    /// Method on an interface (class and `NameAndType`)
    InterfaceMethodRef(ConstCell, ConstCell),

    /// Name and a descriptor (both `Utf8`)
    NameAndType(ConstCell, ConstCell),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    ///
    /// Depending on the kind, the member is a `FieldRef`, `MethodRef`, or `InterfaceMethodRef`.
    MethodHandle(HandleKind, ConstCell),

    /// Method type (descriptor is a `Utf8`)
    MethodType(ConstCell),

    /// Dynamically-computed constant
    Dynamic(BootstrapIndex, ConstCell),

    /// Dynamically-computed call site
    InvokeDynamic(BootstrapIndex, ConstCell),

    /// Module (name is a `Utf8`)
    Module(ConstCell),

    /// Package (name is a `Utf8`)
    Package(ConstCell),
}

impl ConstValue {
    pub fn float(float: f32) -> ConstValue {
        ConstValue::Float(float.to_bits())
    }

    pub fn double(double: f64) -> ConstValue {
        ConstValue::Double(double.to_bits())
    }

    pub fn tag(&self) -> ConstTag {
        match self {
            ConstValue::Zero => ConstTag::Zero,
            ConstValue::Utf8(_) => ConstTag::Utf8,
            ConstValue::Integer(_) => ConstTag::Integer,
            ConstValue::Float(_) => ConstTag::Float,
            ConstValue::Long(_) => ConstTag::Long,
            ConstValue::Double(_) => ConstTag::Double,
            ConstValue::Class(_) => ConstTag::Class,
            ConstValue::String(_) => ConstTag::String,
            ConstValue::FieldRef(_, _) => ConstTag::FieldRef,
            ConstValue::MethodRef(_, _) => ConstTag::MethodRef,
            ConstValue::InterfaceMethodRef(_, _) => ConstTag::InterfaceMethodRef,
            ConstValue::NameAndType(_, _) => ConstTag::NameAndType,
            ConstValue::MethodHandle(_, _) => ConstTag::MethodHandle,
            ConstValue::MethodType(_) => ConstTag::MethodType,
            ConstValue::Dynamic(_, _) => ConstTag::Dynamic,
            ConstValue::InvokeDynamic(_, _) => ConstTag::InvokeDynamic,
            ConstValue::Module(_) => ConstTag::Module,
            ConstValue::Package(_) => ConstTag::Package,
        }
    }

    /// Nested cells, in the order they are serialized
    pub fn references(&self) -> impl Iterator<Item = ConstCell> {
        let (first, second) = match self {
            ConstValue::Zero
            | ConstValue::Utf8(_)
            | ConstValue::Integer(_)
            | ConstValue::Float(_)
            | ConstValue::Long(_)
            | ConstValue::Double(_) => (None, None),
            ConstValue::Class(cell)
            | ConstValue::String(cell)
            | ConstValue::MethodHandle(_, cell)
            | ConstValue::MethodType(cell)
            | ConstValue::Dynamic(_, cell)
            | ConstValue::InvokeDynamic(_, cell)
            | ConstValue::Module(cell)
            | ConstValue::Package(cell) => (Some(*cell), None),
            ConstValue::FieldRef(a, b)
            | ConstValue::MethodRef(a, b)
            | ConstValue::InterfaceMethodRef(a, b)
            | ConstValue::NameAndType(a, b) => (Some(*a), Some(*b)),
        };
        [first, second].into_iter().flatten()
    }
}

/// Almost all constants have width 1, except for `Long` and `Double`. From JVMS §4.4.5:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for ConstValue {
    fn width(&self) -> usize {
        match self {
            ConstValue::Long(_) | ConstValue::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Constant pool tags
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConstTag {
    Zero = 0,
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

impl ConstTag {
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Build the constant of this tag that wraps a single `Utf8` name
    ///
    /// Only some tags are just a named wrapper (eg. a class is just its binary name). These are the
    /// tags for which a forward reference by name can be synthesized into a real entry.
    pub fn wrap(self, name: ConstCell) -> Option<ConstValue> {
        match self {
            ConstTag::Class => Some(ConstValue::Class(name)),
            ConstTag::String => Some(ConstValue::String(name)),
            ConstTag::MethodType => Some(ConstValue::MethodType(name)),
            ConstTag::Module => Some(ConstValue::Module(name)),
            ConstTag::Package => Some(ConstValue::Package(name)),
            _ => None,
        }
    }
}

/// Index into the bootstrap method table (the `BootstrapMethods` attribute)
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Ord, PartialOrd)]
pub struct BootstrapIndex(pub u16);

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    pub fn byte(self) -> u8 {
        match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        }
    }

    pub fn from_byte(byte: u8) -> Option<HandleKind> {
        Some(match byte {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        })
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for c in string.chars() {
        let code: u32 = c as u32;
        match code {
            0x0001..=0x007F => buffer.push(code as u8),
            0x0000 | 0x0080..=0x07FF => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            0x0800..=0xFFFF => push_three_bytes(&mut buffer, code),

            // Supplementary characters go through a UTF-16 surrogate pair, each half of which is
            // then encoded in three bytes
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    push_three_bytes(&mut buffer, *unit as u32);
                }
            }
        }
    }
    buffer
}

fn push_three_bytes(buffer: &mut Vec<u8>, code: u32) {
    buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
    buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
    buffer.push((code & 0x3F) as u8 | 0b1000_0000);
}

#[cfg(test)]
mod encode_modified_utf8_tests {
    use super::*;

    #[test]
    fn containing_null_byte() {
        assert_eq!(encode_modified_utf8("a\x00a"), vec![97, 192, 128, 97]);
    }

    #[test]
    fn simple_ascii() {
        assert_eq!(encode_modified_utf8("foo"), vec![102, 111, 111]);
    }

    #[test]
    fn two_and_three_byte_encodings() {
        assert_eq!(encode_modified_utf8("ĄǍ"), vec![196, 132, 199, 141]);
        assert_eq!(encode_modified_utf8("ऄअ"), vec![224, 164, 132, 224, 164, 133]);
    }

    #[test]
    fn supplementary_characters() {
        assert_eq!(
            encode_modified_utf8("\u{10000}\u{10FFFF}"),
            vec![237, 160, 128, 237, 176, 128, 237, 175, 191, 237, 191, 191]
        );
    }
}
