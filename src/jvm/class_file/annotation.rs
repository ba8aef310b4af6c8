use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.16
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    /// Field descriptor of the annotation interface
    pub type_name: ConstCell,
    pub elements: Vec<ElementPair>,
}

impl Record for Annotation {
    fn length(&self) -> u32 {
        2 + self.elements.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.type_name, writer)?;
        self.elements.write(ctx, writer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementPair {
    pub name: ConstCell,
    pub value: ElementValue,
}

impl Record for ElementPair {
    fn length(&self) -> u32 {
        2 + self.value.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.name, writer)?;
        self.value.write(ctx, writer)
    }
}

/// Type of a constant element value
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstElement {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    String,
}

impl ConstElement {
    pub fn tag(self) -> u8 {
        match self {
            ConstElement::Byte => b'B',
            ConstElement::Char => b'C',
            ConstElement::Double => b'D',
            ConstElement::Float => b'F',
            ConstElement::Int => b'I',
            ConstElement::Long => b'J',
            ConstElement::Short => b'S',
            ConstElement::Boolean => b'Z',
            ConstElement::String => b's',
        }
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.16.1
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementValue {
    Const(ConstElement, ConstCell),
    Enum {
        type_name: ConstCell,
        const_name: ConstCell,
    },
    Class(ConstCell),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub fn tag(&self) -> u8 {
        match self {
            ElementValue::Const(element, _) => element.tag(),
            ElementValue::Enum { .. } => b'e',
            ElementValue::Class(_) => b'c',
            ElementValue::Annotation(_) => b'@',
            ElementValue::Array(_) => b'[',
        }
    }
}

impl Record for ElementValue {
    fn length(&self) -> u32 {
        1 + match self {
            ElementValue::Const(_, _) | ElementValue::Class(_) => 2,
            ElementValue::Enum { .. } => 4,
            ElementValue::Annotation(annotation) => annotation.length(),
            ElementValue::Array(values) => values.length(),
        }
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        self.tag().serialize(writer)?;
        match self {
            ElementValue::Const(_, cell) | ElementValue::Class(cell) => ctx.write_cell(*cell, writer),
            ElementValue::Enum {
                type_name,
                const_name,
            } => {
                ctx.write_cell(*type_name, writer)?;
                ctx.write_cell(*const_name, writer)
            }
            ElementValue::Annotation(annotation) => annotation.write(ctx, writer),
            ElementValue::Array(values) => values.write(ctx, writer),
        }
    }
}

/// Annotations of a single parameter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterAnnotations(pub Vec<Annotation>);

impl Record for ParameterAnnotations {
    fn length(&self) -> u32 {
        self.0.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        self.0.write(ctx, writer)
    }
}
