use crate::jvm::class_file::{
    Annotation, BootstrapMethod, ElementValue, ModuleAttribute, ParameterAnnotations,
    RecordComponent,
};
use crate::jvm::code::{CodeAttribute, Label};
use crate::jvm::constants::{ConstCell, ConstPool};
use crate::jvm::{
    Error, InnerClassAccessFlags, ParameterAccessFlags, Record, Serialize, WriteContext,
};
use byteorder::WriteBytesExt;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Every attribute is written as its name, the length of what follows, and then the body. The
/// length is computed from the shape of the body alone, so it is known before any cell in the
/// body is resolved.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name: ConstCell,
    pub body: AttributeBody,
}

impl Attribute {
    /// Make an attribute, interning its name
    pub fn new(pool: &mut ConstPool, body: AttributeBody) -> Result<Attribute, Error> {
        let name = pool.utf8(body.name())?;
        Ok(Attribute { name, body })
    }

    /// Attribute the assembler knows nothing about, copied verbatim
    pub fn raw(pool: &mut ConstPool, name: &str, bytes: Vec<u8>) -> Result<Attribute, Error> {
        let name = pool.utf8(name)?;
        Ok(Attribute {
            name,
            body: AttributeBody::Raw(bytes),
        })
    }

    /// Length of the attribute, not counting the 6 byte header
    pub fn info_length(&self) -> u32 {
        self.body.length()
    }
}

impl Record for Attribute {
    fn length(&self) -> u32 {
        6 + self.info_length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.name, writer)?;
        self.info_length().serialize(writer)?;
        self.body.write(ctx, writer)
    }
}

/// Body of an attribute
#[derive(Debug)]
pub enum AttributeBody {
    ConstantValue(ConstCell),
    Code(Box<CodeAttribute>),
    Exceptions(IndexArray),
    Signature(ConstCell),
    SourceFile(ConstCell),
    SourceDebugExtension(Vec<u8>),
    Deprecated,
    Synthetic,
    InnerClasses(VectorAttribute<InnerClass>),
    EnclosingMethod {
        class: ConstCell,

        /// `NameAndType` of the enclosing method, if any
        method: Option<ConstCell>,
    },
    NestHost(ConstCell),
    NestMembers(IndexArray),
    PermittedSubclasses(IndexArray),
    LoadableDescriptors(IndexArray),
    LineNumberTable(VectorAttribute<LineNumber>),
    LocalVariableTable(VectorAttribute<LocalVariable>),
    LocalVariableTypeTable(VectorAttribute<LocalVariable>),
    MethodParameters(VectorAttribute<MethodParameter>),
    RuntimeVisibleAnnotations(VectorAttribute<Annotation>),
    RuntimeInvisibleAnnotations(VectorAttribute<Annotation>),
    RuntimeVisibleParameterAnnotations(VectorAttribute<ParameterAnnotations>),
    RuntimeInvisibleParameterAnnotations(VectorAttribute<ParameterAnnotations>),
    AnnotationDefault(ElementValue),
    Module(Box<ModuleAttribute>),
    ModulePackages(IndexArray),
    ModuleMainClass(ConstCell),
    Record(VectorAttribute<RecordComponent>),
    BootstrapMethods(VectorAttribute<BootstrapMethod>),

    /// Verbatim contents of an attribute with a name of its own
    Raw(Vec<u8>),
}

impl AttributeBody {
    /// Name of the attribute (empty for raw attributes, whose name is given separately)
    pub fn name(&self) -> &'static str {
        match self {
            AttributeBody::ConstantValue(_) => "ConstantValue",
            AttributeBody::Code(_) => "Code",
            AttributeBody::Exceptions(_) => "Exceptions",
            AttributeBody::Signature(_) => "Signature",
            AttributeBody::SourceFile(_) => "SourceFile",
            AttributeBody::SourceDebugExtension(_) => "SourceDebugExtension",
            AttributeBody::Deprecated => "Deprecated",
            AttributeBody::Synthetic => "Synthetic",
            AttributeBody::InnerClasses(_) => "InnerClasses",
            AttributeBody::EnclosingMethod { .. } => "EnclosingMethod",
            AttributeBody::NestHost(_) => "NestHost",
            AttributeBody::NestMembers(_) => "NestMembers",
            AttributeBody::PermittedSubclasses(_) => "PermittedSubclasses",
            AttributeBody::LoadableDescriptors(_) => "LoadableDescriptors",
            AttributeBody::LineNumberTable(_) => "LineNumberTable",
            AttributeBody::LocalVariableTable(_) => "LocalVariableTable",
            AttributeBody::LocalVariableTypeTable(_) => "LocalVariableTypeTable",
            AttributeBody::MethodParameters(_) => "MethodParameters",
            AttributeBody::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            AttributeBody::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            AttributeBody::RuntimeVisibleParameterAnnotations(_) => {
                "RuntimeVisibleParameterAnnotations"
            }
            AttributeBody::RuntimeInvisibleParameterAnnotations(_) => {
                "RuntimeInvisibleParameterAnnotations"
            }
            AttributeBody::AnnotationDefault(_) => "AnnotationDefault",
            AttributeBody::Module(_) => "Module",
            AttributeBody::ModulePackages(_) => "ModulePackages",
            AttributeBody::ModuleMainClass(_) => "ModuleMainClass",
            AttributeBody::Record(_) => "Record",
            AttributeBody::BootstrapMethods(_) => "BootstrapMethods",
            AttributeBody::Raw(_) => "",
        }
    }

    /// Width of the leading count, for attributes that are a vector of records
    pub fn count_width(&self) -> CountWidth {
        match self {
            AttributeBody::MethodParameters(_)
            | AttributeBody::RuntimeVisibleParameterAnnotations(_)
            | AttributeBody::RuntimeInvisibleParameterAnnotations(_) => CountWidth::U8,
            _ => CountWidth::U16,
        }
    }
}

impl Record for AttributeBody {
    fn length(&self) -> u32 {
        let width = self.count_width();
        match self {
            AttributeBody::ConstantValue(_)
            | AttributeBody::Signature(_)
            | AttributeBody::SourceFile(_)
            | AttributeBody::NestHost(_)
            | AttributeBody::ModuleMainClass(_) => 2,
            AttributeBody::Code(code) => code.length(),
            AttributeBody::SourceDebugExtension(bytes) | AttributeBody::Raw(bytes) => {
                bytes.len() as u32
            }
            AttributeBody::Deprecated | AttributeBody::Synthetic => 0,
            AttributeBody::EnclosingMethod { .. } => 4,
            AttributeBody::Exceptions(cells)
            | AttributeBody::NestMembers(cells)
            | AttributeBody::PermittedSubclasses(cells)
            | AttributeBody::LoadableDescriptors(cells)
            | AttributeBody::ModulePackages(cells) => cells.length(),
            AttributeBody::InnerClasses(classes) => classes.length(width),
            AttributeBody::LineNumberTable(lines) => lines.length(width),
            AttributeBody::LocalVariableTable(locals)
            | AttributeBody::LocalVariableTypeTable(locals) => locals.length(width),
            AttributeBody::MethodParameters(parameters) => parameters.length(width),
            AttributeBody::RuntimeVisibleAnnotations(annotations)
            | AttributeBody::RuntimeInvisibleAnnotations(annotations) => annotations.length(width),
            AttributeBody::RuntimeVisibleParameterAnnotations(parameters)
            | AttributeBody::RuntimeInvisibleParameterAnnotations(parameters) => parameters.length(width),
            AttributeBody::AnnotationDefault(value) => value.length(),
            AttributeBody::Module(module) => module.length(),
            AttributeBody::Record(components) => components.length(width),
            AttributeBody::BootstrapMethods(methods) => methods.length(width),
        }
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        let width = self.count_width();
        match self {
            AttributeBody::ConstantValue(cell)
            | AttributeBody::Signature(cell)
            | AttributeBody::SourceFile(cell)
            | AttributeBody::NestHost(cell)
            | AttributeBody::ModuleMainClass(cell) => ctx.write_cell(*cell, writer),
            AttributeBody::Code(code) => code.write(ctx, writer),
            AttributeBody::SourceDebugExtension(bytes) | AttributeBody::Raw(bytes) => {
                Ok(writer.write_all(bytes)?)
            }
            AttributeBody::Deprecated | AttributeBody::Synthetic => Ok(()),
            AttributeBody::EnclosingMethod { class, method } => {
                ctx.write_cell(*class, writer)?;
                ctx.write_optional_cell(*method, writer)
            }
            AttributeBody::Exceptions(cells)
            | AttributeBody::NestMembers(cells)
            | AttributeBody::PermittedSubclasses(cells)
            | AttributeBody::LoadableDescriptors(cells)
            | AttributeBody::ModulePackages(cells) => cells.write(ctx, writer),
            AttributeBody::InnerClasses(classes) => classes.write(width, ctx, writer),
            AttributeBody::LineNumberTable(lines) => lines.write(width, ctx, writer),
            AttributeBody::LocalVariableTable(locals)
            | AttributeBody::LocalVariableTypeTable(locals) => locals.write(width, ctx, writer),
            AttributeBody::MethodParameters(parameters) => parameters.write(width, ctx, writer),
            AttributeBody::RuntimeVisibleAnnotations(annotations)
            | AttributeBody::RuntimeInvisibleAnnotations(annotations) => {
                annotations.write(width, ctx, writer)
            }
            AttributeBody::RuntimeVisibleParameterAnnotations(parameters)
            | AttributeBody::RuntimeInvisibleParameterAnnotations(parameters) => {
                parameters.write(width, ctx, writer)
            }
            AttributeBody::AnnotationDefault(value) => value.write(ctx, writer),
            AttributeBody::Module(module) => module.write(ctx, writer),
            AttributeBody::Record(components) => components.write(width, ctx, writer),
            AttributeBody::BootstrapMethods(methods) => methods.write(width, ctx, writer),
        }
    }
}

/// Width of the element count in front of a vector attribute
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CountWidth {
    U8,
    U16,
}

impl CountWidth {
    pub fn bytes(self) -> u32 {
        match self {
            CountWidth::U8 => 1,
            CountWidth::U16 => 2,
        }
    }

    fn max(self) -> usize {
        match self {
            CountWidth::U8 => u8::MAX as usize,
            CountWidth::U16 => u16::MAX as usize,
        }
    }
}

/// Records prefixed by how many of them there are
///
/// The width of the count is fixed by the attribute the vector appears in (see
/// [`AttributeBody::count_width`]), not by the vector itself.
#[derive(Debug, Default)]
pub struct VectorAttribute<T> {
    pub items: Vec<T>,
}

impl<T> VectorAttribute<T> {
    pub fn new(items: Vec<T>) -> VectorAttribute<T> {
        VectorAttribute { items }
    }
}

impl<T: Record> VectorAttribute<T> {
    fn length(&self, count_width: CountWidth) -> u32 {
        count_width.bytes() + self.items.iter().map(Record::length).sum::<u32>()
    }

    fn write<W: WriteBytesExt>(
        &self,
        count_width: CountWidth,
        ctx: &mut WriteContext<'_>,
        writer: &mut W,
    ) -> Result<(), Error> {
        let count = self.items.len();
        if count > count_width.max() {
            return Err(Error::CountOverflow {
                what: "attribute entries",
                count,
            });
        }
        match count_width {
            CountWidth::U8 => (count as u8).serialize(writer)?,
            CountWidth::U16 => (count as u16).serialize(writer)?,
        }
        for item in &self.items {
            item.write(ctx, writer)?;
        }
        Ok(())
    }
}

/// Flat list of constants, prefixed by a `u16` count
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexArray(pub Vec<ConstCell>);

impl Record for IndexArray {
    fn length(&self) -> u32 {
        2 + 2 * self.0.len() as u32
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        let count = u16::try_from(self.0.len()).map_err(|_| Error::CountOverflow {
            what: "constant references",
            count: self.0.len(),
        })?;
        count.serialize(writer)?;
        for cell in &self.0 {
            ctx.write_cell(*cell, writer)?;
        }
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.6
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class: ConstCell,
    pub outer_class: Option<ConstCell>,
    pub inner_name: Option<ConstCell>,
    pub access_flags: InnerClassAccessFlags,
}

impl Record for InnerClass {
    fn length(&self) -> u32 {
        8
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.inner_class, writer)?;
        ctx.write_optional_cell(self.outer_class, writer)?;
        ctx.write_optional_cell(self.inner_name, writer)?;
        self.access_flags.serialize(writer)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.12
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineNumber {
    pub start: Label,
    pub line_number: u16,
}

impl Record for LineNumber {
    fn length(&self) -> u32 {
        4
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_label(self.start, writer)?;
        self.line_number.serialize(writer)?;
        Ok(())
    }
}

/// Entry of the `LocalVariableTable` (where the descriptor is a field descriptor) or of the
/// `LocalVariableTypeTable` (where it is a field signature)
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.13
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVariable {
    pub start: Label,

    /// Exclusive end of the range where the variable has a value
    pub end: Label,

    pub name: ConstCell,
    pub descriptor: ConstCell,
    pub index: u16,
}

impl Record for LocalVariable {
    fn length(&self) -> u32 {
        10
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        let start = ctx.label_pc(self.start)?;
        let end = ctx.label_pc(self.end)?;
        (start as u16).serialize(writer)?;
        (end.saturating_sub(start) as u16).serialize(writer)?;
        ctx.write_cell(self.name, writer)?;
        ctx.write_cell(self.descriptor, writer)?;
        self.index.serialize(writer)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.24
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodParameter {
    /// Name of the parameter (`None` for a formal parameter with no name)
    pub name: Option<ConstCell>,
    pub access_flags: ParameterAccessFlags,
}

impl Record for MethodParameter {
    fn length(&self) -> u32 {
        4
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_optional_cell(self.name, writer)?;
        self.access_flags.serialize(writer)?;
        Ok(())
    }
}
