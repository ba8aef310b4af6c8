use crate::jvm::class_file::IndexArray;
use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, ModuleFlags, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// Body of the `Module` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.25
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleAttribute {
    pub name: ConstCell,
    pub flags: ModuleFlags,
    pub version: Option<ConstCell>,
    pub requires: Vec<Requires>,
    pub exports: Vec<Exports>,
    pub opens: Vec<Exports>,

    /// Service interfaces used by the module
    pub uses: IndexArray,

    pub provides: Vec<Provides>,
}

impl ModuleAttribute {
    pub fn new(name: ConstCell, flags: ModuleFlags) -> ModuleAttribute {
        ModuleAttribute {
            name,
            flags,
            version: None,
            requires: vec![],
            exports: vec![],
            opens: vec![],
            uses: IndexArray::default(),
            provides: vec![],
        }
    }
}

impl Record for ModuleAttribute {
    fn length(&self) -> u32 {
        6 + self.requires.length()
            + self.exports.length()
            + self.opens.length()
            + self.uses.length()
            + self.provides.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.name, writer)?;
        self.flags.serialize(writer)?;
        ctx.write_optional_cell(self.version, writer)?;
        self.requires.write(ctx, writer)?;
        self.exports.write(ctx, writer)?;
        self.opens.write(ctx, writer)?;
        self.uses.write(ctx, writer)?;
        self.provides.write(ctx, writer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requires {
    pub module: ConstCell,
    pub flags: ModuleFlags,
    pub version: Option<ConstCell>,
}

impl Record for Requires {
    fn length(&self) -> u32 {
        6
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.module, writer)?;
        self.flags.serialize(writer)?;
        ctx.write_optional_cell(self.version, writer)
    }
}

/// Entry of either the `exports` or the `opens` table (they have the same shape)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exports {
    pub package: ConstCell,
    pub flags: ModuleFlags,

    /// Modules the package is restricted to (unrestricted if empty)
    pub to: IndexArray,
}

impl Record for Exports {
    fn length(&self) -> u32 {
        4 + self.to.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.package, writer)?;
        self.flags.serialize(writer)?;
        self.to.write(ctx, writer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provides {
    pub service: ConstCell,
    pub with: IndexArray,
}

impl Record for Provides {
    fn length(&self) -> u32 {
        2 + self.with.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.service, writer)?;
        self.with.write(ctx, writer)
    }
}
