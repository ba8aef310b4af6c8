use crate::jvm::class_file::Attribute;
use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, Record, WriteContext};
use byteorder::WriteBytesExt;

/// Component of a record class
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.30
#[derive(Debug)]
pub struct RecordComponent {
    pub name: ConstCell,
    pub descriptor: ConstCell,

    /// Attributes of the component (signature, annotations)
    pub attributes: Vec<Attribute>,
}

impl Record for RecordComponent {
    fn length(&self) -> u32 {
        4 + self.attributes.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.name, writer)?;
        ctx.write_cell(self.descriptor, writer)?;
        self.attributes.write(ctx, writer)
    }
}
