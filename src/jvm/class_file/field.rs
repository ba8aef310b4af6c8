use crate::jvm::class_file::Attribute;
use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, FieldAccessFlags, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.5
#[derive(Debug)]
pub struct Field {
    pub access_flags: FieldAccessFlags,
    pub name: ConstCell,
    pub descriptor: ConstCell,
    pub attributes: Vec<Attribute>,
}

impl Record for Field {
    fn length(&self) -> u32 {
        6 + self.attributes.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        self.access_flags.serialize(writer)?;
        ctx.write_cell(self.name, writer)?;
        ctx.write_cell(self.descriptor, writer)?;
        self.attributes.write(ctx, writer)
    }
}
