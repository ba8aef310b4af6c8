use crate::jvm::class_file::{Attribute, AttributeBody};
use crate::jvm::code::CodeAttribute;
use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, MethodAccessFlags, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.6
#[derive(Debug)]
pub struct Method {
    pub access_flags: MethodAccessFlags,
    pub name: ConstCell,
    pub descriptor: ConstCell,
    pub attributes: Vec<Attribute>,
}

impl Method {
    /// Body of the `Code` attribute, if the method has one
    pub fn code_mut(&mut self) -> Option<&mut CodeAttribute> {
        self.attributes
            .iter_mut()
            .find_map(|attribute| match &mut attribute.body {
                AttributeBody::Code(code) => Some(code.as_mut()),
                _ => None,
            })
    }
}

impl Record for Method {
    fn length(&self) -> u32 {
        6 + self.attributes.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        let previous = ctx.method.replace(ctx.pool.get_utf8(self.name).unwrap_or_default().to_owned());
        let result = self
            .access_flags
            .serialize(writer)
            .map_err(Error::from)
            .and_then(|_| ctx.write_cell(self.name, writer))
            .and_then(|_| ctx.write_cell(self.descriptor, writer))
            .and_then(|_| self.attributes.write(ctx, writer));
        ctx.method = previous;
        result
    }
}
