use crate::jvm::constants::ConstCell;
use crate::jvm::{Error, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// Entry of the `BootstrapMethods` attribute
///
/// These are owned by the constant pool (see [`ConstPool::bootstrap`]), since `Dynamic` and
/// `InvokeDynamic` constants refer to them by their position in the table.
///
/// [`ConstPool::bootstrap`]: crate::jvm::constants::ConstPool::bootstrap
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.23
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BootstrapMethod {
    /// `MethodHandle` constant
    pub handle: ConstCell,

    /// Loadable constants passed as static arguments
    pub arguments: Vec<ConstCell>,
}

impl Record for BootstrapMethod {
    fn length(&self) -> u32 {
        4 + 2 * self.arguments.len() as u32
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_cell(self.handle, writer)?;
        let count = u16::try_from(self.arguments.len()).map_err(|_| Error::CountOverflow {
            what: "bootstrap arguments",
            count: self.arguments.len(),
        })?;
        count.serialize(writer)?;
        for argument in &self.arguments {
            ctx.write_cell(*argument, writer)?;
        }
        Ok(())
    }
}
