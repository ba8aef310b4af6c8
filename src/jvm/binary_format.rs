use crate::jvm::code::{CodeLayout, Label};
use crate::jvm::constants::{ConstCell, ConstPool};
use crate::jvm::{Diagnostic, Error, Position, Reporter};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Result;
use std::rc::Rc;

/// Utility trait for serializing data inside class files
///
/// Java class files have some peculiarities that make it useful to define an extra trait (instead
/// of just using `serde`):
///
///   - tags are always `u8`
///   - everything is big-endian
///   - when serializing a sequence, the length of the sequence is usually `u16`
///
pub trait Serialize: Sized {
    /// Serialize construct into a binary output stream
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()>;
}

impl Serialize for u8 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self)
    }
}

impl Serialize for u16 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<BigEndian>(*self)
    }
}

impl Serialize for u32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<BigEndian>(*self)
    }
}

impl Serialize for u64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<BigEndian>(*self)
    }
}

impl Serialize for i32 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<BigEndian>(*self)
    }
}

impl Serialize for i64 {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        writer.write_i64::<BigEndian>(*self)
    }
}

/// Binary record inside a class file whose constant pool references are resolved while writing
///
/// The contract is split in two: [`Record::length`] only looks at the shape of the
/// record and never fails, while [`Record::write`] resolves cells and may fail. Lengths are needed
/// before any byte of the enclosing record is emitted (since that record is itself length
/// prefixed), but cells are only guaranteed to be resolved by the time writing starts.
pub trait Record {
    /// Exact number of bytes that [`Record::write`] emits
    fn length(&self) -> u32;

    /// Write the record, resolving any cells through the context
    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W)
        -> std::result::Result<(), Error>;
}

impl<R: Record> Record for Vec<R> {
    /// Size in `u16` is the first thing serialized
    fn length(&self) -> u32 {
        2 + self.iter().map(Record::length).sum::<u32>()
    }

    fn write<W: WriteBytesExt>(
        &self,
        ctx: &mut WriteContext<'_>,
        writer: &mut W,
    ) -> std::result::Result<(), Error> {
        let count = u16::try_from(self.len()).map_err(|_| Error::CountOverflow {
            what: "records",
            count: self.len(),
        })?;
        count.serialize(writer)?;
        for record in self {
            record.write(ctx, writer)?;
        }
        Ok(())
    }
}

/// Everything needed to resolve references while writing out the class file
pub struct WriteContext<'a> {
    /// Finalized constant pool
    pub pool: &'a ConstPool,

    /// Where non-fatal warnings go
    pub reporter: &'a mut dyn Reporter,

    /// Method currently being written (for diagnostics)
    pub method: Option<String>,

    /// Layout of the code body currently being written (for label references in `Code`
    /// sub-attributes like `LineNumberTable`)
    pub code: Option<Rc<CodeLayout>>,
}

impl<'a> WriteContext<'a> {
    pub fn new(pool: &'a ConstPool, reporter: &'a mut dyn Reporter) -> WriteContext<'a> {
        WriteContext {
            pool,
            reporter,
            method: None,
            code: None,
        }
    }

    /// Write the final pool index of a cell
    ///
    /// The zero cell is rejected: a reference that may be absent goes through
    /// [`WriteContext::write_optional_cell`] instead.
    pub fn write_cell<W: WriteBytesExt>(
        &self,
        cell: ConstCell,
        writer: &mut W,
    ) -> std::result::Result<(), Error> {
        if cell == ConstCell::ZERO {
            return Err(Error::MissingReference("constant"));
        }
        self.pool.index_of(cell)?.serialize(writer)?;
        Ok(())
    }

    /// Write the final pool index of an optional cell, using the reserved index 0 for `None`
    pub fn write_optional_cell<W: WriteBytesExt>(
        &self,
        cell: Option<ConstCell>,
        writer: &mut W,
    ) -> std::result::Result<(), Error> {
        match cell {
            Some(cell) => self.write_cell(cell, writer),
            None => Ok(0u16.serialize(writer)?),
        }
    }

    /// Program counter a label of the current code was placed at
    pub fn label_pc(&self, label: Label) -> std::result::Result<u32, Error> {
        let layout = self.code.as_ref().ok_or(Error::LabelOutsideCode(label))?;
        layout.pc_of(label)
    }

    /// Write a label as the program counter it was placed at
    pub fn write_label<W: WriteBytesExt>(
        &self,
        label: Label,
        writer: &mut W,
    ) -> std::result::Result<(), Error> {
        (self.label_pc(label)? as u16).serialize(writer)?;
        Ok(())
    }

    pub fn warn(&mut self, position: Position, id: &'static str, args: Vec<String>) {
        self.reporter.warning(Diagnostic { position, id, args });
    }
}
