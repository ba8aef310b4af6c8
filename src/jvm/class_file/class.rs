use crate::jvm::class_file::{Attribute, AttributeBody, Field, Method, VectorAttribute, Version};
use crate::jvm::constants::{ConstCell, ConstPool, ConstValue};
use crate::jvm::{
    ClassAccessFlags, Diagnostic, Error, Position, Record, Reporter, Serialize, WriteContext,
};
use crate::util::CountingWriter;
use byteorder::WriteBytesExt;
use std::io::Write;

/// Class as handed over by the parser, ready to be assembled
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.1
#[derive(Debug)]
pub struct ClassModel {
    pub pool: ConstPool,
    pub version: Version,
    pub access_flags: ClassAccessFlags,
    pub this_class: ConstCell,

    /// Super class (only `java/lang/Object` and modules have none)
    pub super_class: Option<ConstCell>,

    pub interfaces: Vec<ConstCell>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassModel {
    /// Magic header bytes that go at the front of the serialized class file
    pub const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    pub fn new(version: Version, access_flags: ClassAccessFlags) -> ClassModel {
        ClassModel {
            pool: ConstPool::new(),
            version,
            access_flags,
            this_class: ConstCell::ZERO,
            super_class: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
            attributes: vec![],
        }
    }

    /// Binary name of the class (eg. `java/lang/Object`), if `this_class` is a known class
    pub fn binary_name(&self) -> Option<&str> {
        match self.pool.get(self.this_class)? {
            ConstValue::Class(name) => self.pool.get_utf8(*name),
            _ => None,
        }
    }

    /// Resolve everything and write out the class file
    ///
    /// Warnings go to the reporter. On error, some bytes may already have been written, so the
    /// writer should be a buffer that gets discarded in that case.
    pub fn assemble<W: WriteBytesExt>(
        &mut self,
        reporter: &mut dyn Reporter,
        writer: &mut W,
    ) -> Result<(), Error> {
        self.prepare(reporter)?;
        self.write(reporter, writer)
    }

    /// First pass: lay out method bodies and finalize the constant pool
    ///
    /// Only this pass touches cells. Once it succeeds, every cell has its final index and every
    /// label its final program counter.
    pub fn prepare(&mut self, reporter: &mut dyn Reporter) -> Result<(), Error> {
        if self.this_class == ConstCell::ZERO {
            return Err(Error::MissingReference("this_class"));
        }
        for method in &mut self.methods {
            let name = self
                .pool
                .get_utf8(method.name)
                .unwrap_or("<unknown>")
                .to_owned();
            if let Some(code) = method.code_mut() {
                code.body.rank_constants(&mut self.pool);
                code.body.layout(&name)?;
            }
        }

        if !self.pool.bootstrap_methods().is_empty() {
            let methods = self.pool.bootstrap_methods().to_vec();
            let existing = self.attributes.iter_mut().find_map(|attribute| match &mut attribute.body {
                AttributeBody::BootstrapMethods(table) => Some(table),
                _ => None,
            });
            match existing {
                Some(table) => table.items = methods,
                None => {
                    let body = AttributeBody::BootstrapMethods(VectorAttribute::new(methods));
                    let attribute = Attribute::new(&mut self.pool, body)?;
                    self.attributes.push(attribute);
                }
            }
        }

        self.pool.finalize(reporter)?;

        if !self.version.supports_dynamic_constants() {
            let dynamic = self
                .pool
                .entries()
                .find(|(_, value)| matches!(value, ConstValue::Dynamic(_, _)));
            if let Some((index, _)) = dynamic {
                reporter.warning(Diagnostic {
                    position: Position::UNKNOWN,
                    id: "warn.version.dynamic",
                    args: vec![index.to_string(), self.version.major_version.to_string()],
                });
            }
        }
        Ok(())
    }

    /// Second pass: write the class file, resolving every cell to its index
    pub fn write<W: WriteBytesExt>(
        &self,
        reporter: &mut dyn Reporter,
        writer: &mut W,
    ) -> Result<(), Error> {
        let mut writer = CountingWriter::new(writer);
        let mut ctx = WriteContext::new(&self.pool, reporter);

        writer.write_all(&ClassModel::MAGIC)?;
        self.version.serialize(&mut writer)?;
        self.pool.write(&mut writer)?;
        self.access_flags.serialize(&mut writer)?;
        ctx.write_cell(self.this_class, &mut writer)?;
        ctx.write_optional_cell(self.super_class, &mut writer)?;

        let interfaces = u16::try_from(self.interfaces.len()).map_err(|_| Error::CountOverflow {
            what: "interfaces",
            count: self.interfaces.len(),
        })?;
        interfaces.serialize(&mut writer)?;
        for interface in &self.interfaces {
            ctx.write_cell(*interface, &mut writer)?;
        }

        self.fields.write(&mut ctx, &mut writer)?;
        self.methods.write(&mut ctx, &mut writer)?;
        self.attributes.write(&mut ctx, &mut writer)?;

        log::debug!(
            "Wrote class {} ({} bytes, {} constants)",
            self.binary_name().unwrap_or("<unknown>"),
            writer.written(),
            self.pool.len()
        );
        Ok(())
    }
}
