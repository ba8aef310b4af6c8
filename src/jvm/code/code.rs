use super::{Instruction, Label, LabelTable};
use crate::jvm::class_file::Attribute;
use crate::jvm::constants::{ConstCell, ConstPool};
use crate::jvm::{Error, Record, Serialize, WriteContext};
use byteorder::WriteBytesExt;
use std::rc::Rc;

/// Longest possible code array
pub const MAX_CODE_LENGTH: u32 = 65535;

/// Instructions of a method, with the labels placed between them
#[derive(Default, Debug)]
pub struct CodeBody {
    instructions: Vec<Instruction>,
    labels: LabelTable,

    /// Set once the body has been laid out
    layout: Option<Rc<CodeLayout>>,
}

/// Program counters of a laid out code body
#[derive(Debug, PartialEq, Eq)]
pub struct CodeLayout {
    /// Program counter of every instruction
    pub instruction_pcs: Vec<u32>,

    /// Program counter of every label (`None` if never placed)
    label_pcs: Vec<Option<u32>>,
    label_names: Vec<String>,

    /// Total length of the code array
    pub length: u32,
}

impl CodeLayout {
    pub fn pc_of(&self, label: Label) -> Result<u32, Error> {
        match self.label_pcs.get(label.0 as usize) {
            Some(Some(pc)) => Ok(*pc),
            Some(None) => Err(Error::UndefinedLabel(self.label_names[label.0 as usize].clone())),
            None => Err(Error::LabelOutsideCode(label)),
        }
    }
}

impl CodeBody {
    pub fn new() -> CodeBody {
        CodeBody::default()
    }

    /// Append an instruction (invalidating any previous layout)
    pub fn push(&mut self, instruction: Instruction) {
        self.layout = None;
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Label with the given name (which may be placed before or after being referenced)
    pub fn label(&mut self, name: &str) -> Label {
        self.labels.named(name)
    }

    pub fn fresh_label(&mut self) -> Label {
        self.labels.fresh()
    }

    /// Place a label in front of the next instruction pushed
    pub fn place(&mut self, label: Label) -> Result<(), Error> {
        self.layout = None;
        self.labels.place(label, self.instructions.len())
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Layout computed by the last call to [`CodeBody::layout`]
    pub fn laid_out(&self) -> Option<&Rc<CodeLayout>> {
        self.layout.as_ref()
    }

    /// Raise the reference rank of every constant used as an instruction operand
    pub fn rank_constants(&self, pool: &mut ConstPool) {
        for instruction in &self.instructions {
            if let Some((cell, rank)) = instruction.constant_reference() {
                pool.set_rank(cell, rank);
            }
        }
    }

    /// Fix the program counter of every instruction and label
    ///
    /// Fails if the code gets too long or if an instruction jumps to a label that is never
    /// placed. The name of the method is only used for diagnostics.
    pub fn layout(&mut self, method: &str) -> Result<Rc<CodeLayout>, Error> {
        let mut instruction_pcs = Vec::with_capacity(self.instructions.len());
        let mut pc: u32 = 0;
        for instruction in &self.instructions {
            instruction_pcs.push(pc);
            let length = instruction.length(pc).map_err(|err| err.in_method(method))?;
            pc = pc.saturating_add(length);
            if pc > MAX_CODE_LENGTH {
                return Err(Error::MethodCodeOverflow(pc));
            }
        }

        let mut label_pcs = Vec::with_capacity(self.labels.len());
        let mut label_names = Vec::with_capacity(self.labels.len());
        for idx in 0..self.labels.len() {
            let label = Label(idx as u32);
            let placed = self
                .labels
                .placement(label)
                .ok()
                .map(|instruction| instruction_pcs.get(instruction).copied().unwrap_or(pc));
            label_pcs.push(placed);
            label_names.push(self.labels.name(label).to_owned());
        }

        let layout = CodeLayout {
            instruction_pcs,
            label_pcs,
            label_names,
            length: pc,
        };
        for instruction in &self.instructions {
            for target in instruction.targets() {
                layout.pc_of(target)?;
            }
        }

        log::debug!(
            "Laid out {} instructions of {} in {} bytes",
            self.instructions.len(),
            method,
            layout.length
        );
        let layout = Rc::new(layout);
        self.layout = Some(layout.clone());
        Ok(layout)
    }

    /// Length of the code array (0 if not laid out yet)
    pub fn code_length(&self) -> u32 {
        self.layout.as_ref().map_or(0, |layout| layout.length)
    }

    /// Write the code array, without its length prefix
    pub fn write_code<W: WriteBytesExt>(
        &self,
        ctx: &mut WriteContext<'_>,
        writer: &mut W,
    ) -> Result<(), Error> {
        let layout = self.layout.as_ref().ok_or(Error::CodeNotLaidOut)?;
        let previous = ctx.code.replace(layout.clone());
        let result = self
            .instructions
            .iter()
            .zip(&layout.instruction_pcs)
            .try_for_each(|(instruction, pc)| instruction.write(*pc, ctx, writer));
        ctx.code = previous;
        result
    }
}

/// Exception handler covering the code between two labels
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start: Label,

    /// Exclusive end of the covered range
    pub end: Label,

    pub handler: Label,

    /// Class of exceptions caught (`None` catches everything)
    pub catch_type: Option<ConstCell>,
}

impl Record for ExceptionHandler {
    fn length(&self) -> u32 {
        8
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        ctx.write_label(self.start, writer)?;
        ctx.write_label(self.end, writer)?;
        ctx.write_label(self.handler, writer)?;
        ctx.write_optional_cell(self.catch_type, writer)
    }
}

/// Contents of a `Code` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub body: CodeBody,
    pub exception_table: Vec<ExceptionHandler>,

    /// Attributes of the code (line numbers, local variables, etc.)
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, body: CodeBody) -> CodeAttribute {
        CodeAttribute {
            max_stack,
            max_locals,
            body,
            exception_table: vec![],
            attributes: vec![],
        }
    }
}

impl Record for CodeAttribute {
    fn length(&self) -> u32 {
        2 + 2 + 4 + self.body.code_length() + self.exception_table.length() + self.attributes.length()
    }

    fn write<W: WriteBytesExt>(&self, ctx: &mut WriteContext<'_>, writer: &mut W) -> Result<(), Error> {
        let layout = self.body.laid_out().ok_or(Error::CodeNotLaidOut)?.clone();
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        layout.length.serialize(writer)?;
        self.body.write_code(ctx, writer)?;

        let previous = ctx.code.replace(layout);
        let result = self
            .exception_table
            .write(ctx, writer)
            .and_then(|_| self.attributes.write(ctx, writer));
        ctx.code = previous;
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::{Opcode, SwitchLayout};
    use crate::jvm::IgnoreWarnings;

    #[test]
    fn labels_resolve_to_instruction_pcs() {
        let mut body = CodeBody::new();
        let start = body.label("start");
        let end = body.label("end");
        body.place(start).unwrap();
        body.push(Instruction::value(Opcode::SIPUSH, 1));
        body.push(Instruction::branch(Opcode::GOTO, end));
        body.push(Instruction::simple(Opcode::NOP));
        body.place(end).unwrap();

        let layout = body.layout("test").unwrap();
        assert_eq!(layout.instruction_pcs, vec![0, 3, 6]);
        assert_eq!(layout.pc_of(start).unwrap(), 0);
        assert_eq!(layout.pc_of(end).unwrap(), 7);
        assert_eq!(layout.length, 7);
    }

    #[test]
    fn switch_length_depends_on_pc() {
        let mut body = CodeBody::new();
        let target = body.fresh_label();
        body.push(Instruction::simple(Opcode::ICONST_0));
        body.push(Instruction::switch(SwitchLayout::lookup(vec![], vec![], Some(target))));
        body.place(target).unwrap();
        body.push(Instruction::simple(Opcode::RETURN));

        let layout = body.layout("test").unwrap();
        assert_eq!(layout.instruction_pcs, vec![0, 1, 12]);
    }

    #[test]
    fn undefined_branch_target() {
        let mut body = CodeBody::new();
        let nowhere = body.label("nowhere");
        body.push(Instruction::branch(Opcode::GOTO, nowhere));
        assert!(matches!(body.layout("test"), Err(Error::UndefinedLabel(name)) if name == "nowhere"));
    }

    #[test]
    fn code_too_long() {
        let mut body = CodeBody::new();
        for _ in 0..=MAX_CODE_LENGTH {
            body.push(Instruction::simple(Opcode::NOP));
        }
        assert!(matches!(body.layout("test"), Err(Error::MethodCodeOverflow(65536))));
    }

    #[test]
    fn branch_offsets_are_relative() {
        let mut body = CodeBody::new();
        let back = body.label("back");
        let forward = body.label("forward");
        body.place(back).unwrap();
        body.push(Instruction::branch(Opcode::GOTO, forward));
        body.place(forward).unwrap();
        body.push(Instruction::branch(Opcode::GOTO_W, back));
        body.layout("test").unwrap();

        let pool = ConstPool::new();
        let mut reporter = IgnoreWarnings;
        let mut ctx = WriteContext::new(&pool, &mut reporter);
        let mut bytes: Vec<u8> = vec![];
        body.write_code(&mut ctx, &mut bytes).unwrap();
        assert_eq!(bytes, vec![0xA7, 0, 3, 0xC8, 0xFF, 0xFF, 0xFF, 0xFD]);
    }
}
