use super::{Label, Opcode, OpcodeInfo, OperandKind, SwitchKind, SwitchLayout};
use crate::jvm::constants::{ConstCell, ConstPool, ConstValue, ReferenceRank};
use crate::jvm::{argument_slots, Error, Position, Serialize, WriteContext};
use byteorder::{BigEndian, WriteBytesExt};

/// Single bytecode instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Operand,

    /// Second operand: the increment of `iinc` (also under `wide`), the count of
    /// `invokeinterface` (derived from the descriptor if absent), or the dimensions of
    /// `multianewarray`
    pub extra: Option<i32>,

    pub position: Position,
}

/// First operand of an instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    None,

    /// Raw value, written as is (for branches, this is the offset)
    Value(i32),

    /// Constant pool entry
    Constant(ConstCell),

    /// Branch target
    Label(Label),

    /// Instruction widened by a `wide` prefix
    Wide { opcode: u8, local: i32 },

    Switch(Box<SwitchLayout>),
}

impl Instruction {
    pub fn new(opcode: Opcode, operand: Operand) -> Instruction {
        Instruction {
            opcode,
            operand,
            extra: None,
            position: Position::UNKNOWN,
        }
    }

    /// Instruction without operands
    pub fn simple(opcode: Opcode) -> Instruction {
        Instruction::new(opcode, Operand::None)
    }

    pub fn value(opcode: Opcode, value: i32) -> Instruction {
        Instruction::new(opcode, Operand::Value(value))
    }

    pub fn constant(opcode: Opcode, cell: ConstCell) -> Instruction {
        Instruction::new(opcode, Operand::Constant(cell))
    }

    pub fn branch(opcode: Opcode, target: Label) -> Instruction {
        Instruction::new(opcode, Operand::Label(target))
    }

    pub fn iinc(local: i32, increment: i32) -> Instruction {
        Instruction::value(Opcode::IINC, local).with_extra(increment)
    }

    pub fn wide(opcode: Opcode, local: i32) -> Instruction {
        let opcode = match opcode {
            Opcode::Standard(byte) | Opcode::Privileged(byte) | Opcode::NonPrivileged(byte) => byte,
        };
        Instruction::new(Opcode::WIDE, Operand::Wide { opcode, local })
    }

    pub fn switch(layout: SwitchLayout) -> Instruction {
        let opcode = match layout.kind {
            SwitchKind::Table => Opcode::TABLESWITCH,
            SwitchKind::Lookup => Opcode::LOOKUPSWITCH,
        };
        Instruction::new(opcode, Operand::Switch(Box::new(layout)))
    }

    pub fn with_extra(mut self, extra: i32) -> Instruction {
        self.extra = Some(extra);
        self
    }

    pub fn at(mut self, position: Position) -> Instruction {
        self.position = position;
        self
    }

    /// Labels this instruction may jump to
    pub fn targets(&self) -> Vec<Label> {
        match &self.operand {
            Operand::Label(label) => vec![*label],
            Operand::Switch(switch) => switch.targets.iter().chain(&switch.default).copied().collect(),
            _ => vec![],
        }
    }

    /// Constant referenced by this instruction, along with how cheaply it needs to be referenced
    pub fn constant_reference(&self) -> Option<(ConstCell, ReferenceRank)> {
        match (&self.operand, self.opcode.info()) {
            (Operand::Constant(cell), Ok(info)) if info.kind == OperandKind::Const => {
                Some((*cell, ReferenceRank::Ldc))
            }
            (Operand::Constant(cell), _) => Some((*cell, ReferenceRank::Any)),
            _ => None,
        }
    }

    /// Length of the encoded instruction at the given program counter
    ///
    /// This depends on the program counter only for switches (because of alignment), never on
    /// where branches go.
    pub fn length(&self, pc: u32) -> Result<u32, Error> {
        let info = match self.opcode {
            Opcode::Privileged(_) | Opcode::NonPrivileged(_) => return Ok(2),
            Opcode::Standard(_) => self.opcode.info()?,
        };
        match (info.kind, &self.operand) {
            (OperandKind::TableSwitch, Operand::Switch(switch))
                if switch.kind == SwitchKind::Table =>
            {
                Ok(switch.size(pc))
            }
            (OperandKind::LookupSwitch, Operand::Switch(switch))
                if switch.kind == SwitchKind::Lookup =>
            {
                Ok(switch.size(pc))
            }
            (OperandKind::Wide, Operand::Wide { opcode, .. }) => {
                if Opcode::Standard(*opcode) == Opcode::IINC {
                    Ok(6)
                } else {
                    Ok(4)
                }
            }
            (OperandKind::TableSwitch | OperandKind::LookupSwitch | OperandKind::Wide, _) => {
                Err(self.malformed("", pc))
            }
            _ => Ok(info.length as u32),
        }
    }

    /// Write the instruction as found at the given program counter
    ///
    /// The pool must be finalized and, for branches, the context must carry the code layout.
    pub fn write<W: WriteBytesExt>(
        &self,
        pc: u32,
        ctx: &mut WriteContext<'_>,
        writer: &mut W,
    ) -> Result<(), Error> {
        let byte = match self.opcode {
            Opcode::Privileged(byte) => {
                Opcode::PRIVILEGED_PREFIX.serialize(writer)?;
                return Ok(byte.serialize(writer)?);
            }
            Opcode::NonPrivileged(byte) => {
                Opcode::NON_PRIVILEGED_PREFIX.serialize(writer)?;
                return Ok(byte.serialize(writer)?);
            }
            Opcode::Standard(byte) => byte,
        };
        let info = self.opcode.info()?;
        byte.serialize(writer)?;

        match (info.kind, &self.operand) {
            (OperandKind::None, Operand::None) => Ok(()),
            (OperandKind::None, _) => Err(self.malformed(&method_name(ctx), pc)),
            (OperandKind::TableSwitch | OperandKind::LookupSwitch, Operand::Switch(switch)) => {
                switch.write(pc, ctx, writer)
            }
            (OperandKind::Wide, Operand::Wide { opcode, local }) => {
                opcode.serialize(writer)?;
                self.write_checked(ctx, pc, *local as i64, 2, false, writer)?;
                if Opcode::Standard(*opcode) == Opcode::IINC {
                    let increment = self.extra.ok_or_else(|| self.malformed(&method_name(ctx), pc))?;
                    self.write_checked(ctx, pc, increment as i64, 2, true, writer)?;
                }
                Ok(())
            }
            (OperandKind::TableSwitch | OperandKind::LookupSwitch | OperandKind::Wide, _) => {
                Err(self.malformed(&method_name(ctx), pc))
            }
            (kind, _) => {
                let width = match info.length {
                    2..=5 => info.length - 1,
                    length => {
                        return Err(Error::MalformedOpcodeLength {
                            opcode: info.mnemonic,
                            length,
                        })
                    }
                };
                let value = self.operand_value(info, pc, ctx)?;
                if kind == OperandKind::Const && !(0..=0xFF).contains(&value) {
                    return Err(Error::LdcIndexOverflow {
                        method: method_name(ctx),
                        pc,
                        index: value,
                    });
                }
                self.write_checked(ctx, pc, value, width, kind.is_signed(), writer)
            }
        }
    }

    /// Compute the (possibly packed) operand value of a fixed length instruction
    fn operand_value(
        &self,
        info: &OpcodeInfo,
        pc: u32,
        ctx: &mut WriteContext<'_>,
    ) -> Result<i64, Error> {
        let value = match (info.kind, &self.operand) {
            (OperandKind::Branch | OperandKind::BranchWide, Operand::Label(label)) => {
                ctx.label_pc(*label)? as i64 - pc as i64
            }
            (
                OperandKind::Byte
                | OperandKind::Short
                | OperandKind::Local
                | OperandKind::ArrayType
                | OperandKind::Const
                | OperandKind::ConstShort
                | OperandKind::Branch
                | OperandKind::BranchWide,
                Operand::Value(value),
            ) => *value as i64,
            (OperandKind::Const | OperandKind::ConstShort, Operand::Constant(cell)) => {
                self.index_of(*cell, pc, ctx)?
            }
            (OperandKind::IInc, Operand::Value(local)) => {
                let increment = self.extra.ok_or_else(|| self.malformed(&method_name(ctx), pc))?;
                self.check_range(ctx, pc, increment as i64, 1, true);
                (*local as i64) << 8 | (increment as i64 & 0xFF)
            }
            (OperandKind::MultiANewArray, Operand::Constant(cell)) => {
                let dimensions = self.extra.ok_or_else(|| self.malformed(&method_name(ctx), pc))?;
                self.check_range(ctx, pc, dimensions as i64, 1, false);
                self.index_of(*cell, pc, ctx)? << 8 | (dimensions as i64 & 0xFF)
            }
            (OperandKind::InvokeInterface, Operand::Constant(cell)) => {
                let count = match self.extra {
                    Some(count) => count as i64,
                    None => interface_argument_count(ctx.pool, *cell)
                        .ok_or_else(|| self.malformed(&method_name(ctx), pc))?,
                };
                self.check_range(ctx, pc, count, 1, false);
                (self.index_of(*cell, pc, ctx)? << 8 | (count & 0xFF)) << 8
            }
            (OperandKind::InvokeDynamic, Operand::Constant(cell)) => {
                self.index_of(*cell, pc, ctx)? << 16
            }
            _ => return Err(self.malformed(&method_name(ctx), pc)),
        };
        Ok(value)
    }

    fn index_of(&self, cell: ConstCell, pc: u32, ctx: &WriteContext<'_>) -> Result<i64, Error> {
        match ctx.pool.index_of(cell) {
            Ok(index) => Ok(index as i64),
            Err(_) => Err(Error::UnresolvedOperand {
                method: method_name(ctx),
                pc,
            }),
        }
    }

    /// Warn if the value doesn't fit in the operand width
    fn check_range(&self, ctx: &mut WriteContext<'_>, pc: u32, value: i64, width: u8, signed: bool) {
        let bits = 8 * width as u32;
        let fits = if signed {
            let bound = 1i64 << (bits - 1);
            -bound <= value && value < bound
        } else {
            0 <= value && value < 1i64 << bits
        };
        if !fits {
            let args = vec![
                method_name(ctx),
                pc.to_string(),
                self.opcode.mnemonic().to_owned(),
                value.to_string(),
            ];
            ctx.warn(self.position, "warn.operand.overflow", args);
        }
    }

    /// Write the value in the given number of bytes, truncating (with a warning) if it doesn't fit
    fn write_checked<W: WriteBytesExt>(
        &self,
        ctx: &mut WriteContext<'_>,
        pc: u32,
        value: i64,
        width: u8,
        signed: bool,
        writer: &mut W,
    ) -> Result<(), Error> {
        self.check_range(ctx, pc, value, width, signed);
        let mask = (1u64 << (8 * width as u32)) - 1;
        writer.write_uint::<BigEndian>(value as u64 & mask, width as usize)?;
        Ok(())
    }

    fn malformed(&self, method: &str, pc: u32) -> Error {
        Error::MalformedOperand {
            method: method.to_owned(),
            pc,
            opcode: self.opcode.mnemonic(),
        }
    }
}

fn method_name(ctx: &WriteContext<'_>) -> String {
    ctx.method.clone().unwrap_or_default()
}

/// Count operand of `invokeinterface`: one for the receiver plus the argument slots
fn interface_argument_count(pool: &ConstPool, method: ConstCell) -> Option<i64> {
    let name_and_type = match pool.get(method)? {
        ConstValue::InterfaceMethodRef(_, name_and_type)
        | ConstValue::MethodRef(_, name_and_type) => *name_and_type,
        _ => return None,
    };
    let descriptor = match pool.get(name_and_type)? {
        ConstValue::NameAndType(_, descriptor) => *descriptor,
        _ => return None,
    };
    argument_slots(pool.get_utf8(descriptor)?).map(|slots| slots as i64 + 1)
}
