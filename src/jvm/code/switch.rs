use super::Label;
use crate::jvm::{Error, Serialize, WriteContext};
use byteorder::WriteBytesExt;

/// Operands of a `tableswitch` or `lookupswitch`
///
/// Keys and targets are paired up by position. Offsets and padding can only be computed once the
/// program counter of the switch is known, which is what [`SwitchLayout::plan`] does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchLayout {
    pub kind: SwitchKind,
    pub keys: Vec<i32>,
    pub targets: Vec<Label>,

    /// Target when no key matches (falls through to the next instruction if absent)
    pub default: Option<Label>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    Table,
    Lookup,
}

/// Where a switch entry jumps to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwitchTarget {
    Label(Label),

    /// Program counter computed from the layout itself (the implicit default)
    Pc(u32),
}

/// Layout of a switch at a fixed program counter
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchPlan {
    /// Zero bytes after the opcode, aligning what follows to a multiple of 4 from the method start
    pub padding: u32,

    /// Total size of the instruction, opcode included
    pub size: u32,

    pub default: SwitchTarget,

    /// Lowest and highest key (only meaningful for `tableswitch`)
    pub low: i32,
    pub high: i32,

    /// For `tableswitch`, one target per key in `low..=high`. For `lookupswitch`, one target per
    /// key, in the order the keys were given.
    pub slots: Vec<SwitchTarget>,
}

impl SwitchLayout {
    pub fn table(keys: Vec<i32>, targets: Vec<Label>, default: Option<Label>) -> SwitchLayout {
        SwitchLayout {
            kind: SwitchKind::Table,
            keys,
            targets,
            default,
        }
    }

    pub fn lookup(keys: Vec<i32>, targets: Vec<Label>, default: Option<Label>) -> SwitchLayout {
        SwitchLayout {
            kind: SwitchKind::Lookup,
            keys,
            targets,
            default,
        }
    }

    /// Padding bytes after an opcode at the given program counter
    pub fn padding(pc: u32) -> u32 {
        (3 - pc as i64).rem_euclid(4) as u32
    }

    /// Lowest and highest key, and the number of slots in between (inclusive)
    ///
    /// Without keys, there are no slots and `high` sits just below `low`.
    fn bounds(&self) -> (i32, i32, u64) {
        match (self.keys.iter().min(), self.keys.iter().max()) {
            (Some(low), Some(high)) => (*low, *high, (*high as i64 - *low as i64 + 1) as u64),
            _ => (0, -1, 0),
        }
    }

    /// Size of the whole instruction at the given program counter, opcode included
    ///
    /// Saturates instead of overflowing, so that absurd key ranges get caught by the code length
    /// limit.
    pub fn size(&self, pc: u32) -> u32 {
        let entries: u64 = match self.kind {
            SwitchKind::Lookup => 8 * (self.keys.len() as u64 + 1),
            SwitchKind::Table => 12 + 4 * self.bounds().2,
        };
        let size = 1 + Self::padding(pc) as u64 + entries;
        u32::try_from(size).unwrap_or(u32::MAX)
    }

    /// Compute the padding, the resolved default, and the slot targets
    pub fn plan(&self, pc: u32) -> Result<SwitchPlan, Error> {
        if self.keys.len() != self.targets.len() {
            return Err(Error::SwitchTargetMismatch {
                keys: self.keys.len(),
                targets: self.targets.len(),
            });
        }

        let size = self.size(pc);
        let default = match self.default {
            Some(label) => SwitchTarget::Label(label),
            None => SwitchTarget::Pc(pc.saturating_add(size)),
        };
        let (low, high, slots) = match self.kind {
            SwitchKind::Lookup => {
                let slots = self.targets.iter().map(|l| SwitchTarget::Label(*l)).collect();
                (0, 0, slots)
            }
            SwitchKind::Table => {
                let (low, high, count) = self.bounds();
                if count > u16::MAX as u64 {
                    return Err(Error::MethodCodeOverflow(size));
                }
                let mut slots = vec![default; count as usize];
                for (key, target) in self.keys.iter().zip(&self.targets) {
                    slots[(*key as i64 - low as i64) as usize] = SwitchTarget::Label(*target);
                }
                (low, high, slots)
            }
        };

        Ok(SwitchPlan {
            padding: Self::padding(pc),
            size,
            default,
            low,
            high,
            slots,
        })
    }

    /// Write everything after the opcode byte
    pub fn write<W: WriteBytesExt>(
        &self,
        pc: u32,
        ctx: &WriteContext<'_>,
        writer: &mut W,
    ) -> Result<(), Error> {
        let plan = self.plan(pc)?;
        let offset = |target: SwitchTarget| -> Result<i32, Error> {
            let target_pc = match target {
                SwitchTarget::Label(label) => ctx.label_pc(label)?,
                SwitchTarget::Pc(pc) => pc,
            };
            Ok(target_pc as i32 - pc as i32)
        };

        for _ in 0..plan.padding {
            0u8.serialize(writer)?;
        }
        offset(plan.default)?.serialize(writer)?;
        match self.kind {
            SwitchKind::Lookup => {
                (self.keys.len() as i32).serialize(writer)?;
                for (key, target) in self.keys.iter().zip(plan.slots) {
                    key.serialize(writer)?;
                    offset(target)?.serialize(writer)?;
                }
            }
            SwitchKind::Table => {
                plan.low.serialize(writer)?;
                plan.high.serialize(writer)?;
                for target in plan.slots {
                    offset(target)?.serialize(writer)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn labels(count: u32) -> Vec<Label> {
        (0..count).map(Label).collect()
    }

    #[test]
    fn padding_aligns_after_opcode() {
        assert_eq!(SwitchLayout::padding(0), 3);
        assert_eq!(SwitchLayout::padding(1), 2);
        assert_eq!(SwitchLayout::padding(3), 0);
        assert_eq!(SwitchLayout::padding(4), 3);
    }

    #[test]
    fn lookupswitch_size() {
        let switch = SwitchLayout::lookup(vec![10, 1], labels(2), None);
        assert_eq!(switch.size(1), 1 + 2 + 8 * 3);
        assert_eq!(switch.size(4), 1 + 3 + 8 * 3);

        let plan = switch.plan(1).unwrap();
        assert_eq!(plan.default, SwitchTarget::Pc(1 + 27));
        assert_eq!(plan.slots, vec![SwitchTarget::Label(Label(0)), SwitchTarget::Label(Label(1))]);
    }

    #[test]
    fn tableswitch_is_dense() {
        let default = Label(9);
        let switch = SwitchLayout::table(vec![2, 5, 9], labels(3), Some(default));
        let plan = switch.plan(0).unwrap();
        assert_eq!((plan.low, plan.high), (2, 9));
        assert_eq!(plan.slots.len(), 8);
        assert_eq!(plan.size, 1 + 3 + 12 + 4 * 8);
        for (idx, slot) in plan.slots.iter().enumerate() {
            let expected = match idx {
                0 => SwitchTarget::Label(Label(0)),
                3 => SwitchTarget::Label(Label(1)),
                7 => SwitchTarget::Label(Label(2)),
                _ => SwitchTarget::Label(default),
            };
            assert_eq!(*slot, expected, "slot {}", idx);
        }
    }

    #[test]
    fn empty_tableswitch() {
        let switch = SwitchLayout::table(vec![], vec![], None);
        let plan = switch.plan(2).unwrap();
        assert!(plan.slots.is_empty());
        assert_eq!(plan.size, 1 + 1 + 12);
        assert_eq!(plan.default, SwitchTarget::Pc(2 + 14));
    }

    #[test]
    fn table_too_large_for_any_method() {
        let switch = SwitchLayout::table(vec![i32::MIN, i32::MAX], labels(2), None);
        assert_eq!(switch.size(5), u32::MAX);
        assert!(matches!(switch.plan(5), Err(Error::MethodCodeOverflow(_))));
    }

    #[test]
    fn mismatched_targets() {
        let switch = SwitchLayout::lookup(vec![1, 2], labels(1), None);
        assert!(switch.plan(0).is_err());
    }
}
