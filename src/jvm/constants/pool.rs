use super::{encode_modified_utf8, BootstrapIndex, ConstTag, ConstValue, HandleKind};
use crate::jvm::class_file::BootstrapMethod;
use crate::jvm::{Diagnostic, Error, Position, Reporter, Serialize};
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use byteorder::WriteBytesExt;
use std::collections::HashMap;

/// Handle to an entry in a [`ConstPool`]
///
/// Cells are cheap to copy and get handed out as soon as a constant is requested, long before
/// the pool decides which index the constant ends up at. Several cells may end up denoting the
/// same entry (eg. a forward reference by name which later gets bound to an existing class).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Ord, PartialOrd)]
pub struct ConstCell(u32);

impl ConstCell {
    /// Cell for the reserved entry at index 0
    ///
    /// This is the cell to use for "no catch type", "no outer class", etc. It is always set and
    /// its index is always 0, which is distinct from the index of any real entry.
    pub const ZERO: ConstCell = ConstCell(0);
}

/// How cheaply an entry needs to be referenced from code
///
/// Ordered by priority: once a rank has been raised it never goes back down.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Ord, PartialOrd)]
pub enum ReferenceRank {
    /// Not referenced from any instruction
    None,

    /// Referenced from an instruction with a two byte index
    Any,

    /// Referenced from `ldc`, which only has a one byte index
    Ldc,
}

/// What a cell stands for
#[derive(Clone, Debug)]
enum Binding {
    /// Cell owns an entry in the pool
    Value(ConstValue),

    /// Cell denotes the same entry as another cell
    Alias(ConstCell),

    /// Explicit reference to whatever entry ends up at this index (`#n` in the source)
    Index(u16, Position),

    /// Forward reference to a wrapper constant that is only known by name so far
    Promote(ConstTag, ConstCell),
}

#[derive(Clone, Debug)]
struct Slot {
    binding: Binding,
    index: Option<u16>,
    rank: ReferenceRank,
}

/// Entry of the finalized layout, remembering which cell owns it
#[derive(Copy, Clone, Debug)]
struct PoolEntry {
    cell: ConstCell,
    wide: bool,
}

impl Width for PoolEntry {
    fn width(&self) -> usize {
        if self.wide {
            2
        } else {
            1
        }
    }
}

/// Structural key used to tell when two entries are equal by value
///
/// Unlike [`ConstValue`], nested entries are compared by what they contain and not by which cell
/// they live in.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
enum ValueKey {
    Zero,
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Nested {
        tag: ConstTag,
        extra: u16,
        nested: Vec<ValueKey>,
    },
}

/// Constant pool
///
/// The pool is an arena of cells. Entries keep the order in which they were first requested and
/// only get their indices when the pool is [finalized](ConstPool::finalize). After that point,
/// no new entries can be added.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Debug)]
pub struct ConstPool {
    /// Every cell ever handed out (the first one is always the zero cell)
    slots: Vec<Slot>,

    /// Cells owning an entry, in insertion order
    order: Vec<ConstCell>,

    /// Lookup for structurally equal entries
    structural: HashMap<ConstValue, ConstCell>,

    /// Lookup for entries equal by value
    by_value: HashMap<ValueKey, ConstCell>,

    /// Bootstrap methods referred to from `Dynamic` and `InvokeDynamic` entries
    bootstrap_methods: Vec<BootstrapMethod>,
    bootstrap_lookup: HashMap<BootstrapMethod, BootstrapIndex>,

    /// Index layout, only present once finalized
    layout: Option<OffsetVec<PoolEntry>>,
}

impl Default for ConstPool {
    fn default() -> ConstPool {
        ConstPool::new()
    }
}

impl ConstPool {
    pub fn new() -> ConstPool {
        ConstPool {
            slots: vec![Slot {
                binding: Binding::Value(ConstValue::Zero),
                index: Some(0),
                rank: ReferenceRank::None,
            }],
            order: vec![],
            structural: HashMap::new(),
            by_value: HashMap::new(),
            bootstrap_methods: vec![],
            bootstrap_lookup: HashMap::new(),
            layout: None,
        }
    }

    /// Number of entries (not slots) in the pool
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.layout.is_some()
    }

    /// Get the cell of a constant, adding it to the pool if it isn't already there
    ///
    /// An existing entry is reused if it is equal by value to the requested one, so interning is
    /// idempotent and two requests for the same logical constant always get the same cell.
    pub fn intern(&mut self, value: ConstValue) -> Result<ConstCell, Error> {
        if value == ConstValue::Zero {
            return Ok(ConstCell::ZERO);
        }
        if let Some(cell) = self.find(&value) {
            return Ok(cell);
        }
        if self.is_finalized() {
            return Err(Error::PoolFinalized);
        }

        let key = self.value_key(&value);
        let cell = self.push_slot(Binding::Value(value.clone()));
        self.order.push(cell);
        self.structural.insert(value, cell);
        if let Some(key) = key {
            self.by_value.insert(key, cell);
        }
        Ok(cell)
    }

    /// Cell standing for whatever entry ends up at the given index
    ///
    /// The index is only checked once the pool is finalized.
    pub fn reference(&mut self, index: u16, position: Position) -> Result<ConstCell, Error> {
        if self.is_finalized() {
            return Err(Error::PoolFinalized);
        }
        Ok(self.push_slot(Binding::Index(index, position)))
    }

    /// Forward reference to a wrapper constant (a class, string, method type, module, or package)
    /// by the cell of its name
    ///
    /// The cell gets bound on [`ConstPool::resolve`] (at the latest when the pool is finalized)
    /// to an equal existing entry, or to a freshly synthesized one.
    pub fn promote(&mut self, tag: ConstTag, name: ConstCell) -> Result<ConstCell, Error> {
        if tag.wrap(name).is_none() {
            return Err(Error::UnexpectedConstant {
                expected: ConstTag::Class,
                found: tag,
            });
        }
        if self.is_finalized() {
            return Err(Error::PoolFinalized);
        }
        Ok(self.push_slot(Binding::Promote(tag, name)))
    }

    /// Bind a cell which was created before its value was known
    ///
    /// Returns the cell owning the entry. Explicit index references stay unbound until the pool
    /// is finalized (since only then do indices mean anything).
    pub fn resolve(&mut self, cell: ConstCell) -> Result<ConstCell, Error> {
        let cell = self.canonical(cell);
        let binding = self.slot(cell)?.binding.clone();
        match binding {
            Binding::Value(_) | Binding::Alias(_) => Ok(cell),
            Binding::Index(_, _) if !self.is_finalized() => Ok(cell),
            Binding::Index(_, _) => Err(Error::UnresolvedConstant(cell)),
            Binding::Promote(tag, name) => {
                let name = self.resolve(name)?;
                let value = tag.wrap(name).ok_or(Error::UnresolvedConstant(cell))?;
                let target = match self.find(&value) {
                    Some(target) => target,
                    None if self.is_finalized() => return Err(Error::UnresolvedConstant(cell)),
                    None => self.intern(value)?,
                };
                self.bind(cell, target);
                Ok(target)
            }
        }
    }

    /// Raise the reference rank of an entry (lower ranks than the current one are ignored)
    pub fn set_rank(&mut self, cell: ConstCell, rank: ReferenceRank) {
        let cell = self.canonical(cell);
        if let Some(slot) = self.slots.get_mut(cell.0 as usize) {
            slot.rank = slot.rank.max(rank);
        }
    }

    pub fn rank(&self, cell: ConstCell) -> ReferenceRank {
        self.slots
            .get(self.canonical(cell).0 as usize)
            .map_or(ReferenceRank::None, |slot| slot.rank)
    }

    /// Register a bootstrap method, reusing an identical existing one
    pub fn bootstrap(
        &mut self,
        handle: ConstCell,
        arguments: Vec<ConstCell>,
    ) -> Result<BootstrapIndex, Error> {
        let method = BootstrapMethod { handle, arguments };
        if let Some(index) = self.bootstrap_lookup.get(&method) {
            return Ok(*index);
        }
        if self.is_finalized() {
            return Err(Error::PoolFinalized);
        }
        let index = u16::try_from(self.bootstrap_methods.len())
            .map(BootstrapIndex)
            .map_err(|_| Error::CountOverflow {
                what: "bootstrap methods",
                count: self.bootstrap_methods.len(),
            })?;
        self.bootstrap_methods.push(method.clone());
        self.bootstrap_lookup.insert(method, index);
        Ok(index)
    }

    pub fn bootstrap_methods(&self) -> &[BootstrapMethod] {
        &self.bootstrap_methods
    }

    /// Check whether two cells denote entries that are equal by value
    pub fn value_eq(&self, cell1: ConstCell, cell2: ConstCell) -> bool {
        let (cell1, cell2) = (self.canonical(cell1), self.canonical(cell2));
        if cell1 == cell2 {
            return true;
        }
        match (self.cell_key(cell1), self.cell_key(cell2)) {
            (Some(key1), Some(key2)) => key1 == key2,
            _ => false,
        }
    }

    /// Value of the entry a cell denotes, if it is bound to one
    pub fn get(&self, cell: ConstCell) -> Option<&ConstValue> {
        match &self.slots.get(self.canonical(cell).0 as usize)?.binding {
            Binding::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Contents of a `Utf8` entry
    pub fn get_utf8(&self, cell: ConstCell) -> Option<&str> {
        match self.get(cell)? {
            ConstValue::Utf8(string) => Some(string),
            _ => None,
        }
    }

    /// Final index of the entry a cell denotes
    pub fn index_of(&self, cell: ConstCell) -> Result<u16, Error> {
        let owner = self.canonical(cell);
        match self.slot(owner)? {
            Slot {
                binding: Binding::Value(_),
                index: Some(index),
                ..
            } => Ok(*index),
            _ => Err(Error::UnresolvedConstant(cell)),
        }
    }

    /// A cell is set when it denotes an entry which has its final index
    pub fn is_set(&self, cell: ConstCell) -> bool {
        self.index_of(cell).is_ok()
    }

    /// Entries in pool order, along with their indices (only once finalized)
    pub fn entries(&self) -> impl Iterator<Item = (u16, &ConstValue)> + '_ {
        self.order.iter().filter_map(move |cell| {
            let index = self.index_of(*cell).ok()?;
            Some((index, self.get(*cell)?))
        })
    }

    /// Hand out indices
    ///
    /// Forward references by name are bound first (possibly adding entries), then every entry
    /// gets an index following insertion order, and finally explicit `#n` references are bound to
    /// the entries at those indices. Finalizing an already finalized pool does nothing.
    pub fn finalize(&mut self, reporter: &mut dyn Reporter) -> Result<(), Error> {
        if self.is_finalized() {
            return Ok(());
        }

        for idx in 0..self.slots.len() {
            if let Binding::Promote(_, _) = self.slots[idx].binding {
                self.resolve(ConstCell(idx as u32))?;
            }
        }

        let mut layout = OffsetVec::new_starting_at(Offset(1));
        for cell in &self.order {
            let wide = match &self.slots[cell.0 as usize].binding {
                Binding::Value(value) => value.width() == 2,
                _ => false,
            };
            layout.push(PoolEntry { cell: *cell, wide });
        }
        let Offset(count) = layout.offset_len();
        if count > u16::MAX as usize {
            return Err(Error::ConstantPoolOverflow { slots: count - 1 });
        }
        for (Offset(index), _, entry) in layout.iter() {
            self.slots[entry.cell.0 as usize].index = Some(index as u16);
        }

        for cell in &self.order {
            if let Some(ConstValue::Dynamic(bootstrap, _) | ConstValue::InvokeDynamic(bootstrap, _)) =
                self.get(*cell)
            {
                if bootstrap.0 as usize >= self.bootstrap_methods.len() {
                    return Err(Error::UndefinedBootstrapMethod(bootstrap.0));
                }
            }
        }

        for idx in 0..self.slots.len() {
            if let Binding::Index(index, position) = self.slots[idx].binding {
                let target = if index == 0 {
                    reporter.warning(Diagnostic {
                        position,
                        id: "warn.cpool.zero.ref",
                        args: vec![],
                    });
                    ConstCell::ZERO
                } else {
                    match layout.get_offset(Offset(index as usize)) {
                        OffsetResult::Ok(_, entry) => entry.cell,
                        _ => return Err(Error::InvalidConstantReference(index)),
                    }
                };
                self.bind(ConstCell(idx as u32), target);
            }
        }

        log::debug!(
            "Finalized constant pool: {} entries in {} slots, {} bootstrap methods",
            self.order.len(),
            count - 1,
            self.bootstrap_methods.len()
        );
        self.layout = Some(layout);
        Ok(())
    }

    /// Write the constant pool count followed by every entry
    pub fn write<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        let layout = self.layout.as_ref().ok_or(Error::UnresolvedConstant(ConstCell::ZERO))?;
        let Offset(count) = layout.offset_len();
        (count as u16).serialize(writer)?;
        for (_, _, entry) in layout.iter() {
            let value = self.get(entry.cell).ok_or(Error::UnresolvedConstant(entry.cell))?;
            self.write_entry(value, writer)?;
        }
        Ok(())
    }

    fn write_entry<W: WriteBytesExt>(&self, value: &ConstValue, writer: &mut W) -> Result<(), Error> {
        value.tag().byte().serialize(writer)?;
        match value {
            // Never stored in the layout
            ConstValue::Zero => (),
            ConstValue::Utf8(string) => {
                let bytes = encode_modified_utf8(string);
                let len = u16::try_from(bytes.len()).map_err(|_| Error::Utf8TooLong(bytes.len()))?;
                len.serialize(writer)?;
                writer.write_all(&bytes)?;
            }
            ConstValue::Integer(integer) => integer.serialize(writer)?,
            ConstValue::Float(bits) => bits.serialize(writer)?,
            ConstValue::Long(long) => long.serialize(writer)?,
            ConstValue::Double(bits) => bits.serialize(writer)?,
            ConstValue::MethodHandle(kind, member) => {
                kind.byte().serialize(writer)?;
                self.index_of(*member)?.serialize(writer)?;
            }
            ConstValue::Dynamic(bootstrap, name_and_type)
            | ConstValue::InvokeDynamic(bootstrap, name_and_type) => {
                bootstrap.0.serialize(writer)?;
                self.index_of(*name_and_type)?.serialize(writer)?;
            }
            _ => {
                for nested in value.references() {
                    self.index_of(nested)?.serialize(writer)?;
                }
            }
        }
        Ok(())
    }

    fn push_slot(&mut self, binding: Binding) -> ConstCell {
        let cell = ConstCell(self.slots.len() as u32);
        self.slots.push(Slot {
            binding,
            index: None,
            rank: ReferenceRank::None,
        });
        cell
    }

    fn slot(&self, cell: ConstCell) -> Result<&Slot, Error> {
        self.slots
            .get(cell.0 as usize)
            .ok_or(Error::UnresolvedConstant(cell))
    }

    /// Follow aliases to the cell that owns the binding
    fn canonical(&self, mut cell: ConstCell) -> ConstCell {
        while let Some(Slot {
            binding: Binding::Alias(target),
            ..
        }) = self.slots.get(cell.0 as usize)
        {
            cell = *target;
        }
        cell
    }

    /// Turn a forward cell into an alias, carrying its rank over to the target
    fn bind(&mut self, cell: ConstCell, target: ConstCell) {
        let target = self.canonical(target);
        if cell == target {
            return;
        }
        let rank = self.slots[cell.0 as usize].rank;
        self.slots[cell.0 as usize].binding = Binding::Alias(target);
        self.set_rank(target, rank);
    }

    fn find(&self, value: &ConstValue) -> Option<ConstCell> {
        if let Some(cell) = self.structural.get(value) {
            return Some(*cell);
        }
        self.value_key(value)
            .and_then(|key| self.by_value.get(&key).copied())
    }

    fn cell_key(&self, cell: ConstCell) -> Option<ValueKey> {
        let cell = self.canonical(cell);
        match &self.slots.get(cell.0 as usize)?.binding {
            Binding::Value(value) => self.value_key(value),
            Binding::Promote(tag, name) => Some(ValueKey::Nested {
                tag: *tag,
                extra: 0,
                nested: vec![self.cell_key(*name)?],
            }),
            Binding::Alias(_) | Binding::Index(_, _) => None,
        }
    }

    /// Key for by-value comparisons, or `None` if some nested entry isn't known yet
    fn value_key(&self, value: &ConstValue) -> Option<ValueKey> {
        let key = match value {
            ConstValue::Zero => ValueKey::Zero,
            ConstValue::Utf8(string) => ValueKey::Utf8(string.clone()),
            ConstValue::Integer(integer) => ValueKey::Integer(*integer),
            ConstValue::Float(bits) => ValueKey::Float(*bits),
            ConstValue::Long(long) => ValueKey::Long(*long),
            ConstValue::Double(bits) => ValueKey::Double(*bits),
            _ => {
                let extra = match value {
                    ConstValue::MethodHandle(kind, _) => kind.byte() as u16,
                    ConstValue::Dynamic(bootstrap, _) | ConstValue::InvokeDynamic(bootstrap, _) => {
                        bootstrap.0
                    }
                    _ => 0,
                };
                let nested = value
                    .references()
                    .map(|cell| self.cell_key(cell))
                    .collect::<Option<Vec<_>>>()?;
                ValueKey::Nested {
                    tag: value.tag(),
                    extra,
                    nested,
                }
            }
        };
        Some(key)
    }
}

/// Shorthands for interning common constants
impl ConstPool {
    pub fn utf8(&mut self, string: impl Into<String>) -> Result<ConstCell, Error> {
        self.intern(ConstValue::Utf8(string.into()))
    }

    pub fn integer(&mut self, integer: i32) -> Result<ConstCell, Error> {
        self.intern(ConstValue::Integer(integer))
    }

    pub fn float(&mut self, float: f32) -> Result<ConstCell, Error> {
        self.intern(ConstValue::float(float))
    }

    pub fn long(&mut self, long: i64) -> Result<ConstCell, Error> {
        self.intern(ConstValue::Long(long))
    }

    pub fn double(&mut self, double: f64) -> Result<ConstCell, Error> {
        self.intern(ConstValue::double(double))
    }

    pub fn string(&mut self, string: impl Into<String>) -> Result<ConstCell, Error> {
        let utf8 = self.utf8(string)?;
        self.intern(ConstValue::String(utf8))
    }

    pub fn class(&mut self, name: impl Into<String>) -> Result<ConstCell, Error> {
        let utf8 = self.utf8(name)?;
        self.intern(ConstValue::Class(utf8))
    }

    pub fn name_and_type(
        &mut self,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern(ConstValue::NameAndType(name, descriptor))
    }

    pub fn field_ref(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let class = self.class(class)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern(ConstValue::FieldRef(class, name_and_type))
    }

    pub fn method_ref(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let class = self.class(class)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern(ConstValue::MethodRef(class, name_and_type))
    }

    pub fn interface_method_ref(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let class = self.class(class)?;
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern(ConstValue::InterfaceMethodRef(class, name_and_type))
    }

    pub fn method_handle(&mut self, kind: HandleKind, member: ConstCell) -> Result<ConstCell, Error> {
        self.intern(ConstValue::MethodHandle(kind, member))
    }

    pub fn method_type(&mut self, descriptor: impl Into<String>) -> Result<ConstCell, Error> {
        let descriptor = self.utf8(descriptor)?;
        self.intern(ConstValue::MethodType(descriptor))
    }

    pub fn invoke_dynamic(
        &mut self,
        bootstrap: BootstrapIndex,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern(ConstValue::InvokeDynamic(bootstrap, name_and_type))
    }

    pub fn dynamic(
        &mut self,
        bootstrap: BootstrapIndex,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Result<ConstCell, Error> {
        let name_and_type = self.name_and_type(name, descriptor)?;
        self.intern(ConstValue::Dynamic(bootstrap, name_and_type))
    }

    pub fn module(&mut self, name: impl Into<String>) -> Result<ConstCell, Error> {
        let utf8 = self.utf8(name)?;
        self.intern(ConstValue::Module(utf8))
    }

    pub fn package(&mut self, name: impl Into<String>) -> Result<ConstCell, Error> {
        let utf8 = self.utf8(name)?;
        self.intern(ConstValue::Package(utf8))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::Diagnostics;

    fn finalized(pool: &mut ConstPool) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        pool.finalize(&mut diagnostics).unwrap();
        diagnostics
    }

    #[test]
    fn interning_is_idempotent() {
        let mut pool = ConstPool::new();
        let foo1 = pool.utf8("Foo").unwrap();
        let foo2 = pool.utf8("Foo").unwrap();
        let bar = pool.utf8("Bar").unwrap();
        assert_eq!(foo1, foo2);
        assert_ne!(foo1, bar);

        let class1 = pool.class("Foo").unwrap();
        let class2 = pool.class("Foo").unwrap();
        assert_eq!(class1, class2);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn zero_is_never_an_entry() {
        let mut pool = ConstPool::new();
        assert_eq!(pool.intern(ConstValue::Zero).unwrap(), ConstCell::ZERO);
        assert!(pool.is_empty());
        assert_eq!(pool.index_of(ConstCell::ZERO).unwrap(), 0);
        assert!(pool.is_set(ConstCell::ZERO));
    }

    #[test]
    fn indices_follow_insertion_order() {
        let mut pool = ConstPool::new();
        let long = pool.long(1).unwrap();
        let utf8 = pool.utf8("after").unwrap();
        let double = pool.double(2.5).unwrap();
        let integer = pool.integer(3).unwrap();
        assert!(!pool.is_set(long));
        finalized(&mut pool);

        assert_eq!(pool.index_of(long).unwrap(), 1);
        assert_eq!(pool.index_of(utf8).unwrap(), 3);
        assert_eq!(pool.index_of(double).unwrap(), 4);
        assert_eq!(pool.index_of(integer).unwrap(), 6);
    }

    #[test]
    fn finalized_pool_rejects_new_entries() {
        let mut pool = ConstPool::new();
        pool.utf8("kept").unwrap();
        finalized(&mut pool);
        assert!(pool.utf8("kept").is_ok());
        assert!(matches!(pool.utf8("new"), Err(Error::PoolFinalized)));
    }

    #[test]
    fn ranks_only_go_up() {
        let mut pool = ConstPool::new();
        let cell = pool.integer(7).unwrap();
        assert_eq!(pool.rank(cell), ReferenceRank::None);
        pool.set_rank(cell, ReferenceRank::Ldc);
        pool.set_rank(cell, ReferenceRank::Any);
        pool.set_rank(cell, ReferenceRank::None);
        assert_eq!(pool.rank(cell), ReferenceRank::Ldc);
    }

    #[test]
    fn promoted_name_reuses_existing_class() {
        let mut pool = ConstPool::new();
        let name = pool.utf8("java/lang/Object").unwrap();
        let forward = pool.promote(ConstTag::Class, name).unwrap();
        pool.set_rank(forward, ReferenceRank::Ldc);
        let class = pool.class("java/lang/Object").unwrap();
        assert!(pool.value_eq(forward, class));

        assert_eq!(pool.resolve(forward).unwrap(), class);
        assert_eq!(pool.rank(class), ReferenceRank::Ldc);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn promoted_name_is_synthesized_at_finalize() {
        let mut pool = ConstPool::new();
        let name = pool.utf8("Missing").unwrap();
        let forward = pool.promote(ConstTag::Class, name).unwrap();
        finalized(&mut pool);
        assert_eq!(pool.index_of(forward).unwrap(), 2);
        assert_eq!(pool.get(forward), Some(&ConstValue::Class(name)));
    }

    #[test]
    fn only_wrappers_can_be_promoted() {
        let mut pool = ConstPool::new();
        let name = pool.utf8("x").unwrap();
        assert!(pool.promote(ConstTag::FieldRef, name).is_err());
    }

    #[test]
    fn by_value_equality_looks_through_cells() {
        let mut pool = ConstPool::new();
        let method1 = pool.method_ref("A", "f", "()V").unwrap();
        let method2 = pool.method_ref("A", "f", "()V").unwrap();
        let method3 = pool.method_ref("A", "g", "()V").unwrap();
        assert_eq!(method1, method2);
        assert!(pool.value_eq(method1, method2));
        assert!(!pool.value_eq(method1, method3));
    }

    #[test]
    fn explicit_references() {
        let mut pool = ConstPool::new();
        let long = pool.long(5).unwrap();
        let integer = pool.integer(5).unwrap();
        let to_integer = pool.reference(3, Position(1)).unwrap();
        let to_zero = pool.reference(0, Position(2)).unwrap();
        let diagnostics = finalized(&mut pool);

        assert_eq!(pool.index_of(long).unwrap(), 1);
        assert_eq!(pool.index_of(to_integer).unwrap(), pool.index_of(integer).unwrap());
        assert_eq!(pool.index_of(to_zero).unwrap(), 0);
        assert_eq!(diagnostics.warnings().len(), 1);
        assert_eq!(diagnostics.warnings()[0].id, "warn.cpool.zero.ref");
        assert_eq!(diagnostics.warnings()[0].position, Position(2));
    }

    #[test]
    fn reference_into_second_slot_is_fatal() {
        let mut pool = ConstPool::new();
        pool.long(5).unwrap();
        pool.reference(2, Position::UNKNOWN).unwrap();
        let mut diagnostics = Diagnostics::new();
        assert!(matches!(
            pool.finalize(&mut diagnostics),
            Err(Error::InvalidConstantReference(2))
        ));
    }

    #[test]
    fn bootstrap_methods_are_deduplicated_and_checked() {
        let mut pool = ConstPool::new();
        let target = pool.method_ref("A", "bsm", "()V").unwrap();
        let handle = pool.method_handle(HandleKind::InvokeStatic, target).unwrap();
        let first = pool.bootstrap(handle, vec![]).unwrap();
        let second = pool.bootstrap(handle, vec![]).unwrap();
        assert_eq!(first, second);
        assert_eq!(pool.bootstrap_methods().len(), 1);

        pool.invoke_dynamic(BootstrapIndex(1), "run", "()V").unwrap();
        let mut diagnostics = Diagnostics::new();
        assert!(matches!(
            pool.finalize(&mut diagnostics),
            Err(Error::UndefinedBootstrapMethod(1))
        ));
    }

    #[test]
    fn writes_entries() {
        let mut pool = ConstPool::new();
        pool.class("A").unwrap();
        pool.long(-1).unwrap();
        finalized(&mut pool);

        let mut bytes: Vec<u8> = vec![];
        pool.write(&mut bytes).unwrap();
        assert_eq!(
            bytes,
            vec![
                0, 5, // count (includes the reserved slot and the second half of the long)
                1, 0, 1, b'A', // utf8
                7, 0, 1, // class
                5, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // long
            ]
        );
    }
}
