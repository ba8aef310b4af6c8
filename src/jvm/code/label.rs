use crate::jvm::Error;
use std::collections::HashMap;
use std::fmt;

/// Opaque label, resolved to a program counter once its code is laid out
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Label(pub(super) u32);

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.0))
    }
}

/// Labels of one code body, with where each one was placed
///
/// Labels can be referenced before they are placed. A label is placed at most once, in front of
/// the instruction pushed next (or at the very end of the code if nothing follows).
#[derive(Default, Debug)]
pub struct LabelTable {
    names: Vec<String>,
    placements: Vec<Option<usize>>,
    by_name: HashMap<String, Label>,
}

impl LabelTable {
    pub fn new() -> LabelTable {
        LabelTable::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the label with this name, creating it if needed
    pub fn named(&mut self, name: &str) -> Label {
        if let Some(label) = self.by_name.get(name) {
            return *label;
        }
        let label = self.push(name.to_owned());
        self.by_name.insert(name.to_owned(), label);
        label
    }

    /// Generate a fresh anonymous label
    pub fn fresh(&mut self) -> Label {
        let name = format!("l{}", self.names.len());
        self.push(name)
    }

    /// Place a label in front of the instruction at the given position
    pub fn place(&mut self, label: Label, instruction: usize) -> Result<(), Error> {
        let placement = self
            .placements
            .get_mut(label.0 as usize)
            .ok_or(Error::LabelOutsideCode(label))?;
        if placement.is_some() {
            return Err(Error::DuplicateLabel(self.name(label).to_owned()));
        }
        *placement = Some(instruction);
        Ok(())
    }

    /// Position of the instruction the label was placed in front of
    pub fn placement(&self, label: Label) -> Result<usize, Error> {
        match self.placements.get(label.0 as usize) {
            Some(Some(instruction)) => Ok(*instruction),
            Some(None) => Err(Error::UndefinedLabel(self.name(label).to_owned())),
            None => Err(Error::LabelOutsideCode(label)),
        }
    }

    pub fn name(&self, label: Label) -> &str {
        self.names.get(label.0 as usize).map_or("", String::as_str)
    }

    fn push(&mut self, name: String) -> Label {
        let label = Label(self.names.len() as u32);
        self.names.push(name);
        self.placements.push(None);
        label
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn named_labels_are_shared() {
        let mut labels = LabelTable::new();
        let first = labels.named("loop");
        let fresh = labels.fresh();
        assert_eq!(labels.named("loop"), first);
        assert_ne!(fresh, first);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn placement_errors() {
        let mut labels = LabelTable::new();
        let label = labels.named("exit");
        assert!(matches!(labels.placement(label), Err(Error::UndefinedLabel(name)) if name == "exit"));

        labels.place(label, 3).unwrap();
        assert_eq!(labels.placement(label).unwrap(), 3);
        assert!(matches!(labels.place(label, 4), Err(Error::DuplicateLabel(name)) if name == "exit"));
    }
}
