use crate::error::InterpreterError;

/// Default number of distinct labels a program may define.
pub const DEFAULT_LABEL_CAPACITY: usize = 20;

/// Bounded map from a single-character label to a program position.
///
/// The first definition of a label wins; later ones are ignored and do not
/// count against capacity.
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: Vec<(char, usize)>,
    capacity: usize,
}

impl LabelTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `label` at `position`. `ip` is the defining instruction.
    ///
    /// Returns `Ok(false)` when the label already existed.
    pub fn register(&mut self, label: char, position: usize, ip: usize) -> Result<bool, InterpreterError> {
        if self.lookup(label).is_some() {
            return Ok(false);
        }
        if self.entries.len() >= self.capacity {
            return Err(InterpreterError::LabelTableFull {
                ip,
                label,
                capacity: self.capacity,
            });
        }
        self.entries.push((label, position));
        Ok(true)
    }

    /// Position recorded for `label`. `ip` is the jumping instruction.
    pub fn resolve(&self, label: char, ip: usize) -> Result<usize, InterpreterError> {
        self.lookup(label)
            .ok_or(InterpreterError::UnknownLabel { ip, label })
    }

    fn lookup(&self, label: char) -> Option<usize> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, pos)| pos)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(DEFAULT_LABEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_definition_wins() {
        let mut table = LabelTable::new(4);
        assert!(table.register('a', 2, 0).unwrap());
        assert!(!table.register('a', 9, 7).unwrap());
        assert_eq!(table.resolve('a', 0).unwrap(), 2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn unknown_label_is_an_error() {
        let table = LabelTable::new(4);
        let err = table.resolve('z', 5).unwrap_err();
        assert!(matches!(err, InterpreterError::UnknownLabel { ip: 5, label: 'z' }));
    }

    #[test]
    fn capacity_is_enforced_for_new_labels_only() {
        let mut table = LabelTable::new(1);
        table.register('a', 2, 0).unwrap();
        assert!(table.register('a', 4, 2).is_ok());
        let err = table.register('b', 6, 4).unwrap_err();
        assert!(matches!(err, InterpreterError::LabelTableFull { label: 'b', capacity: 1, .. }));
    }
}
