use crate::error::{BracketKind, InterpreterError};

/// Static `[`/`]` pairing for O(1) loop jumps.
///
/// `partner[i]` holds the matching index for a bracket at `i`; every other
/// position is `None`.
#[derive(Debug, Clone, Default)]
pub struct BracketMap {
    partner: Vec<Option<usize>>,
    open: Vec<usize>,
}

impl BracketMap {
    /// Start an empty map for a program of `len` chars.
    pub fn with_len(len: usize) -> Self {
        Self {
            partner: vec![None; len],
            open: Vec::new(),
        }
    }

    /// Feed an opening bracket found at `ip`.
    pub fn open(&mut self, ip: usize) {
        self.open.push(ip);
    }

    /// Feed a closing bracket found at `ip`, pairing it with the innermost open one.
    pub fn close(&mut self, ip: usize) -> Result<(), InterpreterError> {
        let Some(open_index) = self.open.pop() else {
            return Err(InterpreterError::UnbalancedBrackets {
                ip,
                kind: BracketKind::Close,
            });
        };
        self.partner[open_index] = Some(ip);
        self.partner[ip] = Some(open_index);
        Ok(())
    }

    /// Check that every opening bracket was closed.
    pub fn finish(mut self) -> Result<Self, InterpreterError> {
        if let Some(unmatched_open) = self.open.pop() {
            return Err(InterpreterError::UnbalancedBrackets {
                ip: unmatched_open,
                kind: BracketKind::Open,
            });
        }
        Ok(self)
    }

    pub fn partner(&self, ip: usize) -> Option<usize> {
        self.partner.get(ip).copied().flatten()
    }

    pub fn pairs(&self) -> usize {
        self.partner.iter().flatten().count() / 2
    }
}
