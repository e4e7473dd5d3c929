//! Pre-scan: validate a program and index its labels and loops.

use log::debug;

use crate::brackets::BracketMap;
use crate::buffer::DEFAULT_BUFFER_CAPACITY;
use crate::error::InterpreterError;
use crate::labels::{DEFAULT_LABEL_CAPACITY, LabelTable};
use crate::lexer::{JUMP, LABEL_DEF, LexemeKind, Lexer};
use crate::tape::DEFAULT_TAPE_CELLS;

/// Default maximum program length in chars.
pub const DEFAULT_PROGRAM_CAPACITY: usize = 5000;

/// Capacities of every fixed-size structure used by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub tape_cells: usize,
    pub buffer_capacity: usize,
    pub label_capacity: usize,
    pub program_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            tape_cells: DEFAULT_TAPE_CELLS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            label_capacity: DEFAULT_LABEL_CAPACITY,
            program_capacity: DEFAULT_PROGRAM_CAPACITY,
        }
    }
}

/// A checked program ready to execute.
#[derive(Debug, Clone)]
pub struct Program {
    chars: Vec<char>,
    brackets: BracketMap,
    labels: LabelTable,
}

impl Program {
    /// Run the pre-scan over `code`.
    ///
    /// Fails on the first static error; nothing is executed here.
    pub fn prescan(code: &str, limits: &Limits) -> Result<Self, InterpreterError> {
        let chars: Vec<char> = code.chars().collect();
        if chars.len() > limits.program_capacity {
            return Err(InterpreterError::ProgramTooLong {
                len: chars.len(),
                capacity: limits.program_capacity,
            });
        }

        let mut brackets = BracketMap::with_len(chars.len());
        let mut labels = LabelTable::new(limits.label_capacity);

        for lexeme in Lexer::new(&chars) {
            let ip = lexeme.start;
            match lexeme.kind {
                LexemeKind::Op('[') => brackets.open(ip),
                LexemeKind::Op(']') => brackets.close(ip)?,
                LexemeKind::LabelDef { label: Some(label) } => {
                    // Target is the instruction right after the label char.
                    if !labels.register(label, ip + 2, ip)? {
                        debug!("label '{label}' redefined at {ip}; keeping the first definition");
                    }
                }
                LexemeKind::LabelDef { label: None } => {
                    return Err(InterpreterError::MissingLabel { ip, marker: LABEL_DEF });
                }
                LexemeKind::Jump { label: None } => {
                    return Err(InterpreterError::MissingLabel { ip, marker: JUMP });
                }
                _ => {}
            }
        }

        let brackets = brackets.finish()?;
        debug!(
            "pre-scan ok: {} chars, {} loop(s), {} label(s)",
            chars.len(),
            brackets.pairs(),
            labels.len()
        );

        Ok(Self { chars, brackets, labels })
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn brackets(&self) -> &BracketMap {
        &self.brackets
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }
}
