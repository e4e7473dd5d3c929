use std::fmt;

/// Errors that can occur while checking or running a program.
///
/// Every variant is fatal to the run that raised it.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// The program text is longer than the configured program capacity.
    #[error("Program too long: {len} characters (capacity {capacity})")]
    ProgramTooLong { len: usize, capacity: usize },

    /// A label marker (`^` or `v`) is the last character of the program.
    #[error("Missing label after '{marker}' at instruction {ip}")]
    MissingLabel { ip: usize, marker: char },

    /// Loops were not balanced; a matching `[` or `]` was not found.
    #[error("Unmatched bracket {kind} at instruction {ip}")]
    UnbalancedBrackets { ip: usize, kind: BracketKind },

    /// More distinct labels were defined than the label table holds.
    #[error("Label table full: cannot register '{label}' at instruction {ip} (capacity {capacity})")]
    LabelTableFull { ip: usize, label: char, capacity: usize },

    /// A jump referenced a label that was never defined.
    #[error("Unknown label '{label}' at instruction {ip}")]
    UnknownLabel { ip: usize, label: char },

    /// The data pointer attempted to move left of cell 0 or beyond the last cell.
    #[error("Tape bounds exceeded at instruction {ip} (ptr={ptr}, op='{op}')")]
    TapeBoundsExceeded { ip: usize, ptr: usize, op: char },

    /// A channel buffer is at capacity.
    #[error("{channel} buffer full (capacity {capacity})")]
    BufferFull {
        channel: Channel,
        capacity: usize,
        ip: Option<usize>,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g. Ctrl+C).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl InterpreterError {
    /// Instruction index the error points at, if it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::MissingLabel { ip, .. }
            | Self::UnbalancedBrackets { ip, .. }
            | Self::LabelTableFull { ip, .. }
            | Self::UnknownLabel { ip, .. }
            | Self::TapeBoundsExceeded { ip, .. } => Some(*ip),
            Self::BufferFull { ip, .. } => *ip,
            Self::ProgramTooLong { .. } | Self::StepLimitExceeded { .. } | Self::Canceled => None,
        }
    }

    /// True for errors found before any instruction runs.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            Self::ProgramTooLong { .. }
                | Self::MissingLabel { .. }
                | Self::UnbalancedBrackets { .. }
                | Self::LabelTableFull { .. }
        )
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Which channel buffer overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Input,
    Output,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Input => write!(f, "Input"),
            Channel::Output => write!(f, "Output"),
        }
    }
}
