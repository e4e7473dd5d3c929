//! A tiny interpreter for a Brainfuck dialect with labels, jumps and comments.
//!
//! Programs run against a fixed-capacity tape (5,000 cells by default) with
//! input staged up front and output collected into a buffer, so a run never
//! touches stdin or stdout itself.
//!
//! Quick start:
//!
//! ```
//! use goto_bf::interpret;
//!
//! // Count down from 3, printing each value, with a label loop.
//! let output = interpret("+++^a.-[va]", b"").unwrap();
//! assert_eq!(output, vec![3, 2, 1]);
//! ```

pub mod brackets;
pub mod buffer;
pub mod cli_util;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod labels;
pub mod lexer;
pub mod program;
pub mod repl;
pub mod tape;

pub use buffer::{EofBehavior, InputBuffer, OutputBuffer};
pub use error::{BracketKind, Channel, InterpreterError};
pub use interpreter::{interpret, Action, Interpreter, StepControl, TraceRow};
pub use labels::LabelTable;
pub use program::{Limits, Program};
pub use tape::Tape;
