//! The execution loop.
//!
//! Features and behaviors:
//! - Memory tape (5,000 cells by default) initialized to 0.
//! - Strict pointer bounds: moving left from cell 0 or right past the end
//!   returns an error.
//! - Input `,` reads the next staged byte; on EOF the cell is set to 0
//!   (or left alone, see [`EofBehavior`]).
//! - Output `.` appends the current cell to the output buffer.
//! - Nested loops `[]` jump through a table built before execution.
//! - `^x` defines label `x`, `vx` jumps to it; `#` toggles comments.
//! - Any other character is ignored.

use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::{debug, trace};

use crate::buffer::{EofBehavior, InputBuffer, OutputBuffer};
use crate::error::{BracketKind, InterpreterError};
use crate::lexer::{COMMENT, JUMP, LABEL_DEF};
use crate::program::{Limits, Program};
use crate::tape::Tape;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Option<Arc<AtomicBool>>) -> Self {
        Self { max_steps, cancel_flag }
    }

    fn check(&self, step: usize) -> Result<(), InterpreterError> {
        if let Some(flag) = &self.cancel_flag {
            if flag.load(Ordering::Relaxed) {
                return Err(InterpreterError::Canceled);
            }
        }
        if let Some(max) = self.max_steps {
            if step >= max {
                return Err(InterpreterError::StepLimitExceeded { limit: max });
            }
        }
        Ok(())
    }
}

/// What a single step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MovePointer { to: usize },
    Increment { cell: usize, from: u8, to: u8 },
    Decrement { cell: usize, from: u8, to: u8 },
    Output { byte: u8 },
    Input { byte: Option<u8>, stored: u8 },
    EnterLoop,
    SkipLoop { to: usize },
    RepeatLoop { to: usize },
    ExitLoop,
    DefineLabel { label: char },
    Jump { label: char, to: usize },
    Nothing,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MovePointer { to } => write!(f, "Moved pointer head to index {to}"),
            Action::Increment { cell, from, to } => write!(f, "Increment cell[{cell}] from {from} to {to}"),
            Action::Decrement { cell, from, to } => write!(f, "Decrement cell[{cell}] from {from} to {to}"),
            Action::Output { byte } => write!(f, "Output byte {byte}"),
            Action::Input { byte: Some(b), .. } => write!(f, "Read input byte {b}"),
            Action::Input { byte: None, stored } => write!(f, "End of input; cell is {stored}"),
            Action::EnterLoop => write!(f, "Enter loop (cell != 0)"),
            Action::SkipLoop { to } => write!(f, "Cell is 0; jump forward to IP {to}"),
            Action::RepeatLoop { to } => write!(f, "Cell != 0; jump back to IP {to}"),
            Action::ExitLoop => write!(f, "Exit loop (cell is 0)"),
            Action::DefineLabel { label } => write!(f, "Label '{label}'"),
            Action::Jump { label, to } => write!(f, "Jump to label '{label}' at IP {to}"),
            Action::Nothing => write!(f, "No-op"),
        }
    }
}

/// One row of a traced run, captured before the step's effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    pub step: usize,
    pub ip: usize,
    pub ptr: usize,
    pub cell: u8,
    pub instr: char,
    pub action: Action,
}

/// Interpreter for a single program.
///
/// The interpreter holds:
/// - the program code as a `String`,
/// - the capacities for the tape, buffers, labels and program length,
/// - the staged input,
/// - the tape and output left behind by the most recent run.
///
/// Each run starts from a zeroed tape, an empty output buffer and the first
/// staged input byte.
pub struct Interpreter {
    code: String,
    limits: Limits,
    eof: EofBehavior,
    input: InputBuffer,
    tape: Tape,
    output: OutputBuffer,
}

impl Interpreter {
    /// Create a new interpreter with the default capacities.
    pub fn new(code: String) -> Self {
        Self::with_limits(code, Limits::default())
    }

    /// Create a new interpreter with custom capacities.
    pub fn with_limits(code: String, limits: Limits) -> Self {
        Self {
            code,
            limits,
            eof: EofBehavior::default(),
            input: InputBuffer::new(limits.buffer_capacity),
            tape: Tape::new(limits.tape_cells),
            output: OutputBuffer::new(limits.buffer_capacity),
        }
    }

    /// Stage bytes for `,` to read. Can be called more than once.
    pub fn set_input(&mut self, bytes: &[u8]) -> Result<(), InterpreterError> {
        self.input.stage(bytes)
    }

    pub fn set_eof_behavior(&mut self, eof: EofBehavior) {
        self.eof = eof;
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Output produced by the most recent run.
    pub fn output(&self) -> &[u8] {
        self.output.as_bytes()
    }

    /// Tape as left by the most recent run.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Execute the program until completion.
    pub fn run(&mut self) -> Result<(), InterpreterError> {
        self.execute(None, &StepControl::default())
    }

    /// Execute, recording one [`TraceRow`] per step.
    pub fn run_traced(&mut self) -> Result<Vec<TraceRow>, InterpreterError> {
        let mut rows = Vec::new();
        self.execute(Some(&mut rows), &StepControl::default())?;
        Ok(rows)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control(&mut self, step_control: StepControl) -> Result<(), InterpreterError> {
        self.execute(None, &step_control)
    }

    /// Traced run with cooperative cancellation and optional step limit.
    ///
    /// On failure the rows recorded so far are returned alongside the error.
    pub fn run_traced_with_control(
        &mut self,
        step_control: StepControl,
    ) -> Result<Vec<TraceRow>, (InterpreterError, Vec<TraceRow>)> {
        let mut rows = Vec::new();
        match self.execute(Some(&mut rows), &step_control) {
            Ok(()) => Ok(rows),
            Err(e) => Err((e, rows)),
        }
    }

    fn execute(
        &mut self,
        mut trace_rows: Option<&mut Vec<TraceRow>>,
        step_control: &StepControl,
    ) -> Result<(), InterpreterError> {
        let program = Program::prescan(&self.code, &self.limits)?;

        self.tape = Tape::new(self.limits.tape_cells);
        self.output = OutputBuffer::new(self.limits.buffer_capacity);
        self.input.rewind();

        let chars = program.chars();
        let code_len = chars.len();
        let mut code_ptr = 0;
        let mut in_comment = false;
        let mut step: usize = 0;

        while code_ptr < code_len {
            let instr = chars[code_ptr];

            if instr == COMMENT {
                in_comment = !in_comment;
                code_ptr += 1;
                continue;
            }
            if in_comment {
                code_ptr += 1;
                continue;
            }

            step_control.check(step)?;

            let (ptr_before, cell_before) = (self.tape.pointer(), self.tape.read());
            let mut next_ptr = code_ptr + 1;

            let action = match instr {
                '>' | '<' => {
                    let delta = if instr == '>' { 1 } else { -1 };
                    if !self.tape.shift(delta) {
                        return Err(InterpreterError::TapeBoundsExceeded {
                            ip: code_ptr,
                            ptr: ptr_before,
                            op: instr,
                        });
                    }
                    Action::MovePointer { to: self.tape.pointer() }
                }
                '+' => Action::Increment {
                    cell: ptr_before,
                    from: cell_before,
                    to: self.tape.increment(),
                },
                '-' => Action::Decrement {
                    cell: ptr_before,
                    from: cell_before,
                    to: self.tape.decrement(),
                },
                '.' => {
                    self.output.emit(cell_before, code_ptr)?;
                    Action::Output { byte: cell_before }
                }
                ',' => {
                    let byte = self.input.next_byte();
                    match (byte, self.eof) {
                        (Some(b), _) => self.tape.write(b),
                        (None, EofBehavior::Zero) => self.tape.write(0),
                        (None, EofBehavior::Unchanged) => {}
                    }
                    Action::Input { byte, stored: self.tape.read() }
                }
                '[' => {
                    if cell_before == 0 {
                        let close = program.brackets().partner(code_ptr).ok_or(
                            InterpreterError::UnbalancedBrackets {
                                ip: code_ptr,
                                kind: BracketKind::Open,
                            },
                        )?;
                        next_ptr = close + 1;
                        Action::SkipLoop { to: next_ptr }
                    } else {
                        Action::EnterLoop
                    }
                }
                ']' => {
                    if cell_before != 0 {
                        let open = program.brackets().partner(code_ptr).ok_or(
                            InterpreterError::UnbalancedBrackets {
                                ip: code_ptr,
                                kind: BracketKind::Close,
                            },
                        )?;
                        next_ptr = open + 1;
                        Action::RepeatLoop { to: next_ptr }
                    } else {
                        Action::ExitLoop
                    }
                }
                LABEL_DEF => {
                    // The operand was consumed by the pre-scan.
                    next_ptr = code_ptr + 2;
                    Action::DefineLabel { label: chars[code_ptr + 1] }
                }
                JUMP => {
                    let label = chars[code_ptr + 1];
                    next_ptr = program.labels().resolve(label, code_ptr)?;
                    trace!("jump at {code_ptr} to label '{label}' -> {next_ptr}");
                    Action::Jump { label, to: next_ptr }
                }
                _ => Action::Nothing,
            };

            if let Some(rows) = trace_rows.as_deref_mut() {
                rows.push(TraceRow {
                    step,
                    ip: code_ptr,
                    ptr: ptr_before,
                    cell: cell_before,
                    instr,
                    action,
                });
            }

            step += 1;
            code_ptr = next_ptr;
        }

        debug!(
            "run finished after {step} step(s); {} byte(s) of output",
            self.output.len()
        );
        Ok(())
    }
}

/// Run `code` once against `input` with default capacities and return the output bytes.
pub fn interpret(code: &str, input: &[u8]) -> Result<Vec<u8>, InterpreterError> {
    let mut interpreter = Interpreter::new(code.to_string());
    interpreter.set_input(input)?;
    interpreter.run()?;
    Ok(interpreter.output.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Channel;

    fn small(code: &str) -> Interpreter {
        Interpreter::with_limits(
            code.to_string(),
            Limits { tape_cells: 10, ..Limits::default() },
        )
    }

    #[test]
    fn increments_then_output_emit_count() {
        assert_eq!(interpret("+++.", b"").unwrap(), vec![3]);
        assert_eq!(interpret("+.", b"").unwrap(), vec![1]);
    }

    #[test]
    fn other_characters_are_ignored() {
        assert_eq!(interpret("+a+ b.", b"").unwrap(), vec![2]);
    }

    #[test]
    fn unmatched_open_bracket_fails_before_any_cell_is_touched() {
        let mut bf = small("+[[");
        let result = bf.run();
        assert!(matches!(result, Err(InterpreterError::UnbalancedBrackets { kind: BracketKind::Open, .. })));
        assert!(bf.tape().cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn left_pointer_out_of_bounds_errors() {
        let mut bf = small("<");
        let result = bf.run();
        assert!(matches!(result, Err(InterpreterError::TapeBoundsExceeded { ip: 0, ptr: 0, op: '<' })));
    }

    #[test]
    fn right_pointer_out_of_bounds_errors() {
        // With 3 cells (0..=2), the 3rd '>' attempts to move beyond index 2.
        let memory_size = 3;
        let code = ">".repeat(memory_size);
        let mut bf = Interpreter::with_limits(code, Limits { tape_cells: memory_size, ..Limits::default() });
        let result = bf.run();
        assert!(matches!(result, Err(InterpreterError::TapeBoundsExceeded { ip: 2, ptr: 2, op: '>' })));
    }

    #[test]
    fn loop_counts_down_to_zero() {
        // Five '+' then a decrementing loop: 5 iterations leave the cell at 0.
        let mut bf = small("+++++[-]");
        let rows = bf.run_traced().unwrap();
        assert_eq!(bf.tape().read(), 0);
        let iterations = rows.iter().filter(|r| r.instr == '-').count();
        assert_eq!(iterations, 5);
    }

    #[test]
    fn incrementing_loop_wraps_to_zero() {
        // Cell starts at 5; [+] climbs 6, 7, ... 255, 0 and stops.
        let mut bf = small(",[+]");
        bf.set_input(&[5]).unwrap();
        let rows = bf.run_traced().unwrap();
        assert_eq!(bf.tape().read(), 0);
        assert_eq!(rows.iter().filter(|r| r.instr == '+').count(), 251);
    }

    #[test]
    fn empty_loop_on_zero_cell_is_ok() {
        let mut bf = small("[]");
        assert!(bf.run().is_ok());
    }

    #[test]
    fn skipped_loop_jumps_past_its_close() {
        let mut bf = small("[+++]+.");
        bf.run().unwrap();
        assert_eq!(bf.output(), &[1]);
    }

    #[test]
    fn wrapping_subtraction() {
        let mut bf = Interpreter::with_limits("-".to_string(), Limits { tape_cells: 1, ..Limits::default() });
        bf.run().unwrap();
        assert_eq!(bf.tape().read(), 255);
    }

    #[test]
    fn wrapping_addition() {
        let code = "+".repeat(256);
        let mut bf = Interpreter::with_limits(code, Limits { tape_cells: 1, ..Limits::default() });
        bf.run().unwrap();
        assert_eq!(bf.tape().read(), 0);
    }

    #[test]
    fn input_is_read_then_eof_writes_zero() {
        assert_eq!(interpret(",.,.", b"A").unwrap(), vec![b'A', 0]);
    }

    #[test]
    fn eof_can_leave_cell_unchanged() {
        let mut bf = small("+++,.");
        bf.set_eof_behavior(EofBehavior::Unchanged);
        bf.run().unwrap();
        assert_eq!(bf.output(), &[3]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(interpret("+# ++ . [ #.", b"").unwrap(), vec![1]);
    }

    #[test]
    fn label_definition_is_a_no_op() {
        // '+' as a label name must not increment.
        assert_eq!(interpret("^+.", b"").unwrap(), vec![0]);
    }

    #[test]
    fn forward_jump_skips_code() {
        assert_eq!(interpret("+vx+++^x.", b"").unwrap(), vec![1]);
    }

    #[test]
    fn backward_jump_loops() {
        // Count to 3 with a label loop guarded by a bracket exit.
        let code = "+++>+++<^a-.>-<[va]";
        assert_eq!(interpret(code, b"").unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn unconditional_jump_loop_hits_step_limit() {
        let mut bf = small("^a+va");
        let result = bf.run_with_control(StepControl::new(Some(50), None));
        assert!(matches!(result, Err(InterpreterError::StepLimitExceeded { limit: 50 })));
    }

    #[test]
    fn jump_lands_right_after_label() {
        let mut bf = small("^a+va");
        let rows = match bf.run_traced_with_control(StepControl::new(Some(4), None)) {
            Err((InterpreterError::StepLimitExceeded { .. }, rows)) => rows,
            other => panic!("expected step limit, got {:?}", other.map(|r| r.len()).map_err(|(e, _)| e)),
        };
        let ips: Vec<usize> = rows.iter().map(|r| r.ip).collect();
        assert_eq!(ips, vec![0, 2, 3, 2]);
    }

    #[test]
    fn unknown_label_errors_at_runtime() {
        let mut bf = small("+vq");
        let result = bf.run();
        assert!(matches!(result, Err(InterpreterError::UnknownLabel { ip: 1, label: 'q' })));
        assert_eq!(bf.tape().read(), 1);
    }

    #[test]
    fn unreached_unknown_jump_is_fine() {
        assert_eq!(interpret("[vq]+.", b"").unwrap(), vec![1]);
    }

    #[test]
    fn output_overflow_is_buffer_full() {
        let mut bf = Interpreter::with_limits("...".to_string(), Limits { buffer_capacity: 2, ..Limits::default() });
        let result = bf.run();
        assert!(matches!(result, Err(InterpreterError::BufferFull { channel: Channel::Output, ip: Some(2), .. })));
    }

    #[test]
    fn cancel_flag_aborts() {
        let flag = Arc::new(AtomicBool::new(true));
        let mut bf = small("+");
        let result = bf.run_with_control(StepControl::new(None, Some(flag)));
        assert!(matches!(result, Err(InterpreterError::Canceled)));
    }

    #[test]
    fn each_run_starts_fresh() {
        let mut bf = small(",.");
        bf.set_input(b"z").unwrap();
        bf.run().unwrap();
        bf.run().unwrap();
        assert_eq!(bf.output(), b"z");
    }

    #[test]
    fn trace_describes_actions() {
        let mut bf = small(">+");
        let rows = bf.run_traced().unwrap();
        assert_eq!(rows[0].action.to_string(), "Moved pointer head to index 1");
        assert_eq!(rows[1].action, Action::Increment { cell: 1, from: 0, to: 1 });
    }
}
