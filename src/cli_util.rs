use std::io::{self, Write};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use log::info;

use crate::buffer::EofBehavior;
use crate::interpreter::{Interpreter, StepControl, TraceRow};
use crate::program::Limits;
use crate::InterpreterError;

/// Host-side knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub limits: Limits,
    pub eof: EofBehavior,
    pub max_steps: Option<usize>,
    pub input: Vec<u8>,
    pub debug: bool,
}

/// Ctrl+C routing: cancels the current run, or exits when idle.
#[derive(Clone)]
pub struct Interrupt {
    running: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl Interrupt {
    /// Install the process-wide SIGINT handler.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let interrupt = Self {
            running: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
        };
        let handler = interrupt.clone();
        ctrlc::set_handler(move || {
            if handler.running.load(Ordering::SeqCst) {
                handler.cancel.store(true, Ordering::SeqCst);
            } else {
                let _ = io::stdout().flush();
                let _ = io::stderr().flush();
                std::process::exit(0);
            }
        })?;
        Ok(interrupt)
    }

    fn begin_run(&self) -> Arc<AtomicBool> {
        self.cancel.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        self.cancel.clone()
    }

    fn end_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Run `code` once and report the result.
///
/// On success the output buffer is written to stdout followed by a newline.
/// On failure nothing is written to stdout and the error goes to stderr.
/// Returns whether the run succeeded.
pub fn execute_program(program: Option<&str>, code: &str, opts: &RunOptions, interrupt: Option<&Interrupt>) -> bool {
    let mut interpreter = Interpreter::with_limits(code.to_string(), opts.limits);
    interpreter.set_eof_behavior(opts.eof);
    if let Err(err) = interpreter.set_input(&opts.input) {
        print_interpreter_error(program, code, &err);
        return false;
    }

    let cancel = interrupt.map(Interrupt::begin_run);
    let control = StepControl::new(opts.max_steps, cancel);
    let result = if opts.debug {
        match interpreter.run_traced_with_control(control) {
            Ok(rows) => {
                print_trace(&rows);
                Ok(())
            }
            Err((err, rows)) => {
                print_trace(&rows);
                Err(err)
            }
        }
    } else {
        interpreter.run_with_control(control)
    };
    if let Some(i) = interrupt {
        i.end_run();
    }

    match result {
        Ok(()) => {
            info!("run ok: {} output byte(s)", interpreter.output().len());
            let mut out = io::stdout().lock();
            let _ = out.write_all(interpreter.output());
            let _ = out.write_all(b"\n");
            let _ = out.flush();
            true
        }
        Err(err) => {
            print_interpreter_error(program, code, &err);
            false
        }
    }
}

/// Pretty-print a structured [`InterpreterError`] with caret positioning.
/// If `program` is `Some("gbf")`, messages are prefixed with "gbf: ...".
pub fn print_interpreter_error(program: Option<&str>, code: &str, err: &InterpreterError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    let msg = match err {
        InterpreterError::ProgramTooLong { len, capacity } => {
            format!("Parse error: program is {len} characters long (capacity {capacity})")
        }
        InterpreterError::MissingLabel { marker, .. } => {
            format!("Parse error: missing label after '{marker}'")
        }
        InterpreterError::UnbalancedBrackets { kind, .. } => {
            format!("Parse error: unmatched bracket {kind}")
        }
        InterpreterError::LabelTableFull { label, capacity, .. } => {
            format!("Parse error: too many labels, cannot define '{label}' (capacity {capacity})")
        }
        InterpreterError::UnknownLabel { label, .. } => {
            format!("Runtime error: jump to unknown label '{label}'")
        }
        InterpreterError::TapeBoundsExceeded { ptr, op, .. } => {
            format!("Runtime error: pointer out of bounds (ptr={ptr}, op={op})")
        }
        InterpreterError::BufferFull { channel, capacity, .. } => {
            format!("Runtime error: {} buffer full (capacity {capacity})", channel.to_string().to_lowercase())
        }
        InterpreterError::StepLimitExceeded { .. } | InterpreterError::Canceled => err.to_string(),
    };
    let msg = prefix_program(&msg);

    match err.position() {
        Some(ip) => print_error_with_context(&msg, code, ip),
        None => {
            eprintln!("{msg}");
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at instruction {pos}");

    let (slice, caret) = context_window(code, pos);
    eprintln!("  {}", slice);
    eprintln!("  {}", caret);
    let _ = io::stderr().flush();
}

/// Window of code around `pos` and a caret line pointing at it.
fn context_window(code: &str, pos: usize) -> (String, String) {
    const WINDOW_CHARS: usize = 32;

    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let slice: String = code
        .chars()
        .skip(start_char)
        .take(pos - start_char + WINDOW_CHARS + 1)
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .collect();

    let mut caret = " ".repeat(pos - start_char);
    caret.push('^');
    (slice, caret)
}

/// Print a step-by-step table of a traced run to stdout.
pub fn print_trace(rows: &[TraceRow]) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "STEP | IP  | PTR | CELL | INSTR | ACTION");
    let _ = writeln!(out, "-----+-----+-----+------+-------+------------------------------------------------");
    for row in rows {
        let _ = writeln!(out, "{}", format_trace_row(row));
    }
    let _ = out.flush();
}

fn format_trace_row(row: &TraceRow) -> String {
    format!(
        "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
        row.step, row.ip, row.ptr, row.cell, row.instr, row.action
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Action;

    #[test]
    fn caret_sits_under_position() {
        let (slice, caret) = context_window("++]++", 2);
        assert_eq!(slice, "++]++");
        assert_eq!(caret, "  ^");
    }

    #[test]
    fn window_is_clipped_on_long_programs() {
        let code = format!("{}]", "+".repeat(100));
        let (slice, caret) = context_window(&code, 100);
        assert_eq!(slice.chars().count(), 33);
        assert!(slice.ends_with(']'));
        assert_eq!(caret.len(), 33);
    }

    #[test]
    fn newlines_do_not_break_the_caret_line() {
        let (slice, _) = context_window("+\n]", 2);
        assert_eq!(slice, "+ ]");
    }

    #[test]
    fn trace_row_layout() {
        let row = TraceRow { step: 0, ip: 1, ptr: 0, cell: 0, instr: '>', action: Action::MovePointer { to: 1 } };
        assert_eq!(format_trace_row(&row), "0    | 1   | 0   | 0    |  >    | Moved pointer head to index 1");
    }
}
