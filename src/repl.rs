use std::env;
use std::io::{self, IsTerminal, Read, Write};

use log::info;
use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Signal, StyledText};

use crate::cli_util::{execute_program, Interrupt, RunOptions};
use crate::config::Colors;
use crate::lexer::{LexemeKind, Lexer};

/// Environment variable forcing `bare` or `editor` mode.
pub const MODE_ENV: &str = "GBF_REPL_MODE";
/// Environment variable that makes the editor exit after one run.
pub const ONCE_ENV: &str = "GBF_REPL_ONCE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Pick the mode: flags, then `GBF_REPL_MODE`, then TTY auto-detection.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    let stdin_tty = io::stdin().is_terminal();
    resolve_mode(flag, env::var(MODE_ENV).ok().as_deref(), stdin_tty)
}

fn resolve_mode(flag: ModeFlagOverride, env_mode: Option<&str>, stdin_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_tty {
                return Err(format!("cannot start editor: stdin is not a TTY (use --bare or {MODE_ENV}=bare)"));
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        return match val.trim().to_ascii_lowercase().as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" if stdin_tty => Ok(ReplMode::Editor),
            "editor" => Err(format!("cannot start editor: stdin is not a TTY (use {MODE_ENV}=bare)")),
            _ => Err(format!("invalid {MODE_ENV} value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_tty { Ok(ReplMode::Editor) } else { Ok(ReplMode::Bare) }
}

/// Interactive loop: each submission runs with a fresh tape and buffers.
pub fn repl_loop(opts: &RunOptions, colors: &Colors, interrupt: &Interrupt) -> io::Result<()> {
    let mut editor = init_line_editor(colors)?;

    loop {
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        if submission.trim().is_empty() {
            continue;
        }

        execute_submission(&submission, opts, Some(interrupt));

        if env::var(ONCE_ENV).ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

/// Read stdin until EOF and run it once.
pub fn execute_bare_once(opts: &RunOptions, interrupt: &Interrupt) -> io::Result<()> {
    let mut locked = io::BufReader::new(io::stdin().lock());
    if let Some(s) = read_submission(&mut locked)? {
        if !s.trim().is_empty() {
            execute_submission(&s, opts, Some(interrupt));
        }
    }
    Ok(())
}

/// Runs one submission. Errors are reported on stderr; stdout always gets
/// a trailing newline so the next prompt starts at column 0.
fn execute_submission(code: &str, opts: &RunOptions, interrupt: Option<&Interrupt>) {
    info!("running {} char submission", code.chars().count());
    if !execute_program(None, code, opts, interrupt) {
        println!();
        let _ = io::stdout().flush();
    }
}

/// Collect all lines until EOF. `None` when nothing was read.
pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> io::Result<Option<String>> {
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer)?;
    Ok(if buffer.is_empty() { None } else { Some(buffer) })
}

fn init_line_editor(colors: &Colors) -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
    };

    // Enter inserts a newline; Ctrl+D (Ctrl+Z on Windows) submits the buffer.
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the buffer; Alt or Ctrl with Up/Down walks history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(ProgramHighlighter::new(colors)))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("gbf".to_string()), DefaultPromptSegment::Empty);

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Colors code by what the lexer says it is, so comments and label
/// operands never look like instructions.
struct ProgramHighlighter {
    colors: Colors,
}

impl ProgramHighlighter {
    fn new(colors: &Colors) -> Self {
        Self { colors: colors.clone() }
    }

    fn style_for(&self, kind: LexemeKind) -> Style {
        let c = &self.colors;
        let color = match kind {
            LexemeKind::Op('>') => c.op_right,
            LexemeKind::Op('<') => c.op_left,
            LexemeKind::Op('+') => c.op_inc,
            LexemeKind::Op('-') => c.op_dec,
            LexemeKind::Op('.') => c.op_output,
            LexemeKind::Op(',') => c.op_input,
            LexemeKind::Op(_) => c.op_bracket,
            LexemeKind::LabelDef { .. } => c.label_def,
            LexemeKind::Jump { .. } => c.jump,
            LexemeKind::CommentDelimiter | LexemeKind::Comment => return Style::new().fg(c.comment).italic(),
            LexemeKind::Inert(_) => return Style::new().fg(c.inert),
        };
        Style::new().fg(color).bold()
    }

    fn segments(&self, line: &str) -> Vec<(Style, String)> {
        let chars: Vec<char> = line.chars().collect();
        let mut out: Vec<(Style, String)> = Vec::new();

        for lexeme in Lexer::new(&chars) {
            let style = self.style_for(lexeme.kind);
            let text: String = chars[lexeme.start..lexeme.start + lexeme.len].iter().collect();
            match out.last_mut() {
                Some((s, buffer)) if *s == style => buffer.push_str(&text),
                _ => out.push((style, text)),
            }
        }
        out
    }
}

impl Highlighter for ProgramHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        for segment in self.segments(line) {
            styled.push(segment);
        }
        styled
    }
}
