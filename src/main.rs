use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;
use goto_bf::cli_util::{execute_program, Interrupt, RunOptions};
use goto_bf::config::{self, Settings};
use goto_bf::repl::{self, ModeFlagOverride, ReplMode};
use goto_bf::EofBehavior;
use log::info;

/// Environment fallback for `--max-steps`.
const MAX_STEPS_ENV: &str = "GBF_MAX_STEPS";

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] <token> [<token> ...]   # Run the program formed by joining tokens with spaces
  {0} [OPTIONS] -f <PATH>               # Run the program loaded from PATH
  {0} [OPTIONS] -i [--bare|--editor]    # Interactive mode

Options:
  --file, -f <PATH>      Read the program from PATH instead of positional tokens
  --interactive, -i      Start interactive mode (editor on a TTY, otherwise read stdin once)
  --bare                 With -i: force non-interactive bare mode
  --editor               With -i: force the line editor (errors if stdin is not a TTY)
  --input <TEXT>         Stage TEXT as the program's input bytes
  --input-file <PATH>    Stage the contents of PATH as input bytes
  --max-steps <N>        Abort after N instructions (fallback {1}; default unlimited)
  --eof <zero|unchanged> What ',' does once input is exhausted (default zero)
  --debug, -d            Print a step-by-step table of the run
  --help, -h             Show this help

Language:
  > <      move the tape pointer (errors at either end of the tape)
  + -      increment / decrement the current cell (wrapping)
  . ,      emit the current cell / read the next input byte
  [ ]      loop while the current cell is non-zero
  ^x       define label x (any single character)
  vx       jump to label x
  # ... #  comment
  Any other character is ignored.

Configuration:
  $XDG_CONFIG_HOME/gbf.toml (or the file named by {2}) may set
  [interpreter] tape_cells, buffer_capacity, label_capacity, program_capacity,
  max_steps, eof and [colors] for the interactive highlighter.
  Set RUST_LOG=debug for diagnostic logging on stderr.
"#,
        program,
        MAX_STEPS_ENV,
        config::CONFIG_ENV,
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "gbf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Read the program from PATH instead of positional tokens
    #[arg(short = 'f', long = "file", conflicts_with = "interactive")]
    file: Option<PathBuf>,

    /// Start interactive mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor", requires = "interactive")]
    bare: bool,

    /// Force the line editor (errors if stdin is not a TTY)
    #[arg(long = "editor", requires = "interactive")]
    editor: bool,

    /// Stage TEXT as input bytes
    #[arg(long = "input", value_name = "TEXT", conflicts_with = "input_file")]
    input: Option<String>,

    /// Stage the contents of PATH as input bytes
    #[arg(long = "input-file", value_name = "PATH")]
    input_file: Option<PathBuf>,

    /// Abort after N instructions
    #[arg(long = "max-steps", value_name = "N")]
    max_steps: Option<usize>,

    /// What ',' does once input is exhausted
    #[arg(long = "eof", value_name = "MODE", value_parser = parse_eof)]
    eof: Option<EofBehavior>,

    /// Print a step-by-step table of the run
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    /// Program tokens, joined with single spaces
    #[arg(value_name = "token", trailing_var_arg = true, allow_hyphen_values = true)]
    code: Vec<String>,
}

fn parse_eof(value: &str) -> Result<EofBehavior, String> {
    EofBehavior::parse(value).ok_or_else(|| format!("invalid EOF mode '{value}', expected 'zero' or 'unchanged'"))
}

/// Flags, then environment, then config file, then defaults.
fn resolve_options(program: &str, cli: &Cli, settings: &Settings) -> Result<RunOptions, String> {
    let max_steps = cli
        .max_steps
        .or_else(|| env::var(MAX_STEPS_ENV).ok().and_then(|s| s.trim().parse::<usize>().ok()))
        .or(settings.max_steps);

    let input = match (&cli.input, &cli.input_file) {
        (Some(text), _) => text.clone().into_bytes(),
        (None, Some(path)) => fs::read(path)
            .map_err(|e| format!("{program}: failed to read input file {}: {e}", path.display()))?,
        (None, None) => Vec::new(),
    };

    Ok(RunOptions {
        limits: settings.limits,
        eof: cli.eof.unwrap_or(settings.eof),
        max_steps,
        input,
        debug: cli.debug,
    })
}

fn run_interactive(program: &str, cli: &Cli, opts: &RunOptions, settings: &Settings, interrupt: &Interrupt) -> i32 {
    if !cli.code.is_empty() {
        eprintln!("{program}: cannot use positional tokens together with --interactive");
        usage_and_exit(program, 2);
    }

    let flag = if cli.bare {
        ModeFlagOverride::Bare
    } else if cli.editor {
        ModeFlagOverride::Editor
    } else {
        ModeFlagOverride::None
    };

    let mode = match repl::select_mode(flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };
    info!("interactive mode: {mode:?}");

    let result = match mode {
        ReplMode::Editor => {
            // Banners only when a human is watching stderr
            if io::stderr().is_terminal() {
                eprintln!("gbf interactive mode");
                eprintln!("Enter inserts a newline; Ctrl+d (Ctrl+z on Windows) runs the buffer. Ctrl+c exits.");
                let _ = io::stderr().flush();
            }
            repl::repl_loop(opts, &settings.colors, interrupt)
        }
        ReplMode::Bare => repl::execute_bare_once(opts, interrupt),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: interactive mode error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn run(program: &str, cli: Cli) -> i32 {
    let settings = config::settings();
    let opts = match resolve_options(program, &cli, settings) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let interrupt = match Interrupt::install() {
        Ok(i) => i,
        Err(e) => {
            eprintln!("{program}: failed to set ctrl+c handler: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    if cli.interactive {
        return run_interactive(program, &cli, &opts, settings, &interrupt);
    }

    if cli.file.is_none() && cli.code.is_empty() {
        usage_and_exit(program, 2);
    }

    if cli.file.is_some() && !cli.code.is_empty() {
        eprintln!("{program}: cannot use positional tokens together with --file");
        usage_and_exit(program, 2);
    }

    let code = if let Some(path) = &cli.file {
        match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{program}: failed to read program file as UTF-8: {e}");
                let _ = io::stderr().flush();
                return 1;
            }
        }
    } else {
        info!("processing command line arguments as code");
        cli.code.join(" ")
    };

    if execute_program(Some(program), &code, &opts, Some(&interrupt)) { 0 } else { 1 }
}

fn main() {
    pretty_env_logger::init();

    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("gbf"));

    let cli = Cli::parse();
    if cli.help {
        usage_and_exit(&program, 0);
    }

    std::process::exit(run(&program, cli));
}
