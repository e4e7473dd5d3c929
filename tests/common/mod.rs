#![allow(dead_code)]

use assert_cmd::Command;
use std::io::Write;

/// The `gbf` binary, isolated from any user config or step-limit env.
pub fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("gbf").unwrap();
    cmd.env("GBF_CONFIG", "/nonexistent/gbf.toml")
        .env_remove("GBF_MAX_STEPS")
        .env_remove("GBF_REPL_MODE")
        .env_remove("GBF_REPL_ONCE");
    cmd
}

pub fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}
