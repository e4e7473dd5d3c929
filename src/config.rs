use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use cross_xdg::BaseDirs;
use log::{debug, warn};
use nu_ansi_term::Color;

use crate::buffer::EofBehavior;
use crate::program::Limits;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GBF_CONFIG";

/// Highlighter colors for interactive mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub op_right: Color,     // '>'
    pub op_left: Color,      // '<'
    pub op_inc: Color,       // '+'
    pub op_dec: Color,       // '-'
    pub op_output: Color,    // '.'
    pub op_input: Color,     // ','
    pub op_bracket: Color,   // '[' and ']'
    pub label_def: Color,    // '^x'
    pub jump: Color,         // 'vx'
    pub comment: Color,
    pub inert: Color,
}

impl Default for Colors {
    // Catppuccin Mocha
    fn default() -> Self {
        Self {
            op_right: Color::Rgb(137, 220, 235),    // sky
            op_left: Color::Rgb(148, 226, 213),     // teal
            op_inc: Color::Rgb(166, 227, 161),      // green
            op_dec: Color::Rgb(243, 139, 168),      // red
            op_output: Color::Rgb(249, 226, 175),   // yellow
            op_input: Color::Rgb(250, 179, 135),    // peach
            op_bracket: Color::Rgb(203, 166, 247),  // mauve
            label_def: Color::Rgb(137, 180, 250),   // blue
            jump: Color::Rgb(245, 194, 231),        // pink
            comment: Color::Rgb(108, 112, 134),     // overlay0
            inert: Color::Rgb(88, 91, 112),         // surface2
        }
    }
}

/// Everything the config file can set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub limits: Limits,
    pub max_steps: Option<usize>,
    pub eof: EofBehavior,
    pub colors: Colors,
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Settings from the config file, or defaults when there is none.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(|| load_from_toml().unwrap_or_default())
}

/// Where the config file is looked up.
///
/// `GBF_CONFIG` wins; otherwise `gbf.toml` in the XDG config home
/// (`~/.config` on Linux and macOS, `C:\Users\<user>\.config` on Windows).
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("gbf.toml");
    Some(path)
}

fn load_from_toml() -> Option<Settings> {
    let path = config_path()?;
    let content = fs::read_to_string(&path).ok()?;
    debug!("loading settings from {}", path.display());
    Some(parse_settings(&content))
}

/// Parse the `[interpreter]` and `[colors]` sections of a config file.
///
/// This is a very small parser: `key = value` lines, values optionally
/// quoted, `#` comment lines. Unknown keys and bad values are skipped.
pub fn parse_settings(content: &str) -> Settings {
    let sections = parse_sections(content);
    let mut cfg = Settings::default();

    if let Some(map) = sections.get("interpreter") {
        let number = |key: &str| -> Option<usize> {
            let raw = map.get(key)?;
            match raw.replace('_', "").parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!("ignoring invalid {key} = {raw:?} in config");
                    None
                }
            }
        };

        if let Some(n) = number("tape_cells") { cfg.limits.tape_cells = n; }
        if let Some(n) = number("buffer_capacity") { cfg.limits.buffer_capacity = n; }
        if let Some(n) = number("label_capacity") { cfg.limits.label_capacity = n; }
        if let Some(n) = number("program_capacity") { cfg.limits.program_capacity = n; }
        cfg.max_steps = number("max_steps");
        if let Some(eof) = map.get("eof").and_then(|s| EofBehavior::parse(s)) {
            cfg.eof = eof;
        }
    }

    if let Some(map) = sections.get("colors") {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = map.get(stringify!($field)).and_then(|s| parse_color(s)) {
                    cfg.colors.$field = v;
                }
            };
        }

        set!(op_right);
        set!(op_left);
        set!(op_inc);
        set!(op_dec);
        set!(op_output);
        set!(op_input);
        set!(op_bracket);
        set!(label_def);
        set!(jump);
        set!(comment);
        set!(inert);
    }

    cfg
}

fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            current = Some(line[1..line.len() - 1].trim().to_string());
            continue;
        }
        let Some(section) = current.as_ref() else { continue };
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            sections.entry(section.clone()).or_default().insert(key, val);
        }
    }

    sections
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "purple" | "magenta" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "darkgray" | "dark_gray" | "darkgrey" | "dark_grey" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightpurple" | "light_purple" | "lightmagenta" | "light_magenta" => Color::LightPurple,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        "lightgray" | "light_gray" | "lightgrey" | "light_grey" => Color::LightGray,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(parse_settings(""), Settings::default());
    }

    #[test]
    fn interpreter_section_overrides_limits() {
        let cfg = parse_settings(
            r#"
# comment
[interpreter]
tape_cells = 30_000
label_capacity = "64"
max_steps = 1000
eof = "unchanged"
"#,
        );
        assert_eq!(cfg.limits.tape_cells, 30_000);
        assert_eq!(cfg.limits.label_capacity, 64);
        assert_eq!(cfg.limits.buffer_capacity, Limits::default().buffer_capacity);
        assert_eq!(cfg.max_steps, Some(1000));
        assert_eq!(cfg.eof, EofBehavior::Unchanged);
    }

    #[test]
    fn invalid_numbers_are_ignored() {
        let cfg = parse_settings("[interpreter]\ntape_cells = lots\nbuffer_capacity = 0\n");
        assert_eq!(cfg.limits, Limits::default());
    }

    #[test]
    fn colors_accept_hex_and_names() {
        let cfg = parse_settings("[colors]\njump = \"#102030\"\ncomment = grey\nop_inc = nonsense\n");
        assert_eq!(cfg.colors.jump, Color::Rgb(0x10, 0x20, 0x30));
        assert_eq!(cfg.colors.comment, Color::DarkGray);
        assert_eq!(cfg.colors.op_inc, Colors::default().op_inc);
    }

    #[test]
    fn keys_outside_known_sections_are_ignored() {
        let cfg = parse_settings("tape_cells = 9\n[other]\nmax_steps = 3\n");
        assert_eq!(cfg, Settings::default());
    }
}
