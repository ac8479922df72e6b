//! Output formatting for API responses

use serde_json::Value;

/// How JSON responses are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Indented, one field per line (default)
    #[default]
    Pretty,
    /// Single line, for piping into other tools
    Compact,
}

pub fn render(value: &Value, mode: OutputMode) -> serde_json::Result<String> {
    match mode {
        OutputMode::Pretty => serde_json::to_string_pretty(value),
        OutputMode::Compact => serde_json::to_string(value),
    }
}

/// Print a response on stdout.
pub fn print(value: &Value, mode: OutputMode) -> anyhow::Result<()> {
    println!("{}", render(value, mode)?);
    Ok(())
}
