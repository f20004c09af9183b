//! Terminal output for CLI handlers.
//!
//! Human mode prints colored status lines, labeled fields and tables.
//! JSON mode prints exactly one result envelope per command and nothing else,
//! so every helper here is silent when JSON is enabled.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::response::Envelope;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit the result envelope as JSON instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

fn suppressed(config: OutputConfig) -> bool {
    config.json || config.quiet
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

#[must_use]
pub fn is_quiet() -> bool {
    read_config().quiet
}

/// Print the outcome of a command.
///
/// JSON mode serializes the whole envelope to stdout. Otherwise a success
/// is rendered with `render` and a failure is printed to stderr.
/// Returns whether the command succeeded.
pub fn emit<T: Serialize>(envelope: &Envelope<T>, render: impl FnOnce(&T)) -> bool {
    if is_json() {
        match serde_json::to_string_pretty(envelope) {
            Ok(body) => println!("{body}"),
            Err(err) => eprintln!("{{\"code\":500,\"data\":null,\"message\":\"{err}\"}}"),
        }
        return envelope.is_success();
    }

    match &envelope.data {
        Some(data) if envelope.is_success() => {
            success(&envelope.message);
            render(data);
        }
        _ => error(&format!("{} ({})", envelope.message, envelope.code)),
    }
    envelope.is_success()
}

/// Print a success line.
pub fn success(message: &str) {
    if suppressed(read_config()) {
        return;
    }
    println!("  {} {}", "✓".green(), message);
}

/// Print an error line to stderr. Shown in quiet mode too.
pub fn error(message: &str) {
    if is_json() {
        return;
    }
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if suppressed(read_config()) {
        return;
    }
    println!("  {:<16} {}", label.dimmed(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    if suppressed(read_config()) {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print rows as a table, or a muted placeholder when there are none.
pub fn table<R: Tabled>(rows: Vec<R>, empty: &str) {
    if suppressed(read_config()) {
        return;
    }
    if rows.is_empty() {
        println!("  {}", empty.dimmed());
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for line in table.to_string().lines() {
        println!("  {line}");
    }
}

/// Format a signed amount: green above zero, red below.
#[must_use]
pub fn pnl(value: Decimal) -> String {
    let text = value.normalize().to_string();
    if is_json() || value.is_zero() {
        return text;
    }
    if value.is_sign_positive() {
        format!("{}", text.green())
    } else {
        format!("{}", text.red())
    }
}

/// Format a dimmed value.
#[must_use]
pub fn muted(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.dimmed())
}

/// Render an optional value, `-` when absent.
#[must_use]
pub fn opt<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
