//! Console output: `[timestamp] message`, styled by severity.

use std::io::{IsTerminal, Write};

use crate::commit::timestamp_now;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Foreground colors used on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    DarkCyan,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[91m",
            Color::Yellow => "\x1b[93m",
            Color::DarkCyan => "\x1b[36m",
        }
    }
}

/// How a line is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub color: Option<Color>,
}

impl Style {
    /// Errors are bold red, warnings bold yellow, debug output dark cyan.
    pub fn for_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self {
                bold: true,
                color: Some(Color::Red),
            },
            log::Level::Warn => Self {
                bold: true,
                color: Some(Color::Yellow),
            },
            log::Level::Info => Self::default(),
            log::Level::Debug | log::Level::Trace => Self {
                bold: false,
                color: Some(Color::DarkCyan),
            },
        }
    }
}

/// Render one console line. ANSI codes are only emitted when `colored`.
pub fn format_line(message: &str, style: Style, timestamp: Option<&str>, colored: bool) -> String {
    let mut line = String::new();
    if let Some(timestamp) = timestamp {
        line.push_str(&format!("[{}] ", timestamp));
    }

    let styled = colored && (style.bold || style.color.is_some());
    if styled {
        if style.bold {
            line.push_str(BOLD);
        }
        if let Some(color) = style.color {
            line.push_str(color.code());
        }
    }
    line.push_str(message);
    if styled {
        line.push_str(RESET);
    }
    line
}

fn use_color() -> bool {
    cfg!(unix) && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

/// Line reporting a fatal error, printed regardless of the log filter.
pub fn fatal_line(message: &str) -> String {
    let colored = use_color() && std::io::stderr().is_terminal();
    format_line(
        message,
        Style::for_level(log::Level::Error),
        Some(&timestamp_now()),
        colored,
    )
}

/// Install the `env_logger` backend, defaulting to `info`.
pub fn init() {
    let colored = use_color();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .format(move |buf, record| {
            let line = format_line(
                &record.args().to_string(),
                Style::for_level(record.level()),
                Some(&timestamp_now()),
                colored,
            );
            writeln!(buf, "{}", line)
        })
        .init();
}
