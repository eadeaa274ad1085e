//! Terminal output: ANSI styling, status notes, the progress line and the
//! source table.
//!
//! Answers go to stdout; everything else goes to stderr so the answer can be
//! piped.

use std::io::Write;

use docsight_core::Source;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Erase the current line and return the cursor to column 0.
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

pub fn note_info(msg: &str) {
    note(CYAN, "ℹ", "INFO", msg);
}

pub fn note_warn(msg: &str) {
    note(YELLOW, "⚠", "WARN", msg);
}

pub fn note_error(msg: &str) {
    note(RED, "✗", "ERROR", msg);
}

pub fn note_success(msg: &str) {
    note(GREEN, "✓", "OK", msg);
}

fn note(color: &str, symbol: &str, label: &str, msg: &str) {
    if supports_color() {
        eprintln!("{color}{BOLD}{symbol}{RESET} {msg}");
    } else {
        eprintln!("{label}: {msg}");
    }
}

/// Replace the transient progress line on stderr.
pub fn show_progress(msg: &str) {
    let mut err = std::io::stderr();
    let line = if supports_color() {
        format!("{CLEAR_LINE}{DIM}… {msg}{RESET}")
    } else {
        format!("{CLEAR_LINE}… {msg}")
    };
    let _ = stream_write(&mut err, &line);
}

pub fn clear_progress() {
    let _ = stream_write(&mut std::io::stderr(), CLEAR_LINE);
}

/// Column alignment.
pub enum Align {
    Left,
    Right,
}

/// A table column definition.
pub struct Column {
    pub header: String,
    pub align: Align,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left, max_width: None }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right, max_width: None }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Render a table with given columns and rows. Cells wider than their
/// column's `max_width` are truncated with an ellipsis.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(columns.len()) {
            let w = visible_width(cell);
            let w = columns[i].max_width.map_or(w, |max| w.min(max));
            widths[i] = widths[i].max(w);
        }
    }

    let mut out = String::new();

    let header: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    out.push_str(&format!("{BOLD}  {}{RESET}\n", header.join("  ").trim_end()));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(&truncate(cell, widths[i]), widths[i], &col.align)
            })
            .collect();
        out.push_str(&format!("  {}\n", cells.join("  ").trim_end()));
    }

    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn truncate(s: &str, width: usize) -> String {
    if visible_width(s) <= width {
        return s.to_string();
    }
    let plain = strip_ansi(s);
    let kept: String = plain.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}…")
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = " ".repeat(width.saturating_sub(visible_width(s)));
    match align {
        Align::Left => format!("{s}{pad}"),
        Align::Right => format!("{pad}{s}"),
    }
}

/// Table of the citations attached to an answer.
pub fn render_sources(sources: &[Source]) -> String {
    let columns = [
        Column::right("#"),
        Column::left("Source").max_width(48),
        Column::left("Kind"),
        Column::left("Year"),
        Column::left("Link").max_width(60),
    ];
    let rows: Vec<Vec<String>> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let kind = match (&source.kind, source.is_web()) {
                (Some(kind), _) => kind.clone(),
                (None, true) => "web".to_string(),
                (None, false) => "document".to_string(),
            };
            let year = match &source.year {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            vec![
                (i + 1).to_string(),
                source.display_title().to_string(),
                kind,
                year,
                source.url.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}

/// Write a chunk and flush, so partial lines show up immediately.
pub fn stream_write(writer: &mut impl Write, chunk: &str) -> std::io::Result<()> {
    writer.write_all(chunk.as_bytes())?;
    writer.flush()
}
