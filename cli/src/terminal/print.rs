//! Report lines. They are emitted as `info` events on [`PRINT_TARGET`] so the
//! writer picked at startup (stdout, or stderr next to JSON) applies to them.

use std::fmt::Display;

use colored::*;
use tracing::info;

use crate::terminal::colors;
use crate::terminal::logging::PRINT_TARGET;

pub const REPORT_WIDTH: usize = 64;

pub fn line(msg: impl Display) {
    info!(target: PRINT_TARGET, "{msg}");
}

pub fn blank() {
    line("");
}

/// `[ LABEL ] ------`, ruled out to the report width.
pub fn title(label: &str) {
    line(title_text(label));
}

pub fn rule() {
    line("=".repeat(REPORT_WIDTH).color(colors::SEPARATOR));
}

/// `> key      value`, keys left-aligned in a `key_width` column.
pub fn key_value(key: &str, key_width: usize, value: impl Display) {
    line(key_value_text(key, key_width, value));
}

pub fn centered(msg: &str) {
    line(centered_text(msg));
}

fn title_text(label: &str) -> String {
    let tag = format!("[ {} ]", label.to_uppercase());
    let fill = REPORT_WIDTH.saturating_sub(console::measure_text_width(&tag) + 1);
    format!(
        "{} {}",
        tag.color(colors::PRIMARY).bold(),
        "-".repeat(fill).color(colors::SEPARATOR)
    )
}

fn key_value_text(key: &str, key_width: usize, value: impl Display) -> String {
    let key = format!("{key:<key_width$}");
    format!(
        "{} {}  {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::PRIMARY),
        value
    )
}

fn centered_text(msg: &str) -> String {
    let indent = REPORT_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2;
    format!("{}{msg}", " ".repeat(indent))
}
