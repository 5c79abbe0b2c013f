//! Plain-text board rendering.
//!
//! Rows are numbered with the index `toggle`, `delete` and `move` expect.

use chrono::TimeZone;
use dailydo_core::{ListKind, TaskList, Theme};
use std::fmt::{Display, Write};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Renders both lists, daily first.
pub fn render_board<Tz>(daily: &TaskList, general: &TaskList, theme: Theme, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = format!("theme: {theme}\n\n");
    out.push_str(&render_list(ListKind::Daily, daily, tz));
    out.push('\n');
    out.push_str(&render_list(ListKind::General, general, tz));
    out
}

pub fn render_list<Tz>(kind: ListKind, list: &TaskList, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", heading(kind), list.len());
    if list.is_empty() {
        let _ = writeln!(out, "  (empty)");
        return out;
    }

    let width = list.len().saturating_sub(1).to_string().len();
    for (index, task) in list.iter().enumerate() {
        let mark = if task.completed { 'x' } else { ' ' };
        let created = task.date.with_timezone(tz).format(DATE_FORMAT);
        let _ = writeln!(
            out,
            "  {index:>width$}. [{mark}] {}  ({created})",
            task.text
        );
    }
    out
}

fn heading(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Daily => "Daily",
        ListKind::General => "General",
    }
}
