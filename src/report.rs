use serde_json::Value;

use crate::crumble::SweepEntry;
use crate::ui::Ui;

/// Print every sweep entry, one line each, or pretty-printed when `verbose`.
pub fn print_entries(ui: &Ui, entries: &[SweepEntry], verbose: bool) {
    if entries.is_empty() {
        return;
    }

    ui.title(format!("--- sweep results ({}) ---", entries.len()));
    for entry in entries {
        if verbose {
            ui.line(format_entry_pretty(entry));
        } else {
            ui.line(format_entry_short(entry));
        }
    }
}

/// Format one entry as a single line: `<title> => <compact json>`.
pub fn format_entry_short(entry: &SweepEntry) -> String {
    match entry {
        SweepEntry::Result { title, result } => format!("{title} => {}", compact(result)),
        SweepEntry::Error { message } => message.clone(),
    }
}

/// Format one entry with its result pretty-printed and indented under the title.
pub fn format_entry_pretty(entry: &SweepEntry) -> String {
    match entry {
        SweepEntry::Result { title, result } => {
            let body = serde_json::to_string_pretty(result).unwrap_or_default();
            let indented: Vec<String> = body.lines().map(|l| format!("    {l}")).collect();
            format!("{title}\n{}", indented.join("\n"))
        }
        SweepEntry::Error { message } => message.clone(),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
