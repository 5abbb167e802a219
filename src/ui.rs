use console::{Term, style};
use std::{env, fmt::Display};

use crate::crumble::SweepEntry;
use crate::report::format_entry_short;

/// Small UI helper:
/// - normal mode: human output to stdout, errors to stderr
/// - `--json` mode: ALL human output to stderr (stdout stays machine-readable JSON)
/// - fancy styling only on a real TTY and when NO_COLOR/CI are not set
#[derive(Debug, Clone)]
pub struct Ui {
    out: Term,
    err: Term,
    fancy: bool,
    enabled: bool,

    // Counters for tests; they do not affect output.
    rows_reported: u64,
    script_errors: u64,
    runner_errors: u64,
}

impl Ui {
    pub fn new(json: bool) -> Self {
        let out = if json { Term::stderr() } else { Term::stdout() };
        let err = Term::stderr();

        // Style only when the stream actually used for human output is a TTY.
        let out_is_tty = out.is_term();

        let no_color = env::var_os("NO_COLOR").is_some();
        let in_ci = env::var_os("CI").is_some();

        let fancy = out_is_tty && !no_color && !in_ci;

        Self {
            out,
            err,
            fancy,
            enabled: true,
            rows_reported: 0,
            script_errors: 0,
            runner_errors: 0,
        }
    }

    /// Useful for unit tests to avoid noisy output.
    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            fancy: false,
            enabled: false,
            rows_reported: 0,
            script_errors: 0,
            runner_errors: 0,
        }
    }

    fn write_out(&self, s: &str) {
        if self.enabled {
            let _ = self.out.write_line(s);
        }
    }

    fn write_err(&self, s: &str) {
        if self.enabled {
            let _ = self.err.write_line(s);
        }
    }

    pub fn line(&self, msg: impl Display) {
        self.write_out(&msg.to_string());
    }

    pub fn title(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.is_fancy() {
            self.write_out(&style(s).bold().to_string());
        } else {
            self.write_out(&s);
        }
    }

    pub fn warn(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.is_fancy() {
            self.write_err(&style(s).yellow().to_string());
        } else {
            self.write_err(&s);
        }
    }

    pub fn error(&self, msg: impl Display) {
        let s = msg.to_string();
        if self.is_fancy() {
            self.write_err(&style(s).red().bold().to_string());
        } else {
            self.write_err(&s);
        }
    }

    /// Per-row progress line.
    ///
    /// In non-fancy mode this prints the plain short format so CLI snapshots
    /// stay stable (tests set NO_COLOR=1).
    pub fn entry_progress(&mut self, entry: &SweepEntry) {
        match entry {
            SweepEntry::Result { .. } => {
                self.rows_reported = self.rows_reported.saturating_add(1);
            }
            SweepEntry::Error { message } => {
                self.script_errors = self.script_errors.saturating_add(1);
                self.warn(message);
                return;
            }
        }

        if !self.is_fancy() {
            self.line(format!("row {}: {}", self.rows_reported, format_entry_short(entry)));
            return;
        }

        let tag = style(format!("ROW {:>3}", self.rows_reported)).cyan().bold();
        self.line(format!("{tag}  {}", format_entry_short(entry)));
    }

    /// Used for runner errors; keeps stderr/stdout routing consistent.
    pub fn runner_error(&mut self, msg: impl Display) {
        self.runner_errors += 1;
        self.error(msg);
    }

    pub fn is_fancy(&self) -> bool {
        self.fancy && self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_fancy_requires_fancy_and_enabled() {
        let base = Ui::silent();

        let mut a = base.clone();
        a.fancy = true;
        a.enabled = false;
        assert!(!a.is_fancy());

        let mut b = base.clone();
        b.fancy = false;
        b.enabled = true;
        assert!(!b.is_fancy());

        let mut c = base.clone();
        c.fancy = true;
        c.enabled = true;
        assert!(c.is_fancy());
    }

    #[test]
    fn runner_error_increments_counter() {
        let mut ui = Ui::silent();
        assert_eq!(ui.runner_errors, 0);
        ui.runner_error("boom");
        ui.runner_error("boom2");
        assert_eq!(ui.runner_errors, 2);
    }

    #[test]
    fn entry_progress_tracks_results_and_script_errors() {
        let mut ui = Ui::silent();

        let ok = SweepEntry::Result {
            title: "Path: a, mutation: blank".to_string(),
            result: json!({}),
        };
        let bad = SweepEntry::Error {
            message: "Crumble error: Missing the else keyword".to_string(),
        };

        ui.entry_progress(&ok);
        ui.entry_progress(&ok);
        ui.entry_progress(&bad);

        assert_eq!(ui.rows_reported, 2);
        assert_eq!(ui.script_errors, 1);
    }
}
