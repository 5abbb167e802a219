use std::path::PathBuf;

/// Options for a `sweep` run, derived from the CLI.
#[derive(Debug, Clone)]
pub struct Options {
    /// Sweep file (YAML or JSON).
    pub spec_path: PathBuf,

    /// Function command line, program first.
    pub command: Vec<String>,

    /// When true, emit a JSON report instead of the human-readable summary.
    pub json_output: bool,

    /// Pretty-print every result.
    pub verbose: bool,

    /// Exit with a distinct code when the output script is rejected.
    pub strict: bool,
}

impl Options {
    /// Construct an `Options` instance with default flags.
    pub fn new(spec_path: PathBuf, command: Vec<String>) -> Self {
        Self {
            spec_path,
            command,
            json_output: false,
            verbose: false,
            strict: false,
        }
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}
