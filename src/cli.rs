use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::abstraction::{Abstractor, ShapeAbstractor};
use crate::command::CommandFunction;
use crate::logging::init_tracing;
use crate::options::Options;
use crate::report::print_entries;
use crate::run_report::SweepReport;
use crate::script::{OutputScript, OutputScriptResult};
use crate::sweep_file::{SweepFile, load_value};
use crate::ui::Ui;

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_SCRIPT_REJECTED: i32 = 2;

/// Top-level CLI arguments for the `zest-crumble` binary.
#[derive(Debug, Parser)]
#[command(
    name = "zest-crumble",
    version,
    about = "Output scripts and mutation sweeps for data-driven tests"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands supported by `zest-crumble`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an output script and show the resulting rule.
    Check {
        /// Script text, e.g. "if status equals ok then pass else abstract".
        #[arg(long)]
        script: String,

        /// Print the tagged parse result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the structural abstraction of a YAML or JSON document.
    Abstract {
        /// Document to summarize.
        #[arg(long)]
        input: PathBuf,
    },

    /// Run a mutation sweep against an external function command.
    Sweep {
        /// Sweep file (YAML or JSON) with `config`, `table` and `values`.
        #[arg(long)]
        spec: PathBuf,

        /// Pretty-print every result.
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Emit a machine-readable JSON report to stdout.
        #[arg(long)]
        json: bool,

        /// Exit with code 2 if the output script is rejected.
        #[arg(long)]
        strict: bool,

        /// Function command: reads the mutated value as JSON on stdin and
        /// prints its result as JSON on stdout.
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

fn print_json_and_exit<T: serde::Serialize>(report: &T, exit_code: i32) -> ! {
    let json = serde_json::to_string_pretty(report).expect("serialize report to json");
    println!("{json}");
    std::process::exit(exit_code);
}

/// Parse CLI arguments and dispatch the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Check { script, json } => run_check(&script, json),

        Command::Abstract { input } => {
            let value = load_value(&input)?;
            let summary = ShapeAbstractor.abstract_value(&value);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }

        Command::Sweep {
            spec,
            verbose,
            json,
            strict,
            command,
        } => {
            let mut options = Options::new(spec, command);
            options.json_output = json;
            options.verbose = verbose;
            options.strict = strict;
            run_sweep(&options)
        }
    }
}

fn run_check(script: &str, json: bool) -> Result<()> {
    let parsed = OutputScript::parse(script);

    if json {
        let exit_code = if parsed.is_ok() { EXIT_OK } else { EXIT_ERROR };
        print_json_and_exit(&OutputScriptResult::from(parsed), exit_code);
    }

    match parsed {
        Ok(rule) => {
            println!("output script ok");
            println!("key:        {}", rule.key);
            println!("value:      {}", rule.value);
            println!("on success: {}", join_flags(&rule.on_success));
            println!("on failure: {}", join_flags(&rule.on_failure));
            Ok(())
        }
        Err(e) => {
            eprintln!("invalid output script: {e}");
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn join_flags(flags: &[crate::script::Flag]) -> String {
    flags
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_sweep(options: &Options) -> Result<()> {
    let json = options.json_output;
    let mut ui = Ui::new(json);
    let spec = options.spec_path.clone();
    let command_line = options.command_line();

    ui.title("zest-crumble: sweep");
    ui.line(format!("spec: {:?}", spec));

    let sweep_file = match SweepFile::load(&spec) {
        Ok(s) => s,
        Err(e) => {
            if json {
                let report =
                    SweepReport::failure(spec, command_line, 0, format!("{e:#}"));
                print_json_and_exit(&report, EXIT_ERROR);
            }
            ui.runner_error(format!("failed to load sweep file: {e:#}"));
            return Err(e);
        }
    };
    let rows = sweep_file.table.len();

    let function = CommandFunction::from_argv(&options.command)?;
    ui.line(format!("function: {}", function.display()));
    ui.line(format!("rows: {rows}"));

    let crumble = sweep_file.to_crumble();
    let entries = match crumble.run(|value| function.call(value), &sweep_file.values) {
        Ok(entries) => entries,
        Err(e) => {
            if json {
                let report = SweepReport::failure(spec, command_line, rows, format!("{e:#}"));
                print_json_and_exit(&report, EXIT_ERROR);
            }
            ui.runner_error(format!("sweep failed: {e:#}"));
            return Err(e);
        }
    };

    let report = SweepReport::success(spec, command_line, rows, entries);
    let rejected = report.script_error().is_some();
    let exit_code = if options.strict && rejected {
        EXIT_SCRIPT_REJECTED
    } else {
        EXIT_OK
    };

    for entry in &report.entries {
        ui.entry_progress(entry);
    }

    if json {
        print_json_and_exit(&report, exit_code);
    }

    if options.verbose {
        print_entries(&ui, &report.entries, true);
    }

    println!("--- sweep summary ---");
    println!("rows:    {}", report.rows);
    println!("entries: {}", report.entries.len());

    if exit_code != EXIT_OK {
        eprintln!("sweep failed policy: output script rejected (--strict)");
        std::process::exit(exit_code);
    }

    Ok(())
}
