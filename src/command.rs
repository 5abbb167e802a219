use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

/// Result of one invocation of an external function command.
#[derive(Debug)]
pub struct CommandOutput {
    /// Exit code returned by the command (if it exited normally).
    pub exit_code: Option<i32>,

    /// Did the command exit with status 0?
    pub success: bool,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// How long the command ran.
    pub duration: Duration,
}

/// External program used as the function under test.
///
/// Each call writes the argument as JSON to the program's stdin and reads
/// the result from its stdout (JSON, or YAML as a fallback).
#[derive(Debug, Clone)]
pub struct CommandFunction {
    program: String,
    args: Vec<String>,
}

impl CommandFunction {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a full argument vector, program first.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let Some((program, args)) = argv.split_first() else {
            bail!("no function command given");
        };
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command once with `input` on stdin.
    pub fn invoke(&self, input: &Value) -> Result<CommandOutput> {
        let payload = serde_json::to_vec(input).context("serialize function input")?;
        let start = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run `{}`", self.display()))?;

        // Feed stdin from another thread so a chatty child cannot deadlock us.
        let mut stdin = child.stdin.take().context("child stdin was not captured")?;
        let writer = std::thread::spawn(move || stdin.write_all(&payload));

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.display()))?;

        match writer.join() {
            Ok(Ok(())) => {}
            // The child may exit without reading its input.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(e)
                    .with_context(|| format!("failed to write stdin of `{}`", self.display()));
            }
            Err(_) => bail!("stdin writer thread panicked"),
        }

        let duration = start.elapsed();
        debug!(
            command = %self.display(),
            ?duration,
            status = ?output.status.code(),
            "function command finished"
        );

        Ok(CommandOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        })
    }

    /// Run the command and decode its stdout as the function result.
    pub fn call(&self, input: Value) -> Result<Value> {
        let output = self.invoke(&input)?;

        if !output.success {
            bail!(
                "`{}` exited with code {:?}: {}",
                self.display(),
                output.exit_code,
                output.stderr.trim()
            );
        }

        parse_result(&output.stdout)
            .with_context(|| format!("`{}` did not print a JSON or YAML value", self.display()))
    }
}

fn parse_result(stdout: &str) -> Result<Value> {
    match serde_json::from_str(stdout) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str(stdout)
            .map_err(|yaml_err| anyhow::anyhow!("json: {json_err}; yaml: {yaml_err}")),
    }
}
