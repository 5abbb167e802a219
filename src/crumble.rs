use std::future::Future;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::abstraction::{Abstractor, ShapeAbstractor};
use crate::mutator::{DEFAULT_KIND, Mutator, RuleMutator};
use crate::output::apply_flags;
use crate::script::OutputScript;

/// Signature marker for a function taking exactly one argument.
pub const SINGLE_ARGUMENT_SIGNATURE: &str = "A";

/// Raw sweep configuration, as found in a spec file.
///
/// Empty `kind`, `path` and `mutation` strings count as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrumbleConfig {
    /// Argument signature of the wrapped function. Only `"A"` is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Value kind handed to the mutator (defaults to `"string"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Path used for every row instead of the row's own path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Mutation used for every row instead of the row's own mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<String>,

    /// Output script selecting post-processing flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl CrumbleConfig {
    /// Config for a single-argument function with no overrides.
    pub fn single_argument() -> Self {
        Self {
            signature: Some(SINGLE_ARGUMENT_SIGNATURE.to_string()),
            ..Self::default()
        }
    }

    pub fn effective_kind(&self) -> &str {
        non_empty(&self.kind).unwrap_or(DEFAULT_KIND)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// One line of the mutation table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationRow {
    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub mutation: String,
}

impl MutationRow {
    pub fn new(path: impl Into<String>, mutation: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mutation: mutation.into(),
        }
    }
}

/// Row after config overrides have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRow<'a> {
    pub path: &'a str,
    pub kind: &'a str,
    pub mutation: &'a str,
}

impl ResolvedRow<'_> {
    pub fn title(&self) -> String {
        format!("Path: {}, mutation: {}", self.path, self.mutation)
    }
}

/// One element of a sweep's output.
///
/// Serialized untagged: consumers tell the shapes apart by the presence of
/// `message` versus `title`/`result`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SweepEntry {
    Result { title: String, result: Value },
    Error { message: String },
}

impl SweepEntry {
    pub fn title(&self) -> Option<&str> {
        match self {
            SweepEntry::Result { title, .. } => Some(title),
            SweepEntry::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SweepEntry::Error { .. })
    }
}

/// Unrecoverable sweep errors. These abort the whole sweep.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrumbleError {
    /// Signature is not `"A"` or no first value was supplied.
    #[error("Crumble should have a signature")]
    MissingSignature,
}

enum Plan<'a> {
    /// The output script did not parse; this is the whole sweep output.
    Rejected(Vec<SweepEntry>),
    Ready {
        script: Option<OutputScript>,
        input: &'a Value,
    },
}

/// A mutation sweep bound to its configuration and table.
///
/// The same `Crumble` can run against any number of function/value pairs.
pub struct Crumble {
    config: CrumbleConfig,
    table: Vec<MutationRow>,
    abstractor: Box<dyn Abstractor>,
    mutator: Box<dyn Mutator>,
}

/// Bind a configuration and a mutation table.
pub fn crumble(config: CrumbleConfig, table: Vec<MutationRow>) -> Crumble {
    Crumble::new(config, table)
}

impl Crumble {
    pub fn new(config: CrumbleConfig, table: Vec<MutationRow>) -> Self {
        Self {
            config,
            table,
            abstractor: Box::new(ShapeAbstractor),
            mutator: Box::new(RuleMutator::default()),
        }
    }

    pub fn with_abstractor(mut self, abstractor: impl Abstractor + 'static) -> Self {
        self.abstractor = Box::new(abstractor);
        self
    }

    pub fn with_mutator(mut self, mutator: impl Mutator + 'static) -> Self {
        self.mutator = Box::new(mutator);
        self
    }

    pub fn config(&self) -> &CrumbleConfig {
        &self.config
    }

    pub fn table(&self) -> &[MutationRow] {
        &self.table
    }

    /// Table rows with the config overrides applied, in table order.
    pub fn resolved_rows(&self) -> Vec<ResolvedRow<'_>> {
        let kind = self.config.effective_kind();
        self.table
            .iter()
            .map(|row| ResolvedRow {
                path: non_empty(&self.config.path).unwrap_or(row.path.as_str()),
                kind,
                mutation: non_empty(&self.config.mutation).unwrap_or(row.mutation.as_str()),
            })
            .collect()
    }

    /// Run the sweep, calling `func` once per row with a freshly mutated copy
    /// of `values[0]`.
    ///
    /// An output script that does not parse yields a single
    /// [`SweepEntry::Error`]; a bad signature or missing value is an `Err`.
    pub fn run<F>(&self, mut func: F, values: &[Value]) -> Result<Vec<SweepEntry>>
    where
        F: FnMut(Value) -> Result<Value>,
    {
        let (script, input) = match self.prepare(values)? {
            Plan::Rejected(entries) => return Ok(entries),
            Plan::Ready { script, input } => (script, input),
        };

        let mut results = Vec::with_capacity(self.table.len());
        for row in self.resolved_rows() {
            let mutated = self.mutate_input(&row, input)?;
            let raw = func(mutated)
                .with_context(|| format!("wrapped function failed for {}", row.title()))?;
            results.push(self.finish_row(script.as_ref(), &row, &raw));
        }

        info!(rows = results.len(), "crumble sweep finished");
        Ok(results)
    }

    /// Same as [`Crumble::run`] for functions whose result completes later.
    ///
    /// Each row's future is awaited before the next row is mutated.
    pub async fn run_async<F, Fut>(&self, mut func: F, values: &[Value]) -> Result<Vec<SweepEntry>>
    where
        F: FnMut(Value) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let (script, input) = match self.prepare(values)? {
            Plan::Rejected(entries) => return Ok(entries),
            Plan::Ready { script, input } => (script, input),
        };

        let mut results = Vec::with_capacity(self.table.len());
        for row in self.resolved_rows() {
            let mutated = self.mutate_input(&row, input)?;
            let raw = func(mutated)
                .await
                .with_context(|| format!("wrapped function failed for {}", row.title()))?;
            results.push(self.finish_row(script.as_ref(), &row, &raw));
        }

        info!(rows = results.len(), "crumble sweep finished");
        Ok(results)
    }

    fn prepare<'a>(&self, values: &'a [Value]) -> Result<Plan<'a>> {
        let script = match &self.config.output {
            None => None,
            Some(raw) => match OutputScript::parse(raw) {
                Ok(script) => Some(script),
                Err(e) => {
                    warn!(script = %raw, error = %e, "output script rejected");
                    return Ok(Plan::Rejected(vec![SweepEntry::Error {
                        message: format!("Crumble error: {e}"),
                    }]));
                }
            },
        };

        if self.config.signature.as_deref() != Some(SINGLE_ARGUMENT_SIGNATURE) {
            return Err(CrumbleError::MissingSignature.into());
        }
        let input = values.first().ok_or(CrumbleError::MissingSignature)?;

        info!(rows = self.table.len(), scripted = script.is_some(), "starting crumble sweep");
        Ok(Plan::Ready { script, input })
    }

    fn mutate_input(&self, row: &ResolvedRow<'_>, input: &Value) -> Result<Value> {
        self.mutator
            .mutate(row.path, row.kind, row.mutation, input)
            .with_context(|| format!("failed to mutate input for {}", row.title()))
    }

    fn finish_row(
        &self,
        script: Option<&OutputScript>,
        row: &ResolvedRow<'_>,
        raw: &Value,
    ) -> SweepEntry {
        let result = match script {
            None => self.abstractor.abstract_value(raw),
            Some(script) => {
                let matched = script_field(raw, &script.key).and_then(Value::as_str)
                    == Some(script.value.as_str());
                debug!(key = %script.key, matched, "output script evaluated");
                apply_flags(script.flags_for(matched), raw, self.abstractor.as_ref())
            }
        };

        let title = row.title();
        debug!(%title, "row finished");
        SweepEntry::Result { title, result }
    }
}

/// Field named by an output script key.
///
/// Arrays are indexed by keys written as a plain decimal index (`"0"`, not
/// `"00"` or `"+0"`), the same way a property lookup on an array behaves.
fn script_field<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    match raw {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .filter(|idx| idx.to_string() == key)
            .and_then(|idx| items.get(idx)),
        _ => None,
    }
}
