use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Post-processing directive selected by an output script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// Return the raw result unchanged. Overrides every other flag.
    Pass,

    /// Structural summary of the raw result.
    Abstract,

    /// Base64 SHA-256 digest of the canonical JSON form.
    Sha256,

    /// Word and character count of the canonical JSON form.
    Count,
}

impl Flag {
    pub fn as_str(self) -> &'static str {
        match self {
            Flag::Pass => "pass",
            Flag::Abstract => "abstract",
            Flag::Sha256 => "sha256",
            Flag::Count => "count",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Flag::Pass),
            "abstract" => Ok(Flag::Abstract),
            "sha256" => Ok(Flag::Sha256),
            "count" => Ok(Flag::Count),
            _ => Err(()),
        }
    }
}

/// Reasons an output script can be rejected.
///
/// The `Display` text of each variant is user-facing and ends up in sweep
/// results, so it must stay stable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Expected to start with if")]
    MissingIf,

    #[error("Expected an equals operator")]
    MissingEquals,

    #[error("Expected a then keyword")]
    MissingThen,

    #[error("Would expect at least 3 parameters after then")]
    TooFewParameters,

    #[error("Missing key a key to compare")]
    MissingKey,

    #[error("Missing a value to compare")]
    MissingValue,

    #[error("Missing the else keyword")]
    MissingElse,

    #[error("In case of success you must have at least one flag")]
    EmptySuccess,

    #[error("In case of failure you must have at least one flag")]
    EmptyFailure,

    /// Carries the comma-joined success tokens.
    #[error("One of the success flags is not supported: {0}")]
    UnsupportedSuccessFlag(String),

    /// Carries the comma-joined *success* tokens, not the failure ones.
    #[error("One of the failure flags is not supported: {0}")]
    UnsupportedFailureFlag(String),
}

/// A parsed `if <key> equals <value> then <flags> else <flags>` rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutputScript {
    /// Field of the raw result to inspect.
    pub key: String,

    /// Expected string value of that field.
    pub value: String,

    /// Flags applied when the field matches. Never empty.
    pub on_success: Vec<Flag>,

    /// Flags applied otherwise. Never empty.
    pub on_failure: Vec<Flag>,
}

impl OutputScript {
    /// Parse a one-line output script.
    ///
    /// Tokens are separated by single spaces after trimming the input, so
    /// repeated spaces produce empty tokens. Checks run in a fixed order and
    /// the first violation wins.
    pub fn parse(raw: &str) -> Result<Self, ScriptError> {
        let tokens: Vec<&str> = raw.trim().split(' ').collect();

        if tokens.first() != Some(&"if") {
            return Err(ScriptError::MissingIf);
        }
        if tokens.get(2) != Some(&"equals") {
            return Err(ScriptError::MissingEquals);
        }
        if tokens.get(4) != Some(&"then") {
            return Err(ScriptError::MissingThen);
        }

        let tail = tokens.get(5..).unwrap_or_default();
        if tail.len() < 3 {
            return Err(ScriptError::TooFewParameters);
        }

        let key = tokens.get(1).ok_or(ScriptError::MissingKey)?;
        let value = tokens.get(3).ok_or(ScriptError::MissingValue)?;

        let else_pos = tail
            .iter()
            .position(|t| *t == "else")
            .ok_or(ScriptError::MissingElse)?;

        let success_tokens = &tail[..else_pos];
        if success_tokens.is_empty() {
            return Err(ScriptError::EmptySuccess);
        }

        let failure_tokens = &tail[else_pos + 1..];
        if failure_tokens.is_empty() {
            return Err(ScriptError::EmptyFailure);
        }

        let on_success = parse_flags(success_tokens)
            .ok_or_else(|| ScriptError::UnsupportedSuccessFlag(success_tokens.join(",")))?;
        let on_failure = parse_flags(failure_tokens)
            .ok_or_else(|| ScriptError::UnsupportedFailureFlag(success_tokens.join(",")))?;

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            on_success,
            on_failure,
        })
    }

    /// Flags to apply given whether the watched field matched.
    pub fn flags_for(&self, matched: bool) -> &[Flag] {
        if matched {
            &self.on_success
        } else {
            &self.on_failure
        }
    }
}

fn parse_flags(tokens: &[&str]) -> Option<Vec<Flag>> {
    tokens.iter().map(|t| t.parse().ok()).collect()
}

/// Serializable tagged form of a parse outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutputScriptResult {
    Success { value: OutputScript },
    Failure { error: String },
}

impl OutputScriptResult {
    pub fn parse(raw: &str) -> Self {
        OutputScript::parse(raw).into()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutputScriptResult::Success { .. })
    }
}

impl From<Result<OutputScript, ScriptError>> for OutputScriptResult {
    fn from(result: Result<OutputScript, ScriptError>) -> Self {
        match result {
            Ok(value) => OutputScriptResult::Success { value },
            Err(e) => OutputScriptResult::Failure {
                error: e.to_string(),
            },
        }
    }
}
