use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::abstraction::ValueKind;

/// Default value kind when a sweep config does not name one.
pub const DEFAULT_KIND: &str = "string";

/// Errors raised while applying a mutation to a value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("unknown mutation {mutation:?} for kind {kind:?}")]
    UnknownMutation { kind: String, mutation: String },

    #[error("path {path:?} does not exist in the value")]
    PathNotFound { path: String },

    #[error("mutation of kind {expected:?} cannot apply to {found} at path {path:?}")]
    KindMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("the root value cannot be deleted")]
    CannotDeleteRoot,
}

/// Produces a perturbed copy of a value.
///
/// Implementations never modify `value` in place.
pub trait Mutator {
    fn mutate(
        &self,
        path: &str,
        kind: &str,
        mutation: &str,
        value: &Value,
    ) -> Result<Value, MutationError>;
}

/// Edit produced by a rule for the node at the mutation path.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Replace(Value),
    Remove,
}

/// Rule body; `None` means the node has the wrong kind for this rule.
pub type RuleFn = fn(&Value) -> Option<Edit>;

/// A named mutation for one value kind. `"any"` rules apply to every kind.
#[derive(Clone, Copy)]
pub struct MutationRule {
    pub kind: &'static str,
    pub name: &'static str,
    pub apply: RuleFn,
}

impl fmt::Debug for MutationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationRule")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Table-driven mutator over dotted paths.
#[derive(Debug, Clone, Copy)]
pub struct RuleMutator {
    rules: &'static [MutationRule],
}

impl Default for RuleMutator {
    fn default() -> Self {
        Self {
            rules: default_mutation_rules(),
        }
    }
}

impl RuleMutator {
    pub fn with_rules(rules: &'static [MutationRule]) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static [MutationRule] {
        self.rules
    }

    fn find_rule(&self, kind: &str, mutation: &str) -> Option<&'static MutationRule> {
        self.rules
            .iter()
            .find(|r| r.name == mutation && (r.kind == kind || r.kind == "any"))
    }
}

impl Mutator for RuleMutator {
    fn mutate(
        &self,
        path: &str,
        kind: &str,
        mutation: &str,
        value: &Value,
    ) -> Result<Value, MutationError> {
        let rule = self
            .find_rule(kind, mutation)
            .ok_or_else(|| MutationError::UnknownMutation {
                kind: kind.to_string(),
                mutation: mutation.to_string(),
            })?;

        let segments = split_path(path);

        let node = lookup(value, &segments).ok_or_else(|| MutationError::PathNotFound {
            path: path.to_string(),
        })?;

        let edit = (rule.apply)(node).ok_or_else(|| MutationError::KindMismatch {
            path: path.to_string(),
            expected: kind.to_string(),
            found: ValueKind::of(node).as_str(),
        })?;

        let mut mutated = value.clone();
        match edit {
            Edit::Replace(new_value) => {
                if let Some(slot) = lookup_mut(&mut mutated, &segments) {
                    *slot = new_value;
                }
            }
            Edit::Remove => {
                let Some((last, parent_segments)) = segments.split_last() else {
                    return Err(MutationError::CannotDeleteRoot);
                };
                match lookup_mut(&mut mutated, parent_segments) {
                    Some(Value::Object(map)) => {
                        map.remove(*last);
                    }
                    Some(Value::Array(items)) => {
                        if let Ok(idx) = last.parse::<usize>() {
                            items.remove(idx);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(mutated)
    }
}

/// Built-in mutation table.
///
/// Lookup is by `(kind, name)`; `"any"` rows match every requested kind.
pub fn default_mutation_rules() -> &'static [MutationRule] {
    const fn rule(kind: &'static str, name: &'static str, apply: RuleFn) -> MutationRule {
        MutationRule { kind, name, apply }
    }

    const RULES: &[MutationRule] = &[
        // strings
        rule("string", "blank", |v| {
            v.as_str().map(|_| Edit::Replace(Value::from("")))
        }),
        rule("string", "whitespace", |v| {
            v.as_str().map(|_| Edit::Replace(Value::from(" ")))
        }),
        rule("string", "uppercase", |v| {
            v.as_str().map(|s| Edit::Replace(Value::from(s.to_uppercase())))
        }),
        rule("string", "lowercase", |v| {
            v.as_str().map(|s| Edit::Replace(Value::from(s.to_lowercase())))
        }),
        rule("string", "reverse", |v| {
            v.as_str()
                .map(|s| Edit::Replace(Value::from(s.chars().rev().collect::<String>())))
        }),
        rule("string", "truncate", |v| {
            v.as_str().map(|s| {
                let half = s.chars().count() / 2;
                Edit::Replace(Value::from(s.chars().take(half).collect::<String>()))
            })
        }),
        rule("string", "double", |v| {
            v.as_str().map(|s| Edit::Replace(Value::from(s.repeat(2))))
        }),
        // numbers
        rule("number", "zero", |v| {
            v.is_number().then(|| Edit::Replace(Value::from(0)))
        }),
        rule("number", "negate", |v| {
            number_edit(v, |i| i.checked_neg(), |f| -f)
        }),
        rule("number", "increment", |v| {
            number_edit(v, |i| i.checked_add(1), |f| f + 1.0)
        }),
        rule("number", "decrement", |v| {
            number_edit(v, |i| i.checked_sub(1), |f| f - 1.0)
        }),
        // booleans
        rule("boolean", "toggle", |v| {
            v.as_bool().map(|b| Edit::Replace(Value::from(!b)))
        }),
        // any kind
        rule("any", "null", |_| Some(Edit::Replace(Value::Null))),
        rule("any", "delete", |_| Some(Edit::Remove)),
    ];

    RULES
}

fn number_edit(
    value: &Value,
    int_op: fn(i64) -> Option<i64>,
    float_op: fn(f64) -> f64,
) -> Option<Edit> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(result) = n.as_i64().and_then(int_op) {
        return Some(Edit::Replace(Value::from(result)));
    }
    let f = n.as_f64()?;
    // Non-finite results have no JSON representation.
    Some(Edit::Replace(
        serde_json::Number::from_f64(float_op(f))
            .map(Value::Number)
            .unwrap_or(Value::Null),
    ))
}

/// Split a dotted path. The empty path addresses the root.
pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

fn lookup<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |node, seg| match node {
        Value::Object(map) => map.get(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn lookup_mut<'a>(value: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    segments.iter().try_fold(value, |node, seg| match node {
        Value::Object(map) => map.get_mut(*seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    })
}
