use base64::{Engine as _, engine::general_purpose};
use serde::Serialize;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::abstraction::Abstractor;
use crate::script::Flag;

/// Post-processed view of a raw result.
///
/// Only the fields requested by the active flags are present; the others
/// are omitted from the serialized object rather than emitted as `null`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TransformOutputInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstraction: Option<Value>,
}

impl TransformOutputInfo {
    /// Build the record for `flags` over `value`. `pass` is ignored here.
    pub fn produce(flags: &[Flag], value: &Value, abstractor: &dyn Abstractor) -> Self {
        let wants = |flag: Flag| flags.contains(&flag);

        let canonical = if wants(Flag::Count) || wants(Flag::Sha256) {
            Some(canonical_json(value))
        } else {
            None
        };

        Self {
            count: canonical
                .as_deref()
                .filter(|_| wants(Flag::Count))
                .map(count_text),
            sha256: canonical
                .as_deref()
                .filter(|_| wants(Flag::Sha256))
                .map(sha256_base64),
            abstraction: wants(Flag::Abstract).then(|| abstractor.abstract_value(value)),
        }
    }

    pub fn into_value(self) -> Value {
        // Every key is a string, so conversion cannot fail.
        serde_json::to_value(&self).unwrap_or_default()
    }
}

/// Apply a flag list to a raw result.
///
/// `pass` returns the value untouched whatever else is listed.
pub fn apply_flags(flags: &[Flag], value: &Value, abstractor: &dyn Abstractor) -> Value {
    if flags.contains(&Flag::Pass) {
        return value.clone();
    }

    TransformOutputInfo::produce(flags, value, abstractor).into_value()
}

/// Two-space indented serialization in the layout of `JSON.stringify(v, null, 2)`.
///
/// Whole floats print as integers (`1.0` as `1`, `-0.0` as `0`) the way
/// JavaScript prints numbers. Object keys stay sorted.
pub fn canonical_json(value: &Value) -> String {
    let mut value = value.clone();
    normalize_numbers(&mut value);
    // Serializing a `Value` cannot fail: keys are always strings.
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

fn normalize_numbers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(whole) = n.as_f64().and_then(whole_number) {
                *n = whole;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(normalize_numbers),
        Value::Object(map) => map.values_mut().for_each(normalize_numbers),
        _ => {}
    }
}

fn whole_number(f: f64) -> Option<Number> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f == 0.0 {
        return Some(Number::from(0));
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else if f > 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else {
        None
    }
}

/// `"Words: <N>, Characters <M>"` where M counts UTF-16 code units.
pub fn count_text(text: &str) -> String {
    let words = text.split_whitespace().count();
    let characters = text.encode_utf16().count();
    format!("Words: {words}, Characters {characters}")
}

/// Standard base64 of the SHA-256 digest of `text`.
pub fn sha256_base64(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    general_purpose::STANDARD.encode(digest)
}
