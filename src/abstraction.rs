use serde::Serialize;
use serde_json::Value;

/// Reduces a value to a comparison-friendly summary.
///
/// Implementations must be deterministic and free of side effects: the sweep
/// relies on identical inputs producing identical summaries.
pub trait Abstractor {
    fn abstract_value(&self, value: &Value) -> Value;
}

/// Kind of a JSON node as reported in a shape summary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) if n.is_f64() => ValueKind::Float,
            Value::Number(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

/// One node of a shape summary.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ShapeEntry {
    /// Dotted path from the root (`""` for the root itself).
    pub path: String,

    pub kind: ValueKind,

    /// Characters for strings, items for arrays, keys for objects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

/// Default abstraction: a depth-first list of `{path, kind, length?}` entries.
///
/// Scalar values are dropped, only their kind and size survive, so two
/// results with the same structure abstract to the same summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapeAbstractor;

impl ShapeAbstractor {
    pub fn shape(&self, value: &Value) -> Vec<ShapeEntry> {
        let mut entries = Vec::new();
        collect_shape(value, String::new(), &mut entries);
        entries
    }
}

impl Abstractor for ShapeAbstractor {
    fn abstract_value(&self, value: &Value) -> Value {
        Value::Array(self.shape(value).iter().map(entry_to_value).collect())
    }
}

fn collect_shape(value: &Value, path: String, out: &mut Vec<ShapeEntry>) {
    let length = match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    };

    out.push(ShapeEntry {
        path: path.clone(),
        kind: ValueKind::of(value),
        length,
    });

    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                collect_shape(item, join_path(&path, &idx.to_string()), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                collect_shape(item, join_path(&path, key), out);
            }
        }
        _ => {}
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn entry_to_value(entry: &ShapeEntry) -> Value {
    // Every key is a string, so conversion cannot fail.
    serde_json::to_value(entry).unwrap_or_default()
}
