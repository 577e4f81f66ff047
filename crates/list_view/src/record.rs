use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Rendered in place of missing, null or blank fields.
pub const PLACEHOLDER: &str = "—";

/// One row of a backend collection (invoice, employee, deal, ...).
///
/// No schema is enforced; fields are looked up by dotted path and anything
/// missing is tolerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn id(&self) -> Option<&Value> {
        self.field("id")
    }

    /// Resolve `a.b.0.c` style paths. Numeric segments index arrays.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    pub fn text(&self, path: &str) -> Option<String> {
        self.field(path).map(value_text)
    }

    pub fn display(&self, path: &str) -> String {
        match self.text(path) {
            Some(text) if !text.trim().is_empty() => text,
            _ => PLACEHOLDER.to_string(),
        }
    }

    /// Text of every top-level scalar field, in key order.
    pub(crate) fn scalar_texts(&self) -> impl Iterator<Item = String> + '_ {
        self.fields.values().filter_map(|value| match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(value_text(value)),
            _ => None,
        })
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
