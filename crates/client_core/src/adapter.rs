use list_view::Record;
use serde_json::Value;
use shared::{error::DashboardError, protocol::ServerPageInfo};

const CONTENT_KEY: &str = "content";

/// A list endpoint response normalized to one shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordList {
    pub records: Vec<Record>,
    /// Present only for `{ content: [...] }` responses.
    pub server_page: Option<ServerPageInfo>,
}

impl RecordList {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Accepts either a bare array or a `{ content: [...], ...metadata }`
/// envelope. Anything else is a malformed response.
pub fn normalize_list_payload(payload: Value) -> Result<RecordList, DashboardError> {
    match payload {
        Value::Array(items) => Ok(RecordList {
            records: into_records(items)?,
            server_page: None,
        }),
        Value::Object(mut envelope) => {
            let items = match envelope.remove(CONTENT_KEY) {
                Some(Value::Array(items)) => items,
                Some(_) => {
                    return Err(DashboardError::malformed(
                        "list envelope `content` is not an array",
                    ))
                }
                None => {
                    return Err(DashboardError::malformed(
                        "expected an array or an object with `content`",
                    ))
                }
            };
            let server_page = serde_json::from_value::<ServerPageInfo>(Value::Object(envelope)).ok();
            Ok(RecordList {
                records: into_records(items)?,
                server_page,
            })
        }
        other => Err(DashboardError::malformed(format!(
            "expected a list response, got {}",
            json_kind(&other)
        ))),
    }
}

fn into_records(items: Vec<Value>) -> Result<Vec<Record>, DashboardError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let kind = json_kind(&item);
            Record::from_value(item).ok_or_else(|| {
                DashboardError::malformed(format!("list item {index} is {kind}, not an object"))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
