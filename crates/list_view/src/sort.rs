use std::{cmp::Ordering, fmt, str::FromStr};

use serde_json::Value;
use shared::error::DashboardError;

use crate::{
    coerce::{as_number, as_timestamp},
    record::{value_text, Record},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = DashboardError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(DashboardError::invalid(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Accepts `field`, `field:asc` and `field:desc`.
    pub fn parse(raw: &str) -> Result<Self, DashboardError> {
        let mut parts = raw.split(':');
        let field = parts.next().unwrap_or_default().trim();
        if field.is_empty() || field.split('.').any(str::is_empty) {
            return Err(DashboardError::invalid(format!(
                "malformed sort key '{raw}': missing field"
            )));
        }
        let direction = match parts.next() {
            Some(direction) => direction.parse()?,
            None => SortDirection::Ascending,
        };
        if parts.next().is_some() {
            return Err(DashboardError::invalid(format!(
                "malformed sort key '{raw}': too many segments"
            )));
        }
        Ok(Self {
            field: field.to_string(),
            direction,
        })
    }

    fn compare(&self, mode: SortMode, left: &Record, right: &Record) -> Ordering {
        match (left.field(&self.field), right.field(&self.field)) {
            (None, None) => Ordering::Equal,
            // Missing values trail in both directions.
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => {
                let ordering = mode.compare(left, right);
                match self.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{}:{direction}", self.field)
    }
}

/// How one column compares. Chosen once per sort from every present value,
/// so mixed columns still get a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortMode {
    Numeric,
    Chronological,
    Text,
}

impl SortMode {
    fn for_column(values: &[&Value]) -> Self {
        if values.is_empty() {
            Self::Text
        } else if values.iter().all(|value| as_number(value).is_some()) {
            Self::Numeric
        } else if values.iter().all(|value| as_timestamp(value).is_some()) {
            Self::Chronological
        } else {
            Self::Text
        }
    }

    fn compare(self, left: &Value, right: &Value) -> Ordering {
        match self {
            Self::Numeric => {
                if let (Some(left), Some(right)) = (as_number(left), as_number(right)) {
                    return left.total_cmp(&right);
                }
            }
            Self::Chronological => {
                if let (Some(left), Some(right)) = (as_timestamp(left), as_timestamp(right)) {
                    return left.cmp(&right);
                }
            }
            Self::Text => {}
        }
        compare_text(left, right)
    }
}

fn compare_text(left: &Value, right: &Value) -> Ordering {
    let (left, right) = (value_text(left), value_text(right));
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(&right))
}

/// Stable: records with equal keys keep their input order.
pub fn apply_sort<'a>(records: &[&'a Record], key: &SortKey) -> Vec<&'a Record> {
    let present: Vec<&Value> = records
        .iter()
        .filter_map(|record| record.field(&key.field))
        .collect();
    let mode = SortMode::for_column(&present);

    let mut sorted = records.to_vec();
    sorted.sort_by(|left, right| key.compare(mode, left, right));
    sorted
}
