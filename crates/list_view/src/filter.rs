use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::NaiveDate;

use crate::{
    coerce::{as_number, as_timestamp},
    record::Record,
};

/// Filter value meaning "no constraint".
pub const ALL: &str = "All";

type RecordPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Predicate {
    Equals {
        field: String,
        value: String,
    },
    OneOf {
        field: String,
        values: Vec<String>,
    },
    DateRange {
        field: String,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    NumberRange {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    Custom(RecordPredicate),
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn one_of<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn date_range(
        field: impl Into<String>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Self {
        Self::DateRange {
            field: field.into(),
            from,
            to,
        }
    }

    pub fn number_range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::NumberRange {
            field: field.into(),
            min,
            max,
        }
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Sentinel and empty inputs are skipped rather than evaluated.
    pub fn is_unconstrained(&self) -> bool {
        match self {
            Self::Equals { value, .. } => is_sentinel(value),
            Self::OneOf { values, .. } => {
                values.is_empty() || values.iter().any(|value| is_sentinel(value))
            }
            Self::DateRange { from, to, .. } => from.is_none() && to.is_none(),
            Self::NumberRange { min, max, .. } => min.is_none() && max.is_none(),
            Self::Custom(_) => false,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        match self {
            Self::Equals { field, value } => record
                .text(field)
                .is_some_and(|text| same_text(&text, value)),
            Self::OneOf { field, values } => record.text(field).is_some_and(|text| {
                values
                    .iter()
                    .any(|value| same_text(&text, value))
            }),
            Self::DateRange { field, from, to } => {
                let Some(date) = record.field(field).and_then(as_timestamp).map(|ts| ts.date())
                else {
                    return false;
                };
                from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
            }
            Self::NumberRange { field, min, max } => {
                let Some(number) = record.field(field).and_then(as_number) else {
                    return false;
                };
                min.map_or(true, |min| number >= min) && max.map_or(true, |max| number <= max)
            }
            Self::Custom(predicate) => predicate(record),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => f
                .debug_struct("Equals")
                .field("field", field)
                .field("value", value)
                .finish(),
            Self::OneOf { field, values } => f
                .debug_struct("OneOf")
                .field("field", field)
                .field("values", values)
                .finish(),
            Self::DateRange { field, from, to } => f
                .debug_struct("DateRange")
                .field("field", field)
                .field("from", from)
                .field("to", to)
                .finish(),
            Self::NumberRange { field, min, max } => f
                .debug_struct("NumberRange")
                .field("field", field)
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Trimmed, Unicode case-insensitive equality; search folds case the same way.
fn same_text(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn is_sentinel(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == ALL
}

/// Named criteria combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, predicate: Predicate) -> Self {
        self.set(name, predicate);
        self
    }

    /// Returns the predicate previously registered under `name`.
    pub fn set(&mut self, name: impl Into<String>, predicate: Predicate) -> Option<Predicate> {
        self.predicates.insert(name.into(), predicate)
    }

    pub fn remove(&mut self, name: &str) -> Option<Predicate> {
        self.predicates.remove(name)
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .values()
            .all(|predicate| predicate.matches(record))
    }
}

pub fn apply_filters<'a>(records: &[&'a Record], filters: &FilterSet) -> Vec<&'a Record> {
    if filters.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .copied()
        .filter(|record| filters.matches(record))
        .collect()
}
