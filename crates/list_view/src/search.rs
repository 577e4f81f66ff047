use crate::record::Record;

/// Case-insensitive substring search over a projection of each record.
///
/// With no `fields` configured, every top-level scalar participates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub fields: Vec<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: Vec::new(),
        }
    }

    pub fn over<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn needle(&self) -> String {
        self.text.trim().to_lowercase()
    }

    pub fn projection(&self, record: &Record) -> String {
        let parts: Vec<String> = if self.fields.is_empty() {
            record.scalar_texts().collect()
        } else {
            self.fields
                .iter()
                .filter_map(|field| record.text(field))
                .collect()
        };
        parts.join(" ")
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.is_blank() || self.projection(record).to_lowercase().contains(&self.needle())
    }
}

pub fn apply_search<'a>(records: &[&'a Record], query: &SearchQuery) -> Vec<&'a Record> {
    if query.is_blank() {
        return records.to_vec();
    }
    let needle = query.needle();
    records
        .iter()
        .copied()
        .filter(|record| query.projection(record).to_lowercase().contains(&needle))
        .collect()
}
