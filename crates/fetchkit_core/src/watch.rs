use serde::{Deserialize, Serialize};

/// One watched input value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatchValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for WatchValue {
    fn from(value: bool) -> Self {
        WatchValue::Bool(value)
    }
}

impl From<i64> for WatchValue {
    fn from(value: i64) -> Self {
        WatchValue::Int(value)
    }
}

impl From<&str> for WatchValue {
    fn from(value: &str) -> Self {
        WatchValue::Text(value.to_string())
    }
}

impl From<String> for WatchValue {
    fn from(value: String) -> Self {
        WatchValue::Text(value)
    }
}

/// Ordered snapshot of the inputs a reactive runner depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WatchSet(Vec<WatchValue>);

impl WatchSet {
    pub fn new(values: Vec<WatchValue>) -> Self {
        Self(values)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[WatchValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Structural inequality against the previous snapshot, element by element.
    pub fn differs_from(&self, previous: &WatchSet) -> bool {
        self.0 != previous.0
    }
}

impl<V: Into<WatchValue>> FromIterator<V> for WatchSet {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
