use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

/// Scalar values that can be stored in a database row or bound as a query parameter.
///
/// ```rust
/// use resilient_sql::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // `%.f` also accepts a missing fraction.
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value as JSON, used when exporting result rows.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(i) => JsonValue::from(*i),
            RowValues::Float(f) => JsonValue::from(*f),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::Timestamp(dt) => JsonValue::String(dt.format("%F %T%.f").to_string()),
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(j) => j.clone(),
            RowValues::Blob(bytes) => {
                JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
            }
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// A named parameter value: either bound as-is, or expanded into one placeholder per element.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(RowValues),
    List(Vec<RowValues>),
}

impl From<RowValues> for ParamValue {
    fn from(value: RowValues) -> Self {
        ParamValue::Scalar(value)
    }
}

impl From<Vec<RowValues>> for ParamValue {
    fn from(values: Vec<RowValues>) -> Self {
        ParamValue::List(values)
    }
}

fn normalize_name(name: &str) -> String {
    name.strip_prefix(':').unwrap_or(name).to_owned()
}

/// Parameters supplied by the caller, keyed by placeholder name without the leading `:`.
///
/// ```rust
/// use resilient_sql::prelude::*;
///
/// let params = NamedParams::new()
///     .bind("status", "active")
///     .bind_list("ids", [1, 2, 3]);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams(BTreeMap<String, ParamValue>);

impl NamedParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a scalar value.
    #[must_use]
    pub fn bind(mut self, name: &str, value: impl Into<RowValues>) -> Self {
        self.insert(name, ParamValue::Scalar(value.into()));
        self
    }

    /// Bind a sequence that will be expanded into one placeholder per element.
    #[must_use]
    pub fn bind_list<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RowValues>,
    {
        let list = values.into_iter().map(Into::into).collect();
        self.insert(name, ParamValue::List(list));
        self
    }

    pub fn insert(&mut self, name: &str, value: ParamValue) -> Option<ParamValue> {
        self.0.insert(normalize_name(name), value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a NamedParams {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: AsRef<str>> FromIterator<(K, ParamValue)> for NamedParams {
    fn from_iter<T: IntoIterator<Item = (K, ParamValue)>>(iter: T) -> Self {
        let mut params = NamedParams::new();
        for (name, value) in iter {
            params.insert(name.as_ref(), value);
        }
        params
    }
}

/// Flattened, scalar-only parameters handed to a driver after list expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams(BTreeMap<String, RowValues>);

impl BoundParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: RowValues) -> Option<RowValues> {
        self.0.insert(normalize_name(name), value)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RowValues> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, RowValues> {
        self.0.iter()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, RowValues> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a BoundParams {
    type Item = (&'a String, &'a RowValues);
    type IntoIter = btree_map::Iter<'a, String, RowValues>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn text_timestamps_parse_at_any_precision() {
        let whole = RowValues::Text("2024-01-02 03:04:05".into());
        assert_eq!(whole.as_timestamp().map(|dt| dt.nanosecond()), Some(0));

        let millis = RowValues::Text("2024-01-02 03:04:05.123".into());
        assert_eq!(millis.as_timestamp().map(|dt| dt.nanosecond()), Some(123_000_000));

        let micros = RowValues::Text("2024-01-02 03:04:05.123456".into());
        assert_eq!(micros.as_timestamp().map(|dt| dt.nanosecond()), Some(123_456_000));

        assert!(RowValues::Text("yesterday".into()).as_timestamp().is_none());
    }

    #[test]
    fn leading_colon_is_stripped() {
        let params = NamedParams::new().bind(":id", 7);
        assert!(params.contains_key("id"));
        assert_eq!(params.get("id"), Some(&ParamValue::Scalar(RowValues::Int(7))));
    }

    #[test]
    fn bind_list_keeps_order() {
        let params = NamedParams::new().bind_list("ids", ["c", "a", "b"]);
        let Some(ParamValue::List(items)) = params.get("ids") else {
            panic!("expected list");
        };
        let texts: Vec<_> = items.iter().filter_map(RowValues::as_text).collect();
        assert_eq!(texts, ["c", "a", "b"]);
    }

    #[test]
    fn option_maps_to_null() {
        let none: Option<i64> = None;
        assert!(RowValues::from(none).is_null());
        assert_eq!(RowValues::from(Some(3_i64)), RowValues::Int(3));
    }

    #[test]
    fn bool_from_int() {
        assert_eq!(RowValues::Int(1).as_bool(), Some(&true));
        assert_eq!(RowValues::Int(0).as_bool(), Some(&false));
        assert_eq!(RowValues::Int(2).as_bool(), None);
    }
}
