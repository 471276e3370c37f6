//! Resource state records.
//!
//! A [`ResourceData`] holds the values of one resource instance keyed by
//! attribute name. A value is *present* when the key exists and is not
//! `null`; presence is tracked separately from the value itself so an
//! explicit `0`, `false` or `""` is never confused with "not set".
//!
//! Nested values are addressed with dotted paths: `tier.0.up_to` is the
//! `up_to` field of the first element of the `tier` list.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable snapshot of a resource: its ID plus attribute values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

/// Working copy of a resource during a CRUD operation.
///
/// `values` is the desired (then observed) state, `prior` the last-known
/// state used for change detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    values: IndexMap<String, Value>,
    prior: IndexMap<String, Value>,
}

impl ResourceData {
    /// Desired state for a resource that does not exist yet
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self {
            id: None,
            values,
            prior: IndexMap::new(),
        }
    }

    /// Existing resource whose prior and current values are the same
    pub fn from_state(state: ResourceState) -> Self {
        Self {
            id: state.id,
            prior: state.attributes.clone(),
            values: state.attributes,
        }
    }

    /// Existing resource moving from `prior` to the proposed `values`
    pub fn with_prior(state: ResourceState, values: IndexMap<String, Value>) -> Self {
        Self {
            id: state.id,
            prior: state.attributes,
            values,
        }
    }

    /// Bare record holding only an ID, as used by import
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Value at `path` if it was explicitly provided (present and not null)
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.values, path)
    }

    /// Prior value at `path`, with the same presence rules as [`get`](Self::get)
    pub fn get_prior(&self, path: &str) -> Option<&Value> {
        lookup(&self.prior, path)
    }

    pub fn is_set(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(as_integer)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Like [`get_str`](Self::get_str) but treats `""` as not set
    pub fn get_non_empty_str(&self, path: &str) -> Option<&str> {
        self.get_str(path).filter(|s| !s.is_empty())
    }

    /// Number of elements of the list at `path` (0 when absent)
    pub fn list_len(&self, path: &str) -> usize {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Store `value` at the top-level attribute `key`. `None` values become
    /// `null`, which reads back as not set.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Whether the value at `path` differs from its prior value.
    /// Absent and `null` compare equal, numbers compare by value.
    pub fn has_change(&self, path: &str) -> bool {
        !values_equal(self.get_prior(path), self.get(path))
    }

    pub fn to_state(&self) -> ResourceState {
        ResourceState {
            id: self.id.clone(),
            attributes: self.values.clone(),
        }
    }

    pub fn into_state(self) -> ResourceState {
        ResourceState {
            id: self.id,
            attributes: self.values,
        }
    }
}

fn lookup<'a>(values: &'a IndexMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = values.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() { None } else { Some(current) }
}

/// Integer view of a JSON number, accepting floats without a fractional part
pub fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Structural equality where `null` equals absent and `1` equals `1.0`
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => true,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            x.len() == y.len()
                && x.iter()
                    .zip(y.iter())
                    .all(|(l, r)| values_equal(Some(l), Some(r)))
        }
        (Some(Value::Object(x)), Some(Value::Object(y))) => {
            x.keys()
                .chain(y.keys())
                .all(|k| values_equal(x.get(k), y.get(k)))
        }
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn data(value: Value) -> ResourceData {
        let map = serde_json::from_value::<IndexMap<String, Value>>(value).unwrap();
        ResourceData::new(map)
    }

    #[test]
    fn test_zero_is_present() {
        let d = data(json!({"unit_amount": 0, "active": false, "nickname": null}));
        assert_eq!(d.get_i64("unit_amount"), Some(0));
        assert_eq!(d.get_bool("active"), Some(false));
        assert!(!d.is_set("nickname"));
        assert!(!d.is_set("currency"));
    }

    #[test]
    fn test_nested_paths() {
        let d = data(json!({
            "tier": [{"up_to": 10, "unit_amount": 100}, {"up_to_inf": true}]
        }));
        assert_eq!(d.list_len("tier"), 2);
        assert_eq!(d.get_i64("tier.0.up_to"), Some(10));
        assert_eq!(d.get_bool("tier.1.up_to_inf"), Some(true));
        assert!(!d.is_set("tier.1.up_to"));
        assert!(!d.is_set("tier.2.up_to"));
        assert!(!d.is_set("tier.x.up_to"));
    }

    #[test]
    fn test_has_change() {
        let prior = ResourceState {
            id: Some("co_1".to_string()),
            attributes: serde_json::from_value(json!({
                "name": "old", "percent_off": 10, "metadata": {"a": "1"}
            }))
            .unwrap(),
        };
        let proposed = serde_json::from_value(json!({
            "name": "new", "percent_off": 10.0, "metadata": {"a": "1"}, "currency": null
        }))
        .unwrap();
        let d = ResourceData::with_prior(prior, proposed);
        assert!(d.has_change("name"));
        assert!(!d.has_change("percent_off"));
        assert!(!d.has_change("metadata"));
        assert!(!d.has_change("currency"));
        assert_eq!(d.id(), Some("co_1"));
    }

    #[test]
    fn test_set_none_reads_as_unset() {
        let mut d = ResourceData::default();
        d.set("nickname", None::<String>);
        d.set("created", 1_700_000_000_i64);
        assert!(!d.is_set("nickname"));
        assert_eq!(d.get_i64("created"), Some(1_700_000_000));
    }

    #[test]
    fn test_as_integer_accepts_whole_floats() {
        assert_eq!(as_integer(&json!(3.0)), Some(3));
        assert_eq!(as_integer(&json!(3.5)), None);
        assert_eq!(as_integer(&json!("3")), None);
    }
}
