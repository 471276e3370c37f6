//! Expand/flatten helpers shared by every resource.
//!
//! "Expand" turns resource values into request parameters, "flatten" turns
//! Stripe responses back into resource values.

use indexmap::IndexMap;
use serde_json::Value;
use stripeform_driver_stripe::FormParams;
use stripeform_types::ResourceData;

pub const METADATA_KEY: &str = "metadata";

/// String map view of a JSON object. Non-string scalars are stringified.
pub fn expand_string_map(value: Option<&Value>) -> IndexMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return IndexMap::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect()
}

/// String list view of a JSON array
pub fn expand_string_list(d: &ResourceData, key: &str) -> Vec<String> {
    d.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn expand_metadata(d: &ResourceData) -> IndexMap<String, String> {
    expand_string_map(d.get(METADATA_KEY))
}

/// Metadata for a create request
pub fn push_metadata(params: &mut FormParams, d: &ResourceData) {
    params.push_map(METADATA_KEY, &expand_metadata(d));
}

/// Metadata for an update request. Keys dropped since the prior state are
/// sent empty, which makes Stripe delete them.
pub fn push_metadata_update(params: &mut FormParams, d: &ResourceData) {
    let current = expand_metadata(d);
    let prior = expand_string_map(d.get_prior(METADATA_KEY));

    if current.is_empty() && !prior.is_empty() {
        params.push(METADATA_KEY, "");
        return;
    }

    params.push_map(METADATA_KEY, &current);
    for key in prior.keys().filter(|k| !current.contains_key(*k)) {
        params.push(format!("{}[{}]", METADATA_KEY, key), "");
    }
}

/// Resource value for a Stripe map, with sorted keys for stable state.
/// An empty map reads as unset.
pub fn flatten_string_map(map: &IndexMap<String, String>) -> Value {
    if map.is_empty() {
        return Value::Null;
    }
    let mut keys: Vec<_> = map.keys().collect();
    keys.sort();
    Value::Object(
        keys.into_iter()
            .map(|k| (k.clone(), Value::String(map[k].clone())))
            .collect(),
    )
}

/// Resource value for a Stripe string list. An empty list reads as unset.
pub fn flatten_string_list(items: &[String]) -> Value {
    if items.is_empty() {
        return Value::Null;
    }
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Stripe returns decimal amounts as strings
pub fn parse_decimal(value: Option<&str>) -> Option<f64> {
    value.and_then(|s| s.parse::<f64>().ok())
}

/// String attribute for an update request; clearing it sends an empty value
pub fn push_changed_str(params: &mut FormParams, d: &ResourceData, key: &str) {
    if d.has_change(key) {
        params.push(key, d.get_str(key).unwrap_or_default());
    }
}

pub fn push_changed_bool(params: &mut FormParams, d: &ResourceData, key: &str) {
    if d.has_change(key) {
        if let Some(value) = d.get_bool(key) {
            params.push(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use stripeform_types::ResourceState;

    use super::*;

    fn update_data(prior: Value, proposed: Value) -> ResourceData {
        ResourceData::with_prior(
            ResourceState {
                id: Some("x".to_string()),
                attributes: serde_json::from_value(prior).unwrap(),
            },
            serde_json::from_value(proposed).unwrap(),
        )
    }

    #[test]
    fn test_expand_string_map_stringifies_scalars() {
        let map = expand_string_map(Some(&json!({"seats": 5, "tier": "pro", "gone": null})));
        assert_eq!(map.get("seats").map(String::as_str), Some("5"));
        assert_eq!(map.get("tier").map(String::as_str), Some("pro"));
        assert!(!map.contains_key("gone"));
    }

    #[test]
    fn test_metadata_update_unsets_removed_keys() {
        let d = update_data(
            json!({"metadata": {"a": "1", "b": "2"}}),
            json!({"metadata": {"a": "3"}}),
        );
        let mut params = FormParams::new();
        push_metadata_update(&mut params, &d);
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("metadata[a]", "3"), ("metadata[b]", "")]);
    }

    #[test]
    fn test_metadata_update_clears_everything() {
        let d = update_data(json!({"metadata": {"a": "1"}}), json!({}));
        let mut params = FormParams::new();
        push_metadata_update(&mut params, &d);
        assert_eq!(params.get("metadata"), Some(""));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_flatten_sorts_and_nulls_empty() {
        let mut map = IndexMap::new();
        map.insert("z".to_string(), "1".to_string());
        map.insert("a".to_string(), "2".to_string());
        let value = flatten_string_map(&map);
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "z"]);
        assert_eq!(flatten_string_map(&IndexMap::new()), Value::Null);
        assert_eq!(flatten_string_list(&[]), Value::Null);
    }

    #[test]
    fn test_changed_str_sends_empty_when_cleared() {
        let d = update_data(json!({"nickname": "old", "unit_label": "seat"}), json!({"unit_label": "seat"}));
        let mut params = FormParams::new();
        push_changed_str(&mut params, &d, "nickname");
        push_changed_str(&mut params, &d, "unit_label");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("nickname", "")]);
    }
}
