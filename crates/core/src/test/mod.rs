//! In-memory [`StripeApi`] double for resource and provider tests.
//!
//! Requests are recorded in order. Created objects are rebuilt from the form
//! parameters the way Stripe would store them, so a create followed by a read
//! exercises the real flatten code.

use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use stripeform_driver_stripe::{
    ApiError, Deleted, FormParams, Result, StripeApi, StripeError, StripeObject,
};
use stripeform_types::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Retrieve,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub verb: Verb,
    pub object: StripeObject,
    pub id: Option<String>,
    pub params: FormParams,
    pub expand: Vec<String>,
}

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    objects: HashMap<(StripeObject, String), Value>,
    next_id: usize,
    failure: Option<(u16, String)>,
}

#[derive(Default)]
pub struct MockStripe {
    state: Mutex<MockState>,
}

impl MockStripe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored object, keyed by its `id` field
    pub fn insert(&self, object: StripeObject, value: Value) {
        let id = value["id"].as_str().unwrap_or_default().to_string();
        self.state.lock().objects.insert((object, id), value);
    }

    pub fn object(&self, object: StripeObject, id: &str) -> Option<Value> {
        self.state.lock().objects.get(&(object, id.to_string())).cloned()
    }

    /// Make the next call fail with the given status
    pub fn fail_next(&self, status: u16, message: &str) {
        self.state.lock().failure = Some((status, message.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    pub fn requests_of(&self, verb: Verb) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.verb == verb).collect()
    }

    pub fn last_params(&self, verb: Verb) -> FormParams {
        self.requests_of(verb)
            .pop()
            .map(|r| r.params)
            .unwrap_or_default()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    fn record(
        &self,
        verb: Verb,
        object: StripeObject,
        id: Option<&str>,
        params: FormParams,
        expand: &[&str],
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.requests.push(RecordedRequest {
            verb,
            object,
            id: id.map(str::to_string),
            params,
            expand: expand.iter().map(|s| s.to_string()).collect(),
        });
        match state.failure.take() {
            Some((status, message)) => Err(api_error(status, &message, None)),
            None => Ok(()),
        }
    }
}

fn api_error(status: u16, message: &str, code: Option<&str>) -> StripeError {
    StripeError::Api {
        status,
        error: ApiError {
            error_type: Some("invalid_request_error".to_string()),
            code: code.map(str::to_string),
            message: Some(message.to_string()),
            param: None,
        },
    }
}

fn not_found(object: StripeObject, id: &str) -> StripeError {
    api_error(
        404,
        &format!("No such {}: '{}'", object, id),
        Some("resource_missing"),
    )
}

fn id_prefix(object: StripeObject) -> &'static str {
    match object {
        StripeObject::Coupon => "co",
        StripeObject::Plan => "plan",
        StripeObject::Price => "price",
        StripeObject::Product => "prod",
        StripeObject::TaxRate => "txr",
        StripeObject::WebhookEndpoint => "we",
    }
}

/// Split `tiers[0][up_to]` into `["tiers", "0", "up_to"]`
fn key_segments(key: &str) -> Vec<String> {
    key.split('[')
        .map(|segment| segment.trim_end_matches(']').to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn form_value(segments: &[String], raw: &str) -> Value {
    let last = segments.last().map(String::as_str).unwrap_or_default();
    if segments.first().map(String::as_str) == Some("metadata")
        || last == "id"
        || last.ends_with("_decimal")
    {
        return Value::String(raw.to_string());
    }
    if last == "up_to" && raw == "inf" {
        return Value::Null;
    }
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return json!(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return json!(f);
    }
    Value::String(raw.to_string())
}

fn insert_path(target: &mut Value, segments: &[String], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    let slot = match head.parse::<usize>() {
        Ok(idx) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            let Value::Array(items) = target else { return };
            if items.len() <= idx {
                items.resize(idx + 1, Value::Null);
            }
            &mut items[idx]
        }
        Err(_) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            let Value::Object(map) = target else { return };
            map.entry(head.clone()).or_insert(Value::Null)
        }
    };
    insert_path(slot, rest, value);
}

/// Rebuild the JSON object a form body describes
fn unflatten(params: &FormParams) -> Value {
    let mut root = Value::Object(Map::new());
    for (key, raw) in params.iter() {
        let segments = key_segments(key);
        let value = form_value(&segments, raw);
        insert_path(&mut root, &segments, value);
    }
    root
}

fn set_default(object: &mut Map<String, Value>, key: &str, value: Value) {
    if object.get(key).map(Value::is_null).unwrap_or(true) {
        object.insert(key.to_string(), value);
    }
}

/// Fields Stripe fills in on create
fn apply_server_defaults(object: StripeObject, map: &mut Map<String, Value>) {
    set_default(map, "created", json!(1_700_000_000));
    set_default(map, "livemode", json!(false));
    set_default(map, "metadata", json!({}));
    match object {
        StripeObject::Coupon => {
            set_default(map, "valid", json!(true));
            set_default(map, "times_redeemed", json!(0));
        }
        StripeObject::Plan => {
            set_default(map, "active", json!(true));
            set_default(map, "interval_count", json!(1));
        }
        StripeObject::Price => {
            set_default(map, "active", json!(true));
            set_default(map, "billing_scheme", json!("per_unit"));
            set_default(map, "tax_behavior", json!("unspecified"));
            if let Some(Value::Object(recurring)) = map.get_mut("recurring") {
                set_default(recurring, "interval_count", json!(1));
                set_default(recurring, "usage_type", json!("licensed"));
            }
        }
        StripeObject::Product => {
            set_default(map, "active", json!(true));
        }
        StripeObject::TaxRate => {
            set_default(map, "active", json!(true));
        }
        StripeObject::WebhookEndpoint => {
            if map.remove("connect") == Some(json!(true)) {
                map.insert("application".to_string(), json!("ca_mock"));
            }
            set_default(map, "secret", json!("whsec_mock"));
            set_default(map, "status", json!("enabled"));
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

impl StripeApi for MockStripe {
    async fn create<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        params: &FormParams,
    ) -> Result<T> {
        self.record(Verb::Create, object, None, params.clone(), &[])?;

        let mut value = unflatten(params);
        let mut state = self.state.lock();
        let id = match params.get("id") {
            Some(id) => id.to_string(),
            None => {
                state.next_id += 1;
                format!("{}_mock{}", id_prefix(object), state.next_id)
            }
        };
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), json!(id));
            apply_server_defaults(object, map);
        }
        state.objects.insert((object, id), value.clone());
        decode(value)
    }

    async fn retrieve<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        expand: &[&str],
    ) -> Result<T> {
        self.record(Verb::Retrieve, object, Some(id), FormParams::new(), expand)?;

        let mut value = self
            .object(object, id)
            .ok_or_else(|| not_found(object, id))?;
        if object == StripeObject::WebhookEndpoint {
            // the signing secret is only part of the create response
            if let Value::Object(map) = &mut value {
                map.remove("secret");
            }
        }
        decode(value)
    }

    async fn update<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        params: &FormParams,
    ) -> Result<T> {
        self.record(Verb::Update, object, Some(id), params.clone(), &[])?;

        let mut state = self.state.lock();
        let stored = state
            .objects
            .get_mut(&(object, id.to_string()))
            .ok_or_else(|| not_found(object, id))?;
        let Value::Object(stored_map) = stored else {
            return Err(not_found(object, id));
        };

        let mut patch = FormParams::new();
        for (key, raw) in params.iter() {
            if key == "metadata" {
                stored_map.insert("metadata".to_string(), json!({}));
            } else if let Some(rest) = key.strip_prefix("metadata[") {
                let metadata = stored_map
                    .entry("metadata".to_string())
                    .or_insert_with(|| json!({}));
                if let Value::Object(metadata) = metadata {
                    let name = rest.trim_end_matches(']');
                    if raw.is_empty() {
                        metadata.remove(name);
                    } else {
                        metadata.insert(name.to_string(), json!(raw));
                    }
                }
            } else if raw.is_empty() && !key.contains('[') {
                // an empty value unsets the field
                stored_map.insert(key.to_string(), Value::Null);
            } else {
                patch.push(key, raw);
            }
        }
        if let Value::Object(changes) = unflatten(&patch) {
            // top-level replace, so lists shrink instead of merging by index
            for (key, value) in changes {
                stored_map.insert(key, value);
            }
        }
        decode(Value::Object(stored_map.clone()))
    }

    async fn delete(&self, object: StripeObject, id: &str) -> Result<Deleted> {
        self.record(Verb::Delete, object, Some(id), FormParams::new(), &[])?;

        self.state
            .lock()
            .objects
            .remove(&(object, id.to_string()))
            .ok_or_else(|| not_found(object, id))?;
        Ok(Deleted {
            id: id.to_string(),
            deleted: true,
        })
    }
}

/// Resource data for a new resource from a JSON object literal
pub fn new_data(values: Value) -> ResourceData {
    ResourceData::new(values_map(values))
}

pub fn values_map(values: Value) -> IndexMap<String, Value> {
    serde_json::from_value(values).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unflatten_nested_form() {
        let mut params = FormParams::new();
        params
            .push("currency", "usd")
            .push("metadata[seats]", "5")
            .push("tiers[0][up_to]", 10)
            .push("tiers[0][unit_amount_decimal]", 1.5)
            .push("tiers[1][up_to]", "inf")
            .push("recurring[interval_count]", 3)
            .push("active", true);
        assert_eq!(
            unflatten(&params),
            json!({
                "currency": "usd",
                "metadata": {"seats": "5"},
                "tiers": [
                    {"up_to": 10, "unit_amount_decimal": "1.5"},
                    {"up_to": null}
                ],
                "recurring": {"interval_count": 3},
                "active": true
            })
        );
    }

    #[tokio::test]
    async fn test_update_unsets_metadata_keys() {
        let mock = MockStripe::new();
        mock.insert(
            StripeObject::Product,
            json!({"id": "prod_1", "name": "Gold", "metadata": {"a": "1", "b": "2"}}),
        );
        let mut params = FormParams::new();
        params.push("metadata[a]", "").push("metadata[c]", "3");
        let updated: Value = mock.update(StripeObject::Product, "prod_1", &params).await.unwrap();
        assert_eq!(updated["metadata"], json!({"b": "2", "c": "3"}));
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let mock = MockStripe::new();
        let err = mock
            .retrieve::<Value>(StripeObject::Coupon, "nope", &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
