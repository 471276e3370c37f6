//! Declarative attribute schemas.
//!
//! A [`Schema`] lists the attributes of a resource together with their
//! type and behavior flags. It is the configuration-facing contract of a
//! resource: validation, defaults and plan-time diffing all derive from it.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
    data::{as_integer, values_equal},
    diagnostics::{Diagnostic, ValidationResult},
};

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Float,
    Bool,
    /// String-to-string map
    Map,
    /// Ordered list of strings
    List,
    /// Ordered list of nested records
    Block {
        schema: Schema,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
}

impl AttributeType {
    pub fn block(schema: Schema) -> Self {
        AttributeType::Block {
            schema,
            max_items: None,
        }
    }

    pub fn single_block(schema: Schema) -> Self {
        AttributeType::Block {
            schema,
            max_items: Some(1),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Int => "integer",
            AttributeType::Float => "number",
            AttributeType::Bool => "bool",
            AttributeType::Map => "map of strings",
            AttributeType::List => "list of strings",
            AttributeType::Block { .. } => "list of objects",
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One attribute of a resource schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeType,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub computed: bool,
    /// Changing this attribute replaces the resource
    #[serde(skip_serializing_if = "is_false")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Map keys the server fills in when the configuration leaves them out
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub server_filled_keys: Vec<String>,
}

impl Attribute {
    fn base(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            default: None,
            conflicts_with: Vec::new(),
            allowed_values: Vec::new(),
            server_filled_keys: Vec::new(),
        }
    }

    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::base(kind)
        }
    }

    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::base(kind)
        }
    }

    /// Attribute set only by the server
    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::base(kind)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Optional attribute that the server fills in when left unset
    pub fn also_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn conflicts_with(mut self, others: &[&str]) -> Self {
        self.conflicts_with = others.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn server_filled_keys(mut self, keys: &[&str]) -> Self {
        self.server_filled_keys = keys.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Computed-only attributes are never part of a user's configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Attribute schema of one resource type (or of a nested block)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub attributes: IndexMap<String, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fill in declared defaults for attributes left unset
    pub fn apply_defaults(&self, values: &mut IndexMap<String, Value>) {
        for (name, attribute) in &self.attributes {
            let Some(default) = &attribute.default else {
                continue;
            };
            let unset = values.get(name).map(Value::is_null).unwrap_or(true);
            if unset {
                values.insert(name.clone(), default.clone());
            }
        }
    }

    /// Check `values` against this schema
    pub fn validate(&self, values: &IndexMap<String, Value>) -> ValidationResult {
        let mut diagnostics = Vec::new();
        self.validate_into(values, "", &mut diagnostics);
        ValidationResult::from_diagnostics(diagnostics)
    }

    fn validate_into(
        &self,
        values: &IndexMap<String, Value>,
        prefix: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let present = |name: &str| values.get(name).map(|v| !v.is_null()).unwrap_or(false);

        for (name, value) in values {
            if value.is_null() {
                continue;
            }
            let path = format!("{}{}", prefix, name);
            match self.attributes.get(name) {
                Some(attribute) => check_value(attribute, value, &path, diagnostics),
                None => diagnostics.push(
                    Diagnostic::error("unsupported attribute").with_field(path),
                ),
            }
        }

        for (name, attribute) in &self.attributes {
            if attribute.required && !present(name) {
                diagnostics.push(
                    Diagnostic::error("required attribute is missing")
                        .with_field(format!("{}{}", prefix, name)),
                );
            }
            if !present(name) {
                continue;
            }
            for other in &attribute.conflicts_with {
                // report each conflicting pair once
                if present(other) && name.as_str() < other.as_str() {
                    diagnostics.push(
                        Diagnostic::error(format!("conflicts with {}", other))
                            .with_field(format!("{}{}", prefix, name)),
                    );
                }
            }
        }
    }

    /// Attributes whose proposed value differs from the prior one.
    ///
    /// Computed-only attributes are ignored, and an optional+computed
    /// attribute left unset keeps whatever the server reported. An attribute
    /// left unset whose prior value is a zero value (`false`, `0`, `""`) is
    /// unchanged. Nested blocks are compared field by field with the same
    /// rules. Map keys the server fills in only count when configured.
    pub fn diff(
        &self,
        prior: &IndexMap<String, Value>,
        proposed: &IndexMap<String, Value>,
    ) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(name, attribute)| {
                attribute_changed(
                    attribute,
                    prior.get(name.as_str()),
                    proposed.get(name.as_str()),
                )
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The subset of `changed` that cannot be updated in place
    pub fn requires_replace(&self, changed: &[String]) -> Vec<String> {
        changed
            .iter()
            .filter(|name| {
                self.attributes
                    .get(name.as_str())
                    .map(|a| a.force_new)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn attribute_changed(attribute: &Attribute, prior: Option<&Value>, proposed: Option<&Value>) -> bool {
    if attribute.is_computed_only() {
        return false;
    }
    let Some(proposed) = proposed.filter(|v| !v.is_null()) else {
        return !attribute.computed && prior.map(|p| !is_zero_value(p)).unwrap_or(false);
    };
    match (&attribute.kind, prior, proposed) {
        (AttributeType::Block { schema, .. }, Some(Value::Array(old)), Value::Array(new)) => {
            old.len() != new.len()
                || old
                    .iter()
                    .zip(new)
                    .any(|(old, new)| block_changed(schema, old, new))
        }
        (AttributeType::Map, Some(Value::Object(old)), Value::Object(new))
            if !attribute.server_filled_keys.is_empty() =>
        {
            let mut old = old.clone();
            old.retain(|key, _| {
                new.contains_key(key) || !attribute.server_filled_keys.contains(key)
            });
            !values_equal(Some(&Value::Object(old)), Some(proposed))
        }
        _ => !values_equal(prior, Some(proposed)),
    }
}

fn block_changed(schema: &Schema, prior: &Value, proposed: &Value) -> bool {
    let (Some(old), Some(new)) = (prior.as_object(), proposed.as_object()) else {
        return !values_equal(Some(prior), Some(proposed));
    };
    schema
        .attributes
        .iter()
        .any(|(name, attribute)| attribute_changed(attribute, old.get(name), new.get(name)))
}

fn check_value(attribute: &Attribute, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let type_ok = match &attribute.kind {
        AttributeType::String => value.is_string(),
        AttributeType::Int => as_integer(value).is_some(),
        AttributeType::Float => value.is_number(),
        AttributeType::Bool => value.is_boolean(),
        AttributeType::Map => value
            .as_object()
            .map(|m| m.values().all(Value::is_string))
            .unwrap_or(false),
        AttributeType::List => value
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false),
        AttributeType::Block { schema, max_items } => {
            let Some(items) = value.as_array() else {
                diagnostics.push(type_error(attribute, value, path));
                return;
            };
            if let Some(max) = max_items {
                if items.len() > *max {
                    diagnostics.push(
                        Diagnostic::error(format!("at most {} element(s) allowed", max))
                            .with_field(path)
                            .with_received(items.len().to_string()),
                    );
                }
            }
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, idx);
                match item.as_object() {
                    Some(map) => {
                        let nested: IndexMap<String, Value> =
                            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                        schema.validate_into(&nested, &format!("{}.", item_path), diagnostics);
                    }
                    None => diagnostics.push(
                        Diagnostic::error("expected an object")
                            .with_field(item_path)
                            .with_received(item.to_string()),
                    ),
                }
            }
            true
        }
    };

    if !type_ok {
        diagnostics.push(type_error(attribute, value, path));
        return;
    }

    if !attribute.allowed_values.is_empty() {
        if let Some(s) = value.as_str() {
            if !attribute.allowed_values.iter().any(|allowed| allowed == s) {
                diagnostics.push(
                    Diagnostic::error(format!("\"{}\" is not a valid value", s))
                        .with_field(path)
                        .with_expected(format!(
                            "one of {}",
                            attribute
                                .allowed_values
                                .iter()
                                .map(|v| format!("'{}'", v))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                        .with_received(s),
                );
            }
        }
    }
}

fn type_error(attribute: &Attribute, value: &Value, path: &str) -> Diagnostic {
    Diagnostic::error("invalid type")
        .with_field(path)
        .with_expected(attribute.kind.name())
        .with_received(value.to_string())
}

/// Schemas of a whole provider: its own configuration plus every resource type
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resource_schemas: IndexMap<String, Schema>,
}

impl ProviderSchema {
    pub fn new(provider: Schema) -> Self {
        Self {
            provider,
            resource_schemas: IndexMap::new(),
        }
    }

    pub fn with_resource(mut self, type_name: &str, schema: Schema) -> Self {
        self.resource_schemas.insert(type_name.to_string(), schema);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn values(value: Value) -> IndexMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    fn tier_schema() -> Schema {
        Schema::new()
            .with_attribute("up_to", Attribute::optional(AttributeType::Int))
            .with_attribute("up_to_inf", Attribute::optional(AttributeType::Bool))
    }

    fn schema() -> Schema {
        Schema::new()
            .with_attribute(
                "currency",
                Attribute::required(AttributeType::String).force_new(),
            )
            .with_attribute(
                "amount",
                Attribute::optional(AttributeType::Int)
                    .also_computed()
                    .force_new()
                    .conflicts_with(&["amount_decimal"]),
            )
            .with_attribute(
                "amount_decimal",
                Attribute::optional(AttributeType::Float)
                    .also_computed()
                    .force_new()
                    .conflicts_with(&["amount"]),
            )
            .with_attribute(
                "usage_type",
                Attribute::optional(AttributeType::String)
                    .with_default("licensed")
                    .one_of(&["licensed", "metered"]),
            )
            .with_attribute("nickname", Attribute::optional(AttributeType::String))
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute(
                "tier",
                Attribute::optional(AttributeType::block(tier_schema())).force_new(),
            )
            .with_attribute(
                "transform_usage",
                Attribute::optional(AttributeType::single_block(Schema::new())),
            )
            .with_attribute("created", Attribute::computed(AttributeType::Int))
    }

    #[test]
    fn test_valid_values_pass() {
        let result = schema().validate(&values(json!({
            "currency": "usd",
            "amount": 0,
            "metadata": {"team": "billing"},
            "tier": [{"up_to": 10}, {"up_to_inf": true}]
        })));
        assert!(result.is_valid, "{:?}", result.diagnostics);
    }

    #[test]
    fn test_missing_required() {
        let result = schema().validate(&values(json!({"nickname": "basic"})));
        assert_eq!(result.error_count, 1);
        assert_eq!(result.diagnostics[0].field.as_deref(), Some("currency"));
    }

    #[test]
    fn test_conflicts_reported_once() {
        let result = schema().validate(&values(json!({
            "currency": "usd", "amount": 100, "amount_decimal": 100.5
        })));
        assert_eq!(result.error_count, 1);
        assert_eq!(result.diagnostics[0].field.as_deref(), Some("amount"));
        assert_eq!(result.diagnostics[0].message, "conflicts with amount_decimal");
    }

    #[test]
    fn test_allowed_values() {
        let result = schema().validate(&values(json!({
            "currency": "usd", "usage_type": "hourly"
        })));
        assert!(!result.is_valid);
        assert_eq!(result.diagnostics[0].received.as_deref(), Some("hourly"));
    }

    #[test]
    fn test_nested_block_paths_and_types() {
        let result = schema().validate(&values(json!({
            "currency": "usd",
            "tier": [{"up_to": 10}, {"up_to": "lots"}, {"bogus": 1}]
        })));
        let fields: Vec<_> = result
            .diagnostics
            .iter()
            .filter_map(|d| d.field.clone())
            .collect();
        assert_eq!(fields, vec!["tier.1.up_to", "tier.2.bogus"]);
    }

    #[test]
    fn test_max_items() {
        let result = schema().validate(&values(json!({
            "currency": "usd", "transform_usage": [{}, {}]
        })));
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn test_unsupported_attribute() {
        let result = schema().validate(&values(json!({"currency": "usd", "colour": "red"})));
        assert_eq!(result.diagnostics[0].message, "unsupported attribute");
    }

    #[test]
    fn test_apply_defaults_keeps_explicit_values() {
        let mut v = values(json!({"currency": "usd", "usage_type": "metered"}));
        schema().apply_defaults(&mut v);
        assert_eq!(v["usage_type"], json!("metered"));

        let mut v = values(json!({"currency": "usd", "usage_type": null}));
        schema().apply_defaults(&mut v);
        assert_eq!(v["usage_type"], json!("licensed"));
    }

    #[test]
    fn test_diff_and_replace() {
        let prior = values(json!({
            "currency": "usd", "amount": 100, "nickname": "a", "created": 1, "usage_type": "licensed"
        }));
        let proposed = values(json!({
            "currency": "eur", "nickname": "b", "usage_type": "licensed"
        }));
        let s = schema();
        let changed = s.diff(&prior, &proposed);
        // amount is optional+computed and left unset, created is computed only
        assert_eq!(changed, vec!["currency", "nickname"]);
        assert_eq!(s.requires_replace(&changed), vec!["currency"]);
    }

    #[test]
    fn test_diff_ignores_server_filled_block_fields() {
        let s = schema();
        let prior = values(json!({
            "currency": "usd",
            "tier": [{"up_to": 10, "up_to_inf": false}, {"up_to": 0, "up_to_inf": true}]
        }));
        let proposed = values(json!({
            "currency": "usd",
            "tier": [{"up_to": 10}, {"up_to_inf": true}]
        }));
        assert!(s.diff(&prior, &proposed).is_empty());

        let proposed = values(json!({
            "currency": "usd",
            "tier": [{"up_to": 20}, {"up_to_inf": true}]
        }));
        assert_eq!(s.diff(&prior, &proposed), vec!["tier"]);
    }

    #[test]
    fn test_diff_removed_value() {
        let s = schema();
        let prior = values(json!({"currency": "usd", "nickname": "a", "metadata": {}}));
        let proposed = values(json!({"currency": "usd"}));
        assert_eq!(s.diff(&prior, &proposed), vec!["nickname"]);
    }

    #[test]
    fn test_diff_ignores_server_filled_map_keys() {
        let s = Schema::new().with_attribute(
            "recurring",
            Attribute::optional(AttributeType::Map)
                .force_new()
                .server_filled_keys(&["interval_count", "usage_type"]),
        );
        let prior = values(json!({
            "recurring": {"interval": "month", "interval_count": "1", "usage_type": "licensed"}
        }));

        let same = values(json!({"recurring": {"interval": "month"}}));
        assert!(s.diff(&prior, &same).is_empty());

        let yearly = values(json!({"recurring": {"interval": "year"}}));
        assert_eq!(s.diff(&prior, &yearly), vec!["recurring"]);
        assert_eq!(s.requires_replace(&["recurring".to_string()]), vec!["recurring"]);

        let metered = values(json!({"recurring": {"interval": "month", "usage_type": "metered"}}));
        assert_eq!(s.diff(&prior, &metered), vec!["recurring"]);

        let one_time = values(json!({}));
        assert_eq!(s.diff(&prior, &one_time), vec!["recurring"]);
    }

    #[test]
    fn test_schema_serializes() {
        let json = serde_json::to_value(
            Schema::new().with_attribute("code", Attribute::required(AttributeType::String)),
        )
        .unwrap();
        assert_eq!(
            json,
            json!({"attributes": {"code": {"type": "string", "required": true}}})
        );
    }
}
