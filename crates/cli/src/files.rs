//! Provider, resource configuration and state files.
//!
//! Configuration files are YAML (JSON is accepted as a YAML subset). State
//! files are pretty-printed JSON holding one [`ResourceState`].

use std::{fs, path::Path};

use anyhow::{Context as _, bail};
use indexmap::IndexMap;
use serde_json::Value;
use stripeform_core::ProviderConfig;
use stripeform_types::ResourceState;

/// Load the provider file. A missing file means "configure from the
/// environment only".
pub fn load_provider_config(path: &Path) -> anyhow::Result<ProviderConfig> {
    if !path.exists() {
        return Ok(ProviderConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ProviderConfig::default());
    }
    serde_yml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load a resource's desired attribute values
pub fn load_resource_config(path: &Path) -> anyhow::Result<IndexMap<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_yml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Null => Ok(IndexMap::new()),
        other => bail!(
            "{} must contain a mapping of attribute names to values, found {}",
            path.display(),
            kind_of(&other)
        ),
    }
}

/// Load a state file, `None` when it does not exist yet
pub fn load_state(path: &Path) -> anyhow::Result<Option<ResourceState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let state = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file {}", path.display()))?;
    Ok(Some(state))
}

/// Like [`load_state`], for commands that need an existing resource
pub fn require_state(path: &Path) -> anyhow::Result<ResourceState> {
    load_state(path)?.with_context(|| format!("State file {} not found", path.display()))
}

pub fn save_state(path: &Path, state: &ResourceState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut content = serde_json::to_string_pretty(state)?;
    content.push('\n');
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn remove_state(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_missing_provider_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_provider_config(&temp_dir.path().join("stripeform.yaml")).unwrap();
        assert_eq!(config, ProviderConfig::default());
    }

    #[test]
    fn test_load_provider_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stripeform.yaml");
        fs::write(
            &path,
            "api_token: sk_test_file\napi_base: http://localhost:12111\n",
        )
        .unwrap();

        let config = load_provider_config(&path).unwrap();
        assert_eq!(config.api_token.as_deref(), Some("sk_test_file"));
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:12111"));
    }

    #[test]
    fn test_load_resource_yaml_keeps_order_and_nesting() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("price.yaml");
        fs::write(
            &path,
            r#"---
currency: usd
billing_scheme: tiered
tiers_mode: graduated
tier:
  - up_to: 100
    unit_amount: 10
  - up_to_inf: true
    unit_amount_decimal: 0.5
metadata:
  team: billing
"#,
        )
        .unwrap();

        let config = load_resource_config(&path).unwrap();
        let keys: Vec<_> = config.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["currency", "billing_scheme", "tiers_mode", "tier", "metadata"]
        );
        assert_eq!(config["tier"][0]["up_to"], json!(100));
        assert_eq!(config["tier"][1]["up_to_inf"], json!(true));
        assert_eq!(config["tier"][1]["unit_amount_decimal"], json!(0.5));
        assert_eq!(config["metadata"], json!({"team": "billing"}));
    }

    #[test]
    fn test_load_resource_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("coupon.json");
        fs::write(&path, r#"{"code": "SPRING", "duration": "once", "percent_off": 15}"#).unwrap();

        let config = load_resource_config(&path).unwrap();
        assert_eq!(config["code"], json!("SPRING"));
        assert_eq!(config["percent_off"], json!(15));
    }

    #[test]
    fn test_resource_config_must_be_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yaml");
        fs::write(&path, "- one\n- two\n").unwrap();

        let err = load_resource_config(&path).unwrap_err();
        assert!(err.to_string().contains("found a list"));
    }

    #[test]
    fn test_state_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("coupon.json");
        assert_eq!(load_state(&path).unwrap(), None);
        assert!(require_state(&path).is_err());

        let state = ResourceState {
            id: Some("SPRING".to_string()),
            attributes: [("duration".to_string(), json!("once"))].into_iter().collect(),
        };
        save_state(&path, &state).unwrap();
        assert_eq!(require_state(&path).unwrap(), state);

        remove_state(&path).unwrap();
        assert!(!path.exists());
        remove_state(&path).unwrap();
    }
}
