//! Form parameters in Stripe's bracketed encoding.
//!
//! Stripe takes `application/x-www-form-urlencoded` bodies where nesting is
//! expressed with brackets: `metadata[plan]=pro`, `tiers[0][up_to]=inf`,
//! `recurring[interval]=month`. [`FormParams`] keeps the pairs in insertion
//! order so requests are deterministic and easy to assert on.

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormParams(Vec<(String, String)>);

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// `prefix[key]=value` for every entry
    pub fn push_map(&mut self, prefix: &str, map: &IndexMap<String, String>) -> &mut Self {
        for (key, value) in map {
            self.push(format!("{}[{}]", prefix, key), value);
        }
        self
    }

    /// `prefix[i]=value` for every element
    pub fn push_list(&mut self, prefix: &str, items: &[String]) -> &mut Self {
        for (idx, item) in items.iter().enumerate() {
            self.push(format!("{}[{}]", prefix, idx), item);
        }
        self
    }

    /// Nest every pair of `inner` under `prefix`: `up_to` becomes `prefix[up_to]`
    pub fn push_object(&mut self, prefix: &str, inner: FormParams) -> &mut Self {
        for (key, value) in inner.0 {
            self.0.push((nest_key(prefix, &key), value));
        }
        self
    }

    /// Nest `inner` as element `idx` of the list `prefix`: `prefix[idx][up_to]`
    pub fn push_list_item(&mut self, prefix: &str, idx: usize, inner: FormParams) -> &mut Self {
        self.push_object(&format!("{}[{}]", prefix, idx), inner)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// URL-encoded request body
    pub fn encode(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(self)
    }
}

fn nest_key(prefix: &str, key: &str) -> String {
    match key.find('[') {
        Some(pos) => format!("{}[{}]{}", prefix, &key[..pos], &key[pos..]),
        None => format!("{}[{}]", prefix, key),
    }
}
