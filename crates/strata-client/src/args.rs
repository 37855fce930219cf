//! Request argument layering.
//!
//! Final arguments are built from four layers, later layers winning:
//! built-in defaults, client-wide defaults, per-call params, and the fixed
//! overrides (query text and the return-data flag) that nothing can change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key carrying the query text.
pub const QUERY_KEY: &str = "q";
/// Always-true flag asking the server to return row data.
pub const RETURN_DATA_KEY: &str = "return_data";
/// Follow foreign keys when resolving terms.
pub const FOLLOW_FKS_KEY: &str = "follow_fks";
/// Ignore exclude filters.
pub const IGNORE_EXCLUDES_KEY: &str = "ignore_excludes";

/// Flat key/value arguments posted to the query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestArgs(Map<String, Value>);

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`RequestArgs::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copy every entry of `other` over this one.
    pub fn merge(&mut self, other: &RequestArgs) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Key/value pairs for a form-encoded body. Strings are sent as-is,
    /// everything else as JSON text.
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}

/// The lowest layer.
pub fn builtin_defaults() -> RequestArgs {
    RequestArgs::new()
        .with(FOLLOW_FKS_KEY, false)
        .with(IGNORE_EXCLUDES_KEY, false)
}

/// Layer the argument sources into the final request arguments.
pub fn layer(client_defaults: &RequestArgs, params: Option<&RequestArgs>, query: &str) -> RequestArgs {
    let mut args = builtin_defaults();
    args.merge(client_defaults);
    if let Some(params) = params {
        args.merge(params);
    }
    args.set(RETURN_DATA_KEY, true);
    args.set(QUERY_KEY, query);
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_defaults_only() {
        let args = layer(&RequestArgs::new(), None, "Experiment");

        assert_eq!(args.get(FOLLOW_FKS_KEY), Some(&json!(false)));
        assert_eq!(args.get(IGNORE_EXCLUDES_KEY), Some(&json!(false)));
        assert_eq!(args.get(RETURN_DATA_KEY), Some(&json!(true)));
        assert_eq!(args.get(QUERY_KEY), Some(&json!("Experiment")));
    }

    #[test]
    fn test_layers_override_in_order() {
        let client = RequestArgs::new()
            .with(FOLLOW_FKS_KEY, true)
            .with("limit", 10)
            .with("format", "compact");
        let params = RequestArgs::new().with("limit", 50);

        let args = layer(&client, Some(&params), "Reaction");

        assert_eq!(args.get(FOLLOW_FKS_KEY), Some(&json!(true)));
        assert_eq!(args.get("limit"), Some(&json!(50)));
        assert_eq!(args.get("format"), Some(&json!("compact")));
    }

    #[test]
    fn test_fixed_overrides_always_win() {
        let client = RequestArgs::new().with(RETURN_DATA_KEY, false);
        let params = RequestArgs::new()
            .with(QUERY_KEY, "something else")
            .with(RETURN_DATA_KEY, false);

        let args = layer(&client, Some(&params), "Experiment");

        assert_eq!(args.get(RETURN_DATA_KEY), Some(&json!(true)));
        assert_eq!(args.get(QUERY_KEY), Some(&json!("Experiment")));
    }

    #[test]
    fn test_form_pairs() {
        let args = RequestArgs::new().with("q", "A, B").with("return_data", true);
        assert_eq!(
            args.to_form_pairs(),
            vec![
                ("q".to_string(), "A, B".to_string()),
                ("return_data".to_string(), "true".to_string()),
            ]
        );
    }
}
