//! Wire types for the column-compacted query response.
//!
//! ```text
//! { result: {
//!     results: [ { model, join_index, tree, objects: [[targetId, sourceId], ..] }, .. ],
//!     data:    [ { fields: [..], objects: [[..], ..], urls: [..] }, .. ] } }
//! ```
//!
//! Every field deserializes leniently: a malformed column degrades to an
//! empty or absent value instead of failing the whole response.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// The `result` envelope of a query response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    /// Per-stage join metadata
    #[serde(default, deserialize_with = "lenient::list")]
    pub results: Vec<StageResult>,
    /// Per-stage column data; `None` when the server sent no data
    #[serde(default, deserialize_with = "lenient::opt_list")]
    pub data: Option<Vec<StageData>>,
}

impl QueryResponse {
    /// Parse the `result` envelope itself.
    pub fn from_result(result: Value) -> Self {
        if !result.is_object() {
            tracing::warn!("query result envelope is not an object, treating as empty");
            return Self::default();
        }
        serde_json::from_value(result).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "malformed query result envelope, treating as empty");
            Self::default()
        })
    }

    /// Parse a full response body, reading its `result` member.
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("result") {
            Some(result) => Self::from_result(result.clone()),
            None => {
                tracing::warn!("response body has no result envelope");
                Self::default()
            }
        }
    }

    /// Number of stages carrying data.
    pub fn stage_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }
}

/// Join metadata for one stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageResult {
    /// Entity-kind name of the stage's rows
    #[serde(default, deserialize_with = "lenient::string")]
    pub model: String,
    /// Stage this one was joined from; `None` for the first stage
    #[serde(default, deserialize_with = "lenient::index")]
    pub join_index: Option<usize>,
    /// Opaque hierarchical linkage, passed through unchanged
    #[serde(default)]
    pub tree: Option<Value>,
    /// Join edges, one per row
    #[serde(default, deserialize_with = "lenient::edges")]
    pub objects: Vec<JoinEdge>,
}

/// A `(targetId, sourceId)` pair linking a row to its join-source row.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEdge {
    pub target: Value,
    pub source: Value,
}

impl JoinEdge {
    pub fn new(target: impl Into<Value>, source: impl Into<Value>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Outer-join row without a parent: the source is falsy.
    pub fn is_orphan(&self) -> bool {
        match &self.source {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(_) | Value::Object(_) => false,
        }
    }
}

/// Column data for one stage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageData {
    /// Column names
    #[serde(default, deserialize_with = "lenient::strings")]
    pub fields: Vec<String>,
    /// Row values, parallel to `fields`; `None` when absent or not a list
    #[serde(default, deserialize_with = "lenient::rows")]
    pub objects: Option<Vec<Vec<Value>>>,
    /// Source URL per row
    #[serde(default, deserialize_with = "lenient::urls")]
    pub urls: Vec<Option<String>>,
}

mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    fn text(value: Value) -> String {
        match value {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(opt_list(d)?.unwrap_or_default())
    }

    pub fn opt_list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => String::new(),
            other => text(other),
        })
    }

    pub fn index<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        Ok(Value::deserialize(d)?
            .as_u64()
            .and_then(|i| usize::try_from(i).ok()))
    }

    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().map(text).collect(),
            _ => Vec::new(),
        })
    }

    pub fn rows<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<Vec<Value>>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(rows) => Some(
                rows.into_iter()
                    .map(|row| match row {
                        Value::Array(values) => values,
                        _ => Vec::new(),
                    })
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn urls<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Option<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Null => None,
                    other => Some(text(other)),
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn edges<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<JoinEdge>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Array(mut pair) if !pair.is_empty() => {
                        let source = if pair.len() > 1 {
                            pair.swap_remove(1)
                        } else {
                            Value::Null
                        };
                        Some(JoinEdge::new(pair.swap_remove(0), source))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }
}
