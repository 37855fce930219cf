//! Rebuilding entities from decoded JSON.
//!
//! Entities serialize to flat objects carrying `__url` and `__model`.
//! [`revive`] walks decoded data and rewraps every object that has both
//! keys as an entity; everything else stays plain. The walk continues into
//! an entity's own field values, so entities nested inside entities are
//! rewrapped too.

use crate::entity::{Entity, EntityRef, MODEL_FIELD, URL_FIELD};
use serde_json::Value;

/// Decoded data with entity-shaped objects rewrapped.
#[derive(Debug)]
pub enum Revived {
    /// An entity and its revived field values, in field order. Provenance
    /// keys are not repeated among the members.
    Entity(EntityRef, Vec<(String, Revived)>),
    Array(Vec<Revived>),
    Object(Vec<(String, Revived)>),
    Plain(Value),
}

impl Revived {
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Self::Entity(entity, _) => Some(entity),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Revived]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Member of an object, or field of an entity, by key.
    pub fn get(&self, key: &str) -> Option<&Revived> {
        match self {
            Self::Object(members) | Self::Entity(_, members) => {
                members.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Back to plain data; entities use their plain-data form.
    pub fn into_value(self) -> Value {
        match self {
            Self::Entity(entity, _) => entity.borrow().to_value(),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_value).collect()),
            Self::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect(),
            ),
            Self::Plain(value) => value,
        }
    }
}

/// Rewrap entity-shaped objects found anywhere in `value`.
///
/// The entity itself keeps its field values as plain data; the revived
/// form of each field travels alongside it.
pub fn revive(value: Value) -> Revived {
    match value {
        Value::Object(map) => match Entity::from_value(&map) {
            Some(entity) => {
                let members = map
                    .into_iter()
                    .filter(|(k, _)| k != URL_FIELD && k != MODEL_FIELD)
                    .map(|(k, v)| (k, revive(v)))
                    .collect();
                Revived::Entity(entity.into_ref(), members)
            }
            None => Revived::Object(map.into_iter().map(|(k, v)| (k, revive(v))).collect()),
        },
        Value::Array(items) => Revived::Array(items.into_iter().map(revive).collect()),
        other => Revived::Plain(other),
    }
}

/// Decode JSON text and [`revive`] it. Decode failures are returned as-is.
pub fn revive_str(json: &str) -> Result<Revived, serde_json::Error> {
    serde_json::from_str(json).map(revive)
}
