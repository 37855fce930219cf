//! Materialized entities and their shared handles.
//!
//! An [`Entity`] is one row of one query stage: its declared fields, the two
//! provenance values stamped on by the materializer, and the relationship
//! arrays wired in by the graph builder. Entities are shared through
//! [`EntityRef`] handles so that a stage map and every relationship array
//! pointing at an entity observe the same instance.

use crate::naming::FieldNaming;
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Provenance key holding the row's source URL.
pub const URL_FIELD: &str = "__url";

/// Provenance key holding the server's entity-kind name.
pub const MODEL_FIELD: &str = "__model";

/// Declared field values of a row, in column order.
pub type FieldMap = Map<String, Value>;

/// Shared handle to an entity.
pub type EntityRef = Rc<RefCell<Entity>>;

/// Map key for entities.
///
/// Identifiers are coerced to text so that `403`, `403.0` and `"403"`
/// address the same entity, whichever form the row column or the join edge
/// uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(String);

impl EntityId {
    /// Coerce a JSON value to an identifier.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self(s.clone()),
            Value::Number(n) => Self(number_key(n)),
            Value::Bool(b) => Self(b.to_string()),
            Value::Null => Self("null".to_string()),
            other => Self(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Integral floats key as their integer text, so `1.0` and `1` collide.
fn number_key(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT => (f as i64).to_string(),
        _ => n.to_string(),
    }
}

const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// One materialized row.
#[derive(Default)]
pub struct Entity {
    class: Option<&'static str>,
    fields: FieldMap,
    url: Option<String>,
    model: Option<String>,
    relations: Vec<(String, Vec<EntityRef>)>,
}

impl Entity {
    /// Create an empty entity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entity from a row's field map, renaming every key with
    /// `naming`.
    pub fn from_fields(fields: &FieldMap, naming: FieldNaming) -> Self {
        let mut entity = Self::new();
        for (name, value) in fields {
            entity.set_field(naming.apply(name), value.clone());
        }
        entity
    }

    /// Tag the entity with a class name (set by class factories).
    pub fn with_class(mut self, class: &'static str) -> Self {
        self.class = Some(class);
        self
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EntityRef {
        Rc::new(RefCell::new(self))
    }

    /// The identifier, taken from the `id` field.
    pub fn id(&self) -> EntityId {
        EntityId::from_value(self.fields.get("id").unwrap_or(&Value::Null))
    }

    pub fn class(&self) -> Option<&'static str> {
        self.class
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Set a field, overwriting any existing value under the same name.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Source URL of the row, if the server sent one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Entity-kind name declared by the server.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Stamp the provenance values. A declared field that shares a
    /// provenance key is dropped so the two never disagree.
    pub fn stamp_provenance(&mut self, url: Option<String>, model: impl Into<String>) {
        self.fields.shift_remove(URL_FIELD);
        self.fields.shift_remove(MODEL_FIELD);
        self.url = url;
        self.model = Some(model.into());
    }

    /// Related entities under `name`, if that relationship was wired.
    pub fn related(&self, name: &str) -> Option<&[EntityRef]> {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entities)| entities.as_slice())
    }

    /// Names of every wired relationship, in the order they were installed.
    pub fn relation_names(&self) -> impl Iterator<Item = &str> {
        self.relations.iter().map(|(n, _)| n.as_str())
    }

    /// Install an empty relationship array under `name`, replacing any
    /// array already there.
    pub fn init_relation(&mut self, name: &str) {
        match self.relations.iter_mut().find(|(n, _)| n == name) {
            Some((_, entities)) => entities.clear(),
            None => self.relations.push((name.to_string(), Vec::new())),
        }
    }

    /// Append a related entity under `name`, creating the array if needed.
    pub fn push_related(&mut self, name: &str, entity: EntityRef) {
        match self.relations.iter_mut().find(|(n, _)| n == name) {
            Some((_, entities)) => entities.push(entity),
            None => self.relations.push((name.to_string(), vec![entity])),
        }
    }

    /// Drop every relationship array.
    ///
    /// Forward and reverse arrays reference each other, so entities that
    /// were linked stay alive until this is called on one side.
    pub fn clear_relations(&mut self) {
        self.relations.clear();
    }

    /// Plain-data form: every field plus the two provenance keys.
    ///
    /// Relationship arrays are not included.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(
            URL_FIELD.to_string(),
            self.url.clone().map(Value::String).unwrap_or(Value::Null),
        );
        map.insert(
            MODEL_FIELD.to_string(),
            self.model.clone().map(Value::String).unwrap_or(Value::Null),
        );
        Value::Object(map)
    }

    /// Whether a plain object carries both provenance keys.
    pub fn looks_like_entity(map: &Map<String, Value>) -> bool {
        map.contains_key(URL_FIELD) && map.contains_key(MODEL_FIELD)
    }

    /// Rebuild an entity from its plain-data form.
    ///
    /// Returns `None` when the object lacks either provenance key.
    pub fn from_value(map: &Map<String, Value>) -> Option<Self> {
        if !Self::looks_like_entity(map) {
            return None;
        }
        let mut entity = Self::new();
        for (name, value) in map {
            if name != URL_FIELD && name != MODEL_FIELD {
                entity.set_field(name.clone(), value.clone());
            }
        }
        entity.url = map.get(URL_FIELD).and_then(Value::as_str).map(String::from);
        entity.model = map.get(MODEL_FIELD).and_then(Value::as_str).map(String::from);
        Some(entity)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// Relationship arrays are cyclic, so only related ids are printed.
impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relations: Vec<(&str, Vec<String>)> = self
            .relations
            .iter()
            .map(|(name, entities)| {
                let ids = entities
                    .iter()
                    .map(|e| match e.try_borrow() {
                        Ok(e) => e.id().to_string(),
                        Err(_) => "<borrowed>".to_string(),
                    })
                    .collect();
                (name.as_str(), ids)
            })
            .collect();
        f.debug_struct("Entity")
            .field("class", &self.class)
            .field("fields", &self.fields)
            .field("url", &self.url)
            .field("model", &self.model)
            .field("relations", &relations)
            .finish()
    }
}
