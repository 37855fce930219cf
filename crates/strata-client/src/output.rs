//! Name-keyed query output.

use serde_json::Value;
use strata_core::{EntityRef, ResultGraph};

/// Entities per relationship name, in stage order.
///
/// Stages sharing a relationship name get numbered keys: the second
/// `things` stage is stored under `things2`, the third under `things3`.
#[derive(Debug, Clone, Default)]
pub struct QueryObjects {
    entries: Vec<(String, Vec<EntityRef>)>,
}

impl QueryObjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under `name`, or the first free numbered variant of it.
    /// Returns the key used.
    pub fn insert_unique(&mut self, name: &str, entities: Vec<EntityRef>) -> String {
        let mut key = name.to_string();
        let mut suffix = 2;
        while self.contains(&key) {
            key = format!("{name}{suffix}");
            suffix += 1;
        }
        self.entries.push((key.clone(), entities));
        key
    }

    pub fn get(&self, name: &str) -> Option<&[EntityRef]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entities)| entities.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntityRef])> {
        self.entries
            .iter()
            .map(|(key, entities)| (key.as_str(), entities.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a completed query hands back to the caller.
///
/// Linked entities hold `Rc` handles to each other through their
/// relationship arrays, so dropping the output does not free them. Call
/// [`QueryOutput::unlink`] once the entities are no longer needed, or they
/// leak.
#[derive(Debug, Default)]
pub struct QueryOutput {
    pub objects: QueryObjects,
    /// Join tree per stage, passed through from the server
    pub trees: Vec<Option<Value>>,
}

impl QueryOutput {
    /// Reshape per-stage maps into name-keyed entity lists.
    ///
    /// A stage without a relationship name is keyed `stage{index}`.
    pub fn from_graph(graph: ResultGraph, relationships: &[String]) -> Self {
        let mut objects = QueryObjects::new();
        for (i, stage) in graph.stages.iter().enumerate() {
            let name = relationships
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("stage{i}"));
            objects.insert_unique(&name, stage.to_vec());
        }
        Self {
            objects,
            trees: graph.trees,
        }
    }

    /// Clear every relationship array reachable from the output.
    pub fn unlink(&self) {
        for (_, entities) in self.objects.iter() {
            for entity in entities {
                entity.borrow_mut().clear_relations();
            }
        }
    }
}
