//! Result graph reconstruction.
//!
//! [`GraphBuilder`] turns a [`QueryResponse`] into one [`StageMap`] per
//! stage and wires relationship arrays between every stage and the stage it
//! was joined from:
//!
//! 1. Materialize each stage in order. A caller-supplied existing entity
//!    with the same identifier replaces the fresh one.
//! 2. For each stage after the first, install an empty forward array on
//!    every entity of its join source and an empty reverse array on every
//!    entity of the stage itself, then push both directions for each join
//!    edge whose two ends resolve.
//!
//! Identifier collisions within a stage resolve last-row-wins. Edges whose
//! source is falsy (outer-join rows without a parent) or whose ends are not
//! in the maps are dropped silently.

use crate::entity::{EntityId, EntityRef};
use crate::factory::Materialization;
use crate::materialize::materialize;
use crate::naming::FieldNaming;
use crate::response::{QueryResponse, StageResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Insertion-ordered identifier → entity map for one stage.
///
/// Replacing an identifier keeps its original position.
#[derive(Clone, Default)]
pub struct StageMap {
    entries: Vec<(EntityId, EntityRef)>,
    index: HashMap<EntityId, usize>,
}

impl StageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under `id`, returning the entity it replaced.
    pub fn insert(&mut self, id: EntityId, entity: EntityRef) -> Option<EntityRef> {
        match self.index.get(&id) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, entity)),
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, entity));
                None
            }
        }
    }

    pub fn get(&self, id: &EntityId) -> Option<&EntityRef> {
        self.index.get(id).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn values(&self) -> impl Iterator<Item = &EntityRef> {
        self.entries.iter().map(|(_, entity)| entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityRef)> {
        self.entries.iter().map(|(id, entity)| (id, entity))
    }

    /// Handles to every entity, in map order.
    pub fn to_vec(&self) -> Vec<EntityRef> {
        self.values().cloned().collect()
    }
}

/// Keys each entity by its own identifier; later entities win.
impl FromIterator<EntityRef> for StageMap {
    fn from_iter<I: IntoIterator<Item = EntityRef>>(iter: I) -> Self {
        let mut map = Self::new();
        for entity in iter {
            let id = entity.borrow().id();
            map.insert(id, entity);
        }
        map
    }
}

impl fmt::Debug for StageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}

/// Output of [`GraphBuilder::build`].
///
/// Linked entities reference each other, so the graph leaks unless
/// [`ResultGraph::unlink`] is called once it is no longer needed.
#[derive(Debug, Default)]
pub struct ResultGraph {
    /// One map per stage, in stage order
    pub stages: Vec<StageMap>,
    /// Join tree per stage; the first stage never has one
    pub trees: Vec<Option<Value>>,
}

impl ResultGraph {
    pub fn stage(&self, index: usize) -> Option<&StageMap> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Clear the relationship arrays of every entity in the graph,
    /// breaking the reference cycles between linked stages.
    pub fn unlink(&self) {
        for entity in self.stages.iter().flat_map(StageMap::values) {
            entity.borrow_mut().clear_relations();
        }
    }
}

/// Builds a [`ResultGraph`] from a query response.
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    relationships: &'a [String],
    materializations: &'a [Materialization],
    existing: &'a [Option<StageMap>],
    naming: FieldNaming,
}

impl<'a> GraphBuilder<'a> {
    /// `relationships` names each stage, in stage order.
    pub fn new(relationships: &'a [String]) -> Self {
        Self {
            relationships,
            materializations: &[],
            existing: &[],
            naming: FieldNaming::Verbatim,
        }
    }

    /// Per-stage construction strategy. Stages past the end of the slice
    /// use [`Materialization::Default`].
    pub fn materializations(mut self, materializations: &'a [Materialization]) -> Self {
        self.materializations = materializations;
        self
    }

    /// Per-stage maps of previously known entities to reuse.
    pub fn existing(mut self, existing: &'a [Option<StageMap>]) -> Self {
        self.existing = existing;
        self
    }

    pub fn naming(mut self, naming: FieldNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn build(&self, response: &QueryResponse) -> ResultGraph {
        let Some(data) = response.data.as_ref() else {
            return ResultGraph::default();
        };

        let mut graph = ResultGraph {
            stages: Vec::with_capacity(data.len()),
            trees: vec![None; data.len()],
        };

        let fallback = Materialization::Default;
        for (i, stage) in data.iter().enumerate() {
            let model = response.results.get(i).map_or("", |r| r.model.as_str());
            let materialization = self.materializations.get(i).unwrap_or(&fallback);
            let existing = self.existing.get(i).and_then(Option::as_ref);

            let mut map = StageMap::new();
            for entity in materialize(stage, model, materialization, self.naming) {
                let id = entity.id();
                let entity = match existing.and_then(|known| known.get(&id)) {
                    Some(known) => Rc::clone(known),
                    None => entity.into_ref(),
                };
                map.insert(id, entity);
            }
            tracing::debug!(stage = i, model, entities = map.len(), "materialized stage");
            graph.stages.push(map);
        }

        for i in 1..graph.stages.len() {
            let Some(result) = response.results.get(i) else {
                continue;
            };
            self.link(&graph.stages, i, result);
            graph.trees[i] = result.tree.clone();
        }

        graph
    }

    fn link(&self, stages: &[StageMap], i: usize, result: &StageResult) {
        let Some(source_idx) = result.join_index else {
            return;
        };
        let Some(sources) = stages.get(source_idx) else {
            tracing::warn!(stage = i, join_index = source_idx, "join index out of range");
            return;
        };
        let targets = &stages[i];
        let (Some(forward), Some(reverse)) = (
            self.relationships.get(i),
            self.relationships.get(source_idx),
        ) else {
            tracing::warn!(stage = i, "no relationship name for joined stage");
            return;
        };
        let forward = self.naming.apply(forward);
        let reverse = self.naming.apply(reverse);

        for entity in sources.values() {
            entity.borrow_mut().init_relation(&forward);
        }
        for entity in targets.values() {
            entity.borrow_mut().init_relation(&reverse);
        }

        let mut linked = 0usize;
        for edge in &result.objects {
            if edge.is_orphan() {
                continue;
            }
            let target = targets.get(&EntityId::from_value(&edge.target));
            let source = sources.get(&EntityId::from_value(&edge.source));
            if let (Some(target), Some(source)) = (target, source) {
                source.borrow_mut().push_related(&forward, Rc::clone(target));
                target.borrow_mut().push_related(&reverse, Rc::clone(source));
                linked += 1;
            }
        }
        tracing::debug!(stage = i, join_index = source_idx, edges = linked, "linked stage");
    }
}
