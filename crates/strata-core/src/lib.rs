//! Core types for strata.
//!
//! A strata query runs in stages; the server answers with column-compacted
//! rows per stage plus the join edges between stages. This crate rebuilds
//! that answer into linked entities:
//!
//! - [`naming`]: optional camelCase renaming of field names
//! - [`entity`]: entities, identifiers and shared handles
//! - [`factory`]: per-stage construction strategies
//! - [`response`]: lenient wire types for the response envelope
//! - [`materialize`]: column data to entities
//! - [`graph`]: per-stage maps and relationship wiring
//! - [`revive`]: rebuilding entities from serialized data

pub mod entity;
pub mod factory;
pub mod graph;
pub mod materialize;
pub mod naming;
pub mod response;
pub mod revive;

pub use entity::{Entity, EntityId, EntityRef, FieldMap, MODEL_FIELD, URL_FIELD};
pub use factory::{ClassFactory, EntityClass, EntityFactory, FnFactory, Materialization};
pub use graph::{GraphBuilder, ResultGraph, StageMap};
pub use materialize::materialize;
pub use naming::{camel_case, camel_case_opt, FieldNaming};
pub use response::{JoinEdge, QueryResponse, StageData, StageResult};
pub use revive::{revive, revive_str, Revived};
