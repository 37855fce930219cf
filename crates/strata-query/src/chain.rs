//! Fluent query chain builder.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut chain = TermChain::new();
//! chain
//!     .join("Experiment.id=403", "experiments")?
//!     .join("Reaction", "reactions")?
//!     .with_class::<Reaction>()?
//!     .outer_join("Product", "products")?;
//!
//! assert_eq!(chain.render(), "Experiment.id=403, Reaction ?(Product)");
//! ```

use crate::error::{QueryError, QueryResult};
use crate::term::{separator, Term, TermKind};
use std::fmt;
use strata_core::{Entity, EntityClass, EntityFactory, FieldMap, Materialization};

/// Ordered list of terms that renders to query text.
#[derive(Debug, Clone, Default)]
pub struct TermChain {
    terms: Vec<Term>,
}

impl TermChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a term of any kind.
    pub fn push(
        &mut self,
        kind: TermKind,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<&mut Self> {
        self.terms.push(Term::new(kind, text, relationship)?);
        Ok(self)
    }

    pub fn join(
        &mut self,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<&mut Self> {
        self.push(TermKind::Join, text, relationship)
    }

    pub fn include(
        &mut self,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<&mut Self> {
        self.push(TermKind::Include, text, relationship)
    }

    pub fn exclude(
        &mut self,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<&mut Self> {
        self.push(TermKind::Exclude, text, relationship)
    }

    pub fn outer_join(
        &mut self,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<&mut Self> {
        self.push(TermKind::Outer, text, relationship)
    }

    /// Attach (or replace) the construction strategy of the last term.
    pub fn with_materialization(
        &mut self,
        materialization: Materialization,
    ) -> QueryResult<&mut Self> {
        let last = self.terms.last_mut().ok_or(QueryError::NoTerm)?;
        last.set_materialization(materialization);
        Ok(self)
    }

    /// Build the last term's entities with `factory`.
    pub fn with_factory(&mut self, factory: impl EntityFactory + 'static) -> QueryResult<&mut Self> {
        self.with_materialization(Materialization::custom(factory))
    }

    /// Build the last term's entities with a closure.
    pub fn with_fn<F>(&mut self, f: F) -> QueryResult<&mut Self>
    where
        F: Fn(&FieldMap) -> Entity + Send + Sync + 'static,
    {
        self.with_materialization(Materialization::from_fn(f))
    }

    /// Build the last term's entities as instances of `T`.
    pub fn with_class<T: EntityClass>(&mut self) -> QueryResult<&mut Self> {
        self.with_materialization(Materialization::class::<T>())
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Relationship name of every term, in order.
    pub fn relationship_names(&self) -> Vec<String> {
        self.terms
            .iter()
            .map(|t| t.relationship().to_string())
            .collect()
    }

    /// Construction strategy of every term, in order.
    pub fn materializations(&self) -> Vec<Materialization> {
        self.terms
            .iter()
            .map(|t| t.materialization().clone())
            .collect()
    }

    /// Render the chain to query text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TermChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prev: Option<TermKind> = None;
        for term in &self.terms {
            if let Some(prev) = prev {
                f.write_str(separator(prev, term.kind()))?;
            }
            write!(f, "{}", term)?;
            prev = Some(term.kind());
        }
        Ok(())
    }
}
