//! Individual query terms.

use crate::error::{QueryError, QueryResult};
use std::fmt;
use strata_core::Materialization;

/// How a term joins onto the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    /// Plain join: `term`
    Join,
    /// Keep rows that match: `+(term)`
    Include,
    /// Drop rows that match: `-(term)`
    Exclude,
    /// Outer join: `?(term)`
    Outer,
}

impl TermKind {
    /// Include or Exclude filters.
    pub fn is_conditional(self) -> bool {
        matches!(self, Self::Include | Self::Exclude)
    }

    /// Terms that join onto their neighbours by adjacency alone.
    pub fn joins_implicitly(self) -> bool {
        matches!(self, Self::Outer)
    }

    fn prefix(self) -> Option<char> {
        match self {
            Self::Join => None,
            Self::Include => Some('+'),
            Self::Exclude => Some('-'),
            Self::Outer => Some('?'),
        }
    }
}

/// Separator emitted between two consecutive terms.
///
/// A single space when either side is an outer join or when `next` is a
/// filter; a comma otherwise. A term that follows a filter is comma
/// separated unless it is itself a filter or an outer join.
pub fn separator(prev: TermKind, next: TermKind) -> &'static str {
    if prev.joins_implicitly() || next.joins_implicitly() || next.is_conditional() {
        " "
    } else {
        ", "
    }
}

/// One step of a query chain.
#[derive(Debug, Clone)]
pub struct Term {
    kind: TermKind,
    text: String,
    relationship: String,
    materialization: Materialization,
}

impl Term {
    /// Create a term. Both the text and the relationship name must be
    /// present; an empty string counts as missing.
    pub fn new(
        kind: TermKind,
        text: impl Into<String>,
        relationship: impl Into<String>,
    ) -> QueryResult<Self> {
        let text = text.into();
        let relationship = relationship.into();
        if text.is_empty() {
            return Err(QueryError::MissingTerm);
        }
        if relationship.is_empty() {
            return Err(QueryError::MissingRelationship(text));
        }
        Ok(Self {
            kind,
            text,
            relationship,
            materialization: Materialization::Default,
        })
    }

    pub fn kind(&self) -> TermKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn relationship(&self) -> &str {
        &self.relationship
    }

    pub fn materialization(&self) -> &Materialization {
        &self.materialization
    }

    pub fn set_materialization(&mut self, materialization: Materialization) {
        self.materialization = materialization;
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.prefix() {
            Some(prefix) => write!(f, "{}({})", prefix, self.text),
            None => f.write_str(&self.text),
        }
    }
}
