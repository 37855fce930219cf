//! Query text builder for strata.
//!
//! A [`TermChain`] collects typed terms (plain joins, include/exclude
//! filters, outer joins), each with the relationship name its stage is
//! exposed under and an optional entity factory, and renders them to the
//! query language's text form.

pub mod chain;
pub mod error;
pub mod term;

pub use chain::TermChain;
pub use error::{QueryError, QueryResult};
pub use term::{separator, Term, TermKind};
