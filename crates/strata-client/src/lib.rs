//! Client for strata queries.
//!
//! A [`Client`] layers request arguments, posts the query through a
//! pluggable [`Transport`], rebuilds the response into linked entities with
//! [`strata_core::GraphBuilder`], and hands back a [`QueryOutput`] keyed by
//! relationship name.
//!
//! ```rust,ignore
//! let client = Client::new(ClientConfig::new("https://lab.example.org/api/query/"))?;
//!
//! let mut chain = TermChain::new();
//! chain
//!     .join("Experiment.id=403", "experiments")?
//!     .join("Reaction", "reactions")?;
//!
//! let output = client.run(&chain, None, None).await?;
//! for reaction in output.objects.get("reactions").unwrap_or_default() {
//!     println!("{:?}", reaction.borrow().field("reaction_yield"));
//! }
//! ```

pub mod args;
pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod transport;

pub use args::{layer, RequestArgs};
pub use client::{group_existing, Client};
pub use config::{BodyEncoding, ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use output::{QueryObjects, QueryOutput};
pub use transport::{EnvelopeTransport, FnTransport, HttpTransport, Transport, TransportError};

pub use strata_core::{Entity, EntityId, EntityRef, FieldNaming, Materialization};
pub use strata_query::{QueryError, TermChain, TermKind};
