//! Query client implementation

use crate::args::{layer, RequestArgs};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::output::QueryOutput;
use crate::transport::{HttpTransport, Transport};
use std::path::Path;
use std::sync::Arc;
use strata_core::{EntityRef, GraphBuilder, Materialization, QueryResponse, StageMap};
use strata_query::TermChain;

/// Runs queries through a transport and rebuilds the result graph.
///
/// Entities in the output are `Rc`-shared, so the futures returned by
/// [`Client::perform_query`] and [`Client::run`] are not `Send`; drive them
/// on a current-thread runtime or a `LocalSet`.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client with the HTTP transport built from `config`.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Client configured from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        Self::new(ClientConfig::load(path)?)
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Final request arguments for `query`.
    pub fn request_args(&self, query: &str, params: Option<&RequestArgs>) -> RequestArgs {
        layer(&self.config.defaults, params, query)
    }

    /// Run `query` and rebuild its result graph.
    ///
    /// `relationships` names each stage. `materializations` and `existing`
    /// are per-stage and optional; an existing entity with the same
    /// identifier as a returned row is reused in place of a fresh one and
    /// has its relationship arrays rewired.
    ///
    /// Transport failures are returned unchanged; nothing is retried.
    ///
    /// The returned entities form `Rc` cycles through their relationship
    /// arrays and leak unless [`QueryOutput::unlink`] is called when the
    /// caller is done with them.
    pub async fn perform_query(
        &self,
        query: &str,
        relationships: &[String],
        materializations: Option<&[Materialization]>,
        params: Option<&RequestArgs>,
        existing: Option<&[Option<Vec<EntityRef>>]>,
    ) -> ClientResult<QueryOutput> {
        let args = self.request_args(query, params);
        let payload = self.transport.post(&self.config.endpoint, &args).await?;

        let response = QueryResponse::from_payload(&payload);
        let existing = existing.map(group_existing).unwrap_or_default();
        let graph = GraphBuilder::new(relationships)
            .materializations(materializations.unwrap_or_default())
            .existing(&existing)
            .naming(self.config.field_naming)
            .build(&response);

        tracing::info!(
            endpoint = %self.config.endpoint,
            stages = graph.len(),
            "query complete: {}",
            query
        );
        Ok(QueryOutput::from_graph(graph, relationships))
    }

    /// Run a term chain: query text, relationship names and factories all
    /// come from the chain.
    pub async fn run(
        &self,
        chain: &TermChain,
        params: Option<&RequestArgs>,
        existing: Option<&[Option<Vec<EntityRef>>]>,
    ) -> ClientResult<QueryOutput> {
        let relationships = chain.relationship_names();
        let materializations = chain.materializations();
        self.perform_query(
            &chain.render(),
            &relationships,
            Some(&materializations),
            params,
            existing,
        )
        .await
    }
}

/// Key each stage's previously known entities by identifier. Later
/// entries win on duplicate identifiers.
pub fn group_existing(arrays: &[Option<Vec<EntityRef>>]) -> Vec<Option<StageMap>> {
    arrays
        .iter()
        .map(|stage| stage.as_ref().map(|entities| entities.iter().cloned().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{QUERY_KEY, RETURN_DATA_KEY};
    use crate::transport::{FnTransport, TransportError};
    use futures::FutureExt;
    use serde_json::{json, Value};
    use std::rc::Rc;
    use std::sync::Mutex;
    use strata_core::{Entity, EntityId, FieldNaming};

    fn experiment_payload() -> Value {
        json!({
            "result": {
                "results": [
                    {"model": "Experiment", "join_index": -1, "tree": null, "objects": [[403, null]]},
                    {"model": "Reaction", "join_index": 0, "tree": null,
                     "objects": [[23063, 403], [23064, 403], [23057, 403]]}
                ],
                "data": [
                    {"fields": ["id", "lab_name"], "objects": [[403, "north"]], "urls": ["/e/403"]},
                    {"fields": ["id", "reaction_yield"],
                     "objects": [[23063, 0.4], [23064, 0.7], [23057, 0.1]],
                     "urls": ["/r/23063", "/r/23064", "/r/23057"]}
                ]
            }
        })
    }

    fn canned_client(config: ClientConfig, seen: Arc<Mutex<Vec<RequestArgs>>>) -> Client {
        let transport = FnTransport::new(move |_url: String, args: RequestArgs| {
            if let Ok(mut seen) = seen.lock() {
                seen.push(args);
            }
            async { Ok::<_, TransportError>(experiment_payload()) }.boxed()
        });
        Client::with_transport(config, transport)
    }

    fn names() -> Vec<String> {
        vec!["experiments".to_string(), "reactions".to_string()]
    }

    #[tokio::test]
    async fn test_perform_query_links_stages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let client = canned_client(ClientConfig::default(), Arc::clone(&seen));

        let output = client
            .perform_query("Experiment.id=403, Reaction", &names(), None, None, None)
            .await
            .unwrap();

        let experiments = output.objects.get("experiments").unwrap();
        let reactions = output.objects.get("reactions").unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(reactions.len(), 3);
        let linked = experiments[0].borrow().related("reactions").unwrap().len();
        assert_eq!(linked, 3);

        let args = seen.lock().unwrap()[0].clone();
        assert_eq!(args.get(QUERY_KEY), Some(&json!("Experiment.id=403, Reaction")));
        assert_eq!(args.get(RETURN_DATA_KEY), Some(&json!(true)));
        output.unlink();
    }

    #[tokio::test]
    async fn test_existing_arrays_substituted() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let client = canned_client(ClientConfig::default(), seen);

        let mut known = Entity::new();
        known.set_field("id", json!(23063));
        known.set_field("notes", json!("bench 4"));
        let known = known.into_ref();
        let existing = vec![None, Some(vec![Rc::clone(&known)])];

        let output = client
            .perform_query("q", &names(), None, None, Some(&existing))
            .await
            .unwrap();

        let reactions = output.objects.get("reactions").unwrap();
        assert!(Rc::ptr_eq(&reactions[0], &known));
        let parents = known.borrow().related("experiments").unwrap().to_vec();
        assert_eq!(parents[0].borrow().id(), EntityId::from(403i64));
        assert_eq!(known.borrow().field("notes"), Some(&json!("bench 4")));
        output.unlink();
    }

    #[tokio::test]
    async fn test_camel_case_config_renames_fields_and_relationships() {
        let config = ClientConfig {
            field_naming: FieldNaming::CamelCase,
            ..Default::default()
        };
        let client = canned_client(config, Arc::new(Mutex::new(Vec::new())));
        let relationships = vec!["lab_experiments".to_string(), "reactions".to_string()];

        let output = client
            .perform_query("q", &relationships, None, None, None)
            .await
            .unwrap();

        let reaction = &output.objects.get("reactions").unwrap()[0];
        assert!(reaction.borrow().field("reactionYield").is_some());
        assert!(reaction.borrow().related("labExperiments").is_some());
        assert!(output.objects.get("lab_experiments").is_some());
        output.unlink();
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = FnTransport::new(|_url: String, _args: RequestArgs| {
            let err = TransportError::Other("connection reset".to_string());
            async move { Err::<Value, _>(err) }.boxed()
        });
        let client = Client::with_transport(ClientConfig::default(), transport);

        let err = client
            .perform_query("q", &names(), None, None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_group_existing_later_entries_win() {
        let first = Entity::new().into_ref();
        first.borrow_mut().set_field("id", json!(1));
        let second = Entity::new().into_ref();
        second.borrow_mut().set_field("id", json!("1"));

        let grouped = group_existing(&[None, Some(vec![Rc::clone(&first), Rc::clone(&second)])]);

        assert!(grouped[0].is_none());
        let stage = grouped[1].as_ref().unwrap();
        assert_eq!(stage.len(), 1);
        assert!(Rc::ptr_eq(stage.get(&EntityId::from(1i64)).unwrap(), &second));
    }
}
