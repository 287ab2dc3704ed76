//! The fixed tool catalog and dispatch boundary.
//!
//! Seven tools, each binding a rewrite pipeline, a data-source scope, a
//! result cap, and an optional record-type filter. Dispatch never fails a
//! turn: unknown names and tool errors both come back as user-safe text.

use std::sync::Arc;

use async_trait::async_trait;
use scout_core::aliases::AliasTable;
use scout_core::filters::{merge_facet_filters, record_type_filter, FacetFilter};
use scout_core::rewrite::{expand_account_aliases, parse_time_expression, quote_account_name};
use scout_search::client::{SearchClient, SearchError};
use scout_search::format::format_hits;
use scout_search::types::SearchHit;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const UNKNOWN_TOOL_MESSAGE: &str =
    "I don't have access to that information source. Let me try a different approach.";
pub const TOOL_FAILURE_MESSAGE: &str =
    "I ran into an issue searching for that information. Please try rephrasing your question.";

/// Search abstraction the registry dispatches through. The production
/// implementation is `SearchClient`; tests substitute scripted fakes.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        datasources: Option<&[&str]>,
        page_size: u32,
        facet_filters: Option<&[FacetFilter]>,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(
        &self,
        query: &str,
        datasources: Option<&[&str]>,
        page_size: u32,
        facet_filters: Option<&[FacetFilter]>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        SearchClient::search(self, query, datasources, page_size, facet_filters).await
    }
}

/// Which rewrite steps run before the search call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RewriteStrategy {
    /// Account-name quoting only.
    Quote,
    /// Temporal extraction, then quoting.
    QuoteWithTimeFilter,
    /// Temporal extraction, then alias expansion. No quoting: the OR-clause
    /// already carries its own quotes.
    AliasWithTimeFilter,
}

struct ToolBinding {
    name: &'static str,
    description: &'static str,
    query_description: &'static str,
    strategy: RewriteStrategy,
    datasources: Option<&'static [&'static str]>,
    result_cap: u32,
    record_type: Option<&'static str>,
    source_label: &'static str,
}

impl ToolBinding {
    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {"type": "string", "description": self.query_description}
                    },
                    "required": ["query"]
                }
            }
        })
    }
}

/// Catalog order doubles as the order the model sees the tools in.
const CATALOG: &[ToolBinding] = &[
    ToolBinding {
        name: "search_salesforce_opportunities",
        description: "Search Salesforce OPPORTUNITIES for renewals, contracts, deals. Query MUST start with account name.",
        query_description: "Query starting with account name",
        strategy: RewriteStrategy::QuoteWithTimeFilter,
        datasources: Some(&["salescloud"]),
        result_cap: 5,
        record_type: Some("opportunity"),
        source_label: "Salesforce Opportunities",
    },
    ToolBinding {
        name: "search_salesforce_accounts",
        description: "Search Salesforce ACCOUNT records for company info. Query MUST start with account name.",
        query_description: "Query starting with account name",
        strategy: RewriteStrategy::Quote,
        datasources: Some(&["salescloud"]),
        result_cap: 5,
        record_type: Some("account"),
        source_label: "Salesforce Accounts",
    },
    ToolBinding {
        name: "search_salesforce_contacts",
        description: "Search Salesforce for CLIENT contacts at partner companies. Use for 'who are the contacts at [Account]' questions. NOT for internal employees.",
        query_description: "Account name + contacts (e.g., 'Tesla contacts')",
        strategy: RewriteStrategy::Quote,
        datasources: Some(&["salescloud"]),
        result_cap: 5,
        record_type: Some("contact"),
        source_label: "Salesforce Contacts",
    },
    ToolBinding {
        name: "search_metrics_and_dashboards",
        description: "Search Salesforce/Looker for metrics, dashboards, funding. Query should include account name.",
        query_description: "Query with account name",
        strategy: RewriteStrategy::Quote,
        datasources: Some(&["salescloud", "looker"]),
        result_cap: 6,
        record_type: None,
        source_label: "Metrics (Salesforce + Looker)",
    },
    ToolBinding {
        name: "search_strategy_docs",
        description: "Search Google Drive for QBRs, Account Plans, strategy docs. Query should include account name.",
        query_description: "Query with account name",
        strategy: RewriteStrategy::AliasWithTimeFilter,
        datasources: Some(&["gdrive"]),
        result_cap: 5,
        record_type: None,
        source_label: "Google Drive",
    },
    ToolBinding {
        name: "search_communications",
        description: "Search Gong/Slack/Gmail for calls, sentiment, messages. Query should include account name.",
        query_description: "Query with account name",
        strategy: RewriteStrategy::AliasWithTimeFilter,
        datasources: Some(&["gong", "slack", "gmail"]),
        result_cap: 9,
        record_type: None,
        source_label: "Communications (Gong/Slack/Gmail)",
    },
    ToolBinding {
        name: "search_general_fallback",
        description: "Search ALL sources. Only use when user approves after other tools fail.",
        query_description: "Search query",
        strategy: RewriteStrategy::Quote,
        datasources: None,
        result_cap: 10,
        record_type: None,
        source_label: "All Sources",
    },
];

pub struct ToolRegistry {
    backend: Arc<dyn SearchBackend>,
    aliases: &'static AliasTable,
}

impl ToolRegistry {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend, aliases: AliasTable::shared() }
    }

    /// Tool catalog in the schema shape the model expects.
    pub fn schemas(&self) -> Vec<Value> {
        CATALOG.iter().map(ToolBinding::schema).collect()
    }

    /// Executes one tool call. Always returns user-safe text: unknown names,
    /// malformed arguments, and search failures are all converted here so a
    /// single bad tool call never fails the whole turn.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> String {
        let Some(binding) = CATALOG.iter().find(|binding| binding.name == name) else {
            warn!(event_name = "tools.unknown_name", tool = name);
            return UNKNOWN_TOOL_MESSAGE.to_string();
        };

        let Some(query) = parse_query_argument(arguments) else {
            warn!(event_name = "tools.bad_arguments", tool = name);
            return TOOL_FAILURE_MESSAGE.to_string();
        };

        let (rewritten, date_filter) = self.rewrite(binding.strategy, &query);
        let type_filter = binding.record_type.map(record_type_filter);
        let facet_filters = merge_facet_filters(type_filter, date_filter);

        debug!(event_name = "tools.dispatch", tool = name, query = %rewritten);

        match self
            .backend
            .search(&rewritten, binding.datasources, binding.result_cap, facet_filters.as_deref())
            .await
        {
            Ok(hits) => format_hits(&hits, binding.source_label),
            Err(error) => {
                warn!(event_name = "tools.search_failed", tool = name, error = %error);
                error.user_message()
            }
        }
    }

    fn rewrite(
        &self,
        strategy: RewriteStrategy,
        query: &str,
    ) -> (String, Option<Vec<FacetFilter>>) {
        match strategy {
            RewriteStrategy::Quote => (quote_account_name(query), None),
            RewriteStrategy::QuoteWithTimeFilter => {
                let (cleaned, date_filter) = parse_time_expression(query);
                (quote_account_name(&cleaned), date_filter)
            }
            RewriteStrategy::AliasWithTimeFilter => {
                let (cleaned, date_filter) = parse_time_expression(query);
                (expand_account_aliases(&cleaned, self.aliases), date_filter)
            }
        }
    }
}

fn parse_query_argument(arguments: &str) -> Option<String> {
    let value: Value = serde_json::from_str(arguments).ok()?;
    value.get("query")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use scout_core::filters::{FacetFilter, RelationType};
    use scout_search::client::SearchError;
    use scout_search::types::SearchHit;
    use tokio::sync::Mutex;

    use super::{SearchBackend, ToolRegistry, TOOL_FAILURE_MESSAGE, UNKNOWN_TOOL_MESSAGE};

    struct RecordedCall {
        query: String,
        datasources: Option<Vec<String>>,
        page_size: u32,
        facet_filters: Option<Vec<FacetFilter>>,
    }

    struct RecordingBackend {
        calls: Mutex<Vec<RecordedCall>>,
        response: Result<Vec<SearchHit>, SearchError>,
    }

    impl RecordingBackend {
        fn returning(response: Result<Vec<SearchHit>, SearchError>) -> Arc<Self> {
            Arc::new(Self { calls: Mutex::new(Vec::new()), response })
        }

        async fn last_call(&self) -> RecordedCall {
            let mut calls = self.calls.lock().await;
            calls.pop().expect("backend should have been called")
        }
    }

    #[async_trait]
    impl SearchBackend for RecordingBackend {
        async fn search(
            &self,
            query: &str,
            datasources: Option<&[&str]>,
            page_size: u32,
            facet_filters: Option<&[FacetFilter]>,
        ) -> Result<Vec<SearchHit>, SearchError> {
            self.calls.lock().await.push(RecordedCall {
                query: query.to_string(),
                datasources: datasources
                    .map(|sources| sources.iter().map(|source| source.to_string()).collect()),
                page_size,
                facet_filters: facet_filters.map(<[FacetFilter]>::to_vec),
            });
            match &self.response {
                Ok(hits) => Ok(hits.clone()),
                Err(SearchError::Status(code)) => Err(SearchError::Status(*code)),
                Err(SearchError::Timeout) => Err(SearchError::Timeout),
                Err(other) => Err(SearchError::Transport(other.to_string())),
            }
        }
    }

    fn arguments(query: &str) -> String {
        serde_json::json!({ "query": query }).to_string()
    }

    #[tokio::test]
    async fn opportunities_tool_quotes_extracts_time_and_scopes_salescloud() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        registry
            .dispatch("search_salesforce_opportunities", &arguments("Tesla renewal last week"))
            .await;

        let call = backend.last_call().await;
        assert_eq!(call.query, "\"Tesla\" renewal");
        assert_eq!(call.datasources, Some(vec!["salescloud".to_string()]));
        assert_eq!(call.page_size, 5);

        let filters = call.facet_filters.expect("type and date filters expected");
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].field_name, "type");
        assert_eq!(filters[0].values[0].value, "opportunity");
        assert_eq!(filters[1].field_name, "last_updated_at");
        assert_eq!(filters[1].values[0].value, "past_week");
    }

    #[tokio::test]
    async fn contacts_tool_applies_quoting_only() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        registry.dispatch("search_salesforce_contacts", &arguments("Tesla contacts")).await;

        let call = backend.last_call().await;
        assert_eq!(call.query, "\"Tesla\" contacts");
        let filters = call.facet_filters.expect("type filter expected");
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].values[0].value, "contact");
    }

    #[tokio::test]
    async fn communications_tool_expands_aliases_and_widens_the_cap() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        registry.dispatch("search_communications", &arguments("JPMC calls last month")).await;

        let call = backend.last_call().await;
        assert!(call.query.contains("(\"JPMorgan Chase\" OR \"JPMC\""));
        assert_eq!(
            call.datasources,
            Some(vec!["gong".to_string(), "slack".to_string(), "gmail".to_string()])
        );
        assert_eq!(call.page_size, 9);

        let filters = call.facet_filters.expect("date filter expected");
        assert_eq!(filters[0].values[0].relation_type, RelationType::Equals);
        assert_eq!(filters[0].values[0].value, "past_month");
    }

    #[tokio::test]
    async fn general_fallback_is_unscoped_with_a_wide_cap() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        registry.dispatch("search_general_fallback", &arguments("Acme onboarding")).await;

        let call = backend.last_call().await;
        assert_eq!(call.datasources, None);
        assert_eq!(call.page_size, 10);
        assert!(call.facet_filters.is_none());
    }

    #[tokio::test]
    async fn unknown_tool_name_deflects_without_calling_the_backend() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        let result = registry.dispatch("search_payroll", &arguments("anything")).await;

        assert_eq!(result, UNKNOWN_TOOL_MESSAGE);
        assert!(backend.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_arguments_map_to_the_failure_message() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend.clone());

        let result = registry.dispatch("search_salesforce_accounts", "not json").await;

        assert_eq!(result, TOOL_FAILURE_MESSAGE);
        assert!(backend.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn search_errors_surface_their_sentinel_message() {
        let backend = RecordingBackend::returning(Err(SearchError::Status(429)));
        let registry = ToolRegistry::new(backend);

        let result = registry.dispatch("search_salesforce_accounts", &arguments("Tesla")).await;

        assert_eq!(result, SearchError::Status(429).user_message());
    }

    #[tokio::test]
    async fn catalog_exposes_seven_tool_schemas() {
        let backend = RecordingBackend::returning(Ok(Vec::new()));
        let registry = ToolRegistry::new(backend);

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 7);
        for schema in &schemas {
            assert_eq!(schema["type"], "function");
            assert_eq!(
                schema["function"]["parameters"]["required"][0],
                "query",
                "every tool takes a required query argument"
            );
        }
        assert_eq!(schemas[0]["function"]["name"], "search_salesforce_opportunities");
        assert_eq!(schemas[6]["function"]["name"], "search_general_fallback");
    }
}
