use std::time::Duration;

use scout_core::config::SearchConfig;
use scout_core::filters::FacetFilter;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{RequestOptions, SearchHit, SearchRequest, SearchResponse};

/// Failure classification for one search call. `user_message` turns each
/// variant into text safe to hand back to the model and the user; the
/// backend's status taxonomy is non-standard (404 means missing permissions,
/// not a missing route) so the mapping is explicit per code.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request timed out")]
    Timeout,
    #[error("search request failed with status {0}")]
    Status(u16),
    #[error("search transport failure: {0}")]
    Transport(String),
    #[error("search response could not be decoded: {0}")]
    Decode(String),
    #[error("search client configuration error: {0}")]
    Configuration(String),
}

impl SearchError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout | Self::Status(408) => {
                "The search took too long. Please try a more specific query.".to_string()
            }
            Self::Status(400) => {
                "There was an issue with the search query. Please try rephrasing your question."
                    .to_string()
            }
            Self::Status(401) => {
                "Your session has expired. Please log in again to continue.".to_string()
            }
            Self::Status(404) => {
                "You don't have permission to access this search feature. Contact your administrator if you believe this is an error."
                    .to_string()
            }
            Self::Status(405) => {
                "There's a configuration issue with the search system. Please contact support."
                    .to_string()
            }
            Self::Status(429) => {
                "Too many searches in a short time. Please wait a moment and try again.".to_string()
            }
            Self::Status(code) if *code >= 500 => {
                "The search system is temporarily unavailable. Please try again shortly."
                    .to_string()
            }
            Self::Status(code) => {
                format!("Search error ({code}). Please try again or contact support.")
            }
            Self::Transport(_) | Self::Decode(_) | Self::Configuration(_) => {
                "Something went wrong with this search. Please try again.".to_string()
            }
        }
    }
}

pub struct SearchClient {
    http: reqwest::Client,
    endpoint: String,
    api_token: SecretString,
    max_snippet_size: u32,
    facet_bucket_size: u32,
}

impl SearchClient {
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| SearchError::Configuration(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: api_url(&config.instance),
            api_token: config.api_token.clone(),
            max_snippet_size: config.max_snippet_size,
            facet_bucket_size: config.facet_bucket_size,
        })
    }

    /// Runs one search. Results arrive already permission-filtered by the
    /// backend, so an empty vec may mean "no access" as much as "no matches".
    pub async fn search(
        &self,
        query: &str,
        datasources: Option<&[&str]>,
        page_size: u32,
        facet_filters: Option<&[FacetFilter]>,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let request = SearchRequest {
            query: query.to_string(),
            page_size,
            max_snippet_size: self.max_snippet_size,
            request_options: RequestOptions {
                facet_bucket_size: self.facet_bucket_size,
                return_llm_content_over_snippets: true,
                datasources_filter: datasources
                    .map(|sources| sources.iter().map(|source| source.to_string()).collect()),
                facet_filters: facet_filters.map(<[FacetFilter]>::to_vec),
            },
        };

        debug!(
            event_name = "search.request",
            query,
            page_size,
            datasources = ?datasources,
            "issuing search request"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(event_name = "search.error_status", status = status.as_u16(), query);
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: SearchResponse =
            response.json().await.map_err(|err| SearchError::Decode(err.to_string()))?;

        let hits: Vec<SearchHit> = body.results.into_iter().map(SearchHit::from).collect();
        debug!(event_name = "search.response", query, hit_count = hits.len());
        Ok(hits)
    }
}

fn classify_send_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout
    } else {
        SearchError::Transport(err.to_string())
    }
}

/// Derives the search endpoint from the configured instance value.
///
/// A bare deployment name (`acme`) becomes `acme-be.glean.com`; anything
/// containing a dot is taken as a full hostname. Scheme prefixes and trailing
/// slashes in the configured value are tolerated.
pub fn api_url(instance: &str) -> String {
    let clean = instance
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');

    if clean.contains('.') {
        format!("https://{clean}/rest/api/v1/search")
    } else {
        format!("https://{clean}-be.glean.com/rest/api/v1/search")
    }
}

#[cfg(test)]
mod tests {
    use super::{api_url, SearchError};

    #[test]
    fn bare_instance_name_expands_to_backend_host() {
        assert_eq!(api_url("acme"), "https://acme-be.glean.com/rest/api/v1/search");
    }

    #[test]
    fn full_hostname_is_used_verbatim() {
        assert_eq!(
            api_url("search.acme.example.com"),
            "https://search.acme.example.com/rest/api/v1/search"
        );
    }

    #[test]
    fn scheme_and_trailing_slash_are_stripped() {
        assert_eq!(
            api_url("https://acme-be.glean.com/"),
            "https://acme-be.glean.com/rest/api/v1/search"
        );
        assert_eq!(api_url("http://acme/"), "https://acme-be.glean.com/rest/api/v1/search");
    }

    #[test]
    fn permission_denial_maps_to_admin_guidance() {
        let message = SearchError::Status(404).user_message();
        assert!(message.contains("permission"));
        assert!(message.contains("administrator"));
    }

    #[test]
    fn bad_request_asks_for_a_rephrase() {
        assert!(SearchError::Status(400).user_message().contains("rephrasing"));
    }

    #[test]
    fn expired_session_asks_the_user_to_log_in_again() {
        assert!(SearchError::Status(401).user_message().contains("log in again"));
    }

    #[test]
    fn method_misconfiguration_points_at_support() {
        assert!(SearchError::Status(405).user_message().contains("contact support"));
    }

    #[test]
    fn timeout_and_request_timeout_status_share_one_message() {
        assert_eq!(SearchError::Timeout.user_message(), SearchError::Status(408).user_message());
    }

    #[test]
    fn server_errors_map_to_temporary_unavailability() {
        for code in [500, 502, 503, 599] {
            let message = SearchError::Status(code).user_message();
            assert!(message.contains("temporarily unavailable"), "status {code}: {message}");
        }
    }

    #[test]
    fn unrecognized_status_includes_the_code() {
        assert!(SearchError::Status(418).user_message().contains("418"));
    }

    #[test]
    fn rate_limit_asks_the_user_to_wait() {
        assert!(SearchError::Status(429).user_message().contains("wait a moment"));
    }

    #[test]
    fn transport_and_decode_share_the_generic_message() {
        assert_eq!(
            SearchError::Transport("connection reset".to_string()).user_message(),
            SearchError::Decode("unexpected eof".to_string()).user_message()
        );
    }
}
