//! Wire types for the search API.
//!
//! Request fields follow the backend's camelCase naming. Response fields are
//! all optional on the wire; `SearchHit` is the normalized in-process shape.

use scout_core::filters::FacetFilter;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub query: String,
    pub page_size: u32,
    pub max_snippet_size: u32,
    pub request_options: RequestOptions,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    pub facet_bucket_size: u32,
    /// Asks the backend for consolidated document content instead of the
    /// short snippet list; richer input for the model.
    pub return_llm_content_over_snippets: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasources_filter: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet_filters: Option<Vec<FacetFilter>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    #[serde(default)]
    pub document: RawDocument,
    #[serde(default)]
    pub llm_content: Option<String>,
    #[serde(default)]
    pub snippets: Vec<RawSnippet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub datasource: Option<String>,
    #[serde(default)]
    pub author: Option<RawAuthor>,
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSnippet {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// One normalized search result. Every field is present, defaulted where the
/// wire omitted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    pub datasource: String,
    pub author: String,
    pub updated_at: String,
}

impl From<RawResult> for SearchHit {
    fn from(raw: RawResult) -> Self {
        // Prefer consolidated content over the first snippet; a snippet's
        // `text` field over its legacy `snippet` field.
        let content = raw
            .llm_content
            .filter(|content| !content.is_empty())
            .or_else(|| {
                raw.snippets
                    .into_iter()
                    .next()
                    .and_then(|snippet| snippet.text.or(snippet.snippet))
            })
            .unwrap_or_default();

        Self {
            title: raw.document.title.unwrap_or_else(|| "Untitled".to_string()),
            url: raw.document.url.unwrap_or_default(),
            content,
            datasource: raw.document.datasource.unwrap_or_default(),
            author: raw
                .document
                .author
                .and_then(|author| author.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            updated_at: raw.document.update_time.unwrap_or_default(),
        }
    }
}
