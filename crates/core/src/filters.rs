//! Facet-filter wire shapes and composition.
//!
//! Filters are forwarded to the search API verbatim inside
//! `requestOptions.facetFilters`. Field names and relation types follow the
//! backend's camelCase/uppercase conventions.

use serde::{Deserialize, Serialize};

/// Comparison operator understood by the search backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationType {
    Equals,
    Gt,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValue {
    pub relation_type: RelationType,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetFilter {
    pub field_name: String,
    pub values: Vec<FilterValue>,
}

impl FacetFilter {
    pub fn equals(field_name: &str, value: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            values: vec![FilterValue {
                relation_type: RelationType::Equals,
                value: value.to_string(),
            }],
        }
    }

    pub fn greater_than(field_name: &str, value: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            values: vec![FilterValue { relation_type: RelationType::Gt, value: value.to_string() }],
        }
    }
}

/// Restricts results to a single record type (`opportunity`, `account`, ...).
pub fn record_type_filter(record_type: &str) -> Vec<FacetFilter> {
    vec![FacetFilter::equals("type", record_type)]
}

/// Merges two independently produced filter fragments by concatenation,
/// existing fragment first.
///
/// Duplicate or contradictory filters on the same field are preserved and
/// forwarded as-is; resolving them is the caller's responsibility.
pub fn merge_facet_filters(
    existing: Option<Vec<FacetFilter>>,
    new: Option<Vec<FacetFilter>>,
) -> Option<Vec<FacetFilter>> {
    match (existing, new) {
        (None, None) => None,
        (Some(existing), None) => Some(existing),
        (None, Some(new)) => Some(new),
        (Some(mut existing), Some(new)) => {
            existing.extend(new);
            Some(existing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{merge_facet_filters, record_type_filter, FacetFilter, RelationType};

    #[test]
    fn merge_of_two_absent_fragments_is_absent() {
        assert_eq!(merge_facet_filters(None, None), None);
    }

    #[test]
    fn merge_with_one_absent_fragment_returns_the_other() {
        let type_filter = record_type_filter("opportunity");
        assert_eq!(
            merge_facet_filters(Some(type_filter.clone()), None),
            Some(type_filter.clone())
        );
        assert_eq!(merge_facet_filters(None, Some(type_filter.clone())), Some(type_filter));
    }

    #[test]
    fn merge_concatenates_existing_first() {
        let type_filter = record_type_filter("opportunity");
        let date_filter = vec![FacetFilter::equals("last_updated_at", "past_week")];

        let merged = merge_facet_filters(Some(type_filter.clone()), Some(date_filter.clone()))
            .expect("merged filters should be present");

        assert_eq!(merged.len(), type_filter.len() + date_filter.len());
        assert_eq!(merged[0].field_name, "type");
        assert_eq!(merged[1].field_name, "last_updated_at");
    }

    #[test]
    fn merge_preserves_contradictory_fragments_on_the_same_field() {
        let first = vec![FacetFilter::equals("last_updated_at", "past_week")];
        let second = vec![FacetFilter::equals("last_updated_at", "past_month")];

        let merged = merge_facet_filters(Some(first), Some(second))
            .expect("merged filters should be present");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn filters_serialize_with_backend_field_casing() {
        let filter = FacetFilter::greater_than("last_updated_at", "2026-08-08");
        let json = serde_json::to_value(&filter).expect("filter should serialize");

        assert_eq!(json["fieldName"], "last_updated_at");
        assert_eq!(json["values"][0]["relationType"], "GT");
        assert_eq!(json["values"][0]["value"], "2026-08-08");

        let equals = FacetFilter::equals("type", "contact");
        assert_eq!(equals.values[0].relation_type, RelationType::Equals);
        let json = serde_json::to_value(&equals).expect("filter should serialize");
        assert_eq!(json["values"][0]["relationType"], "EQUALS");
    }
}
