//! Renders search hits into the text block handed back to the model.

use crate::types::SearchHit;

const MAX_ENTRIES: usize = 5;
const MAX_EXCERPT_CHARS: usize = 500;

/// Formats hits for model consumption: a count header, then up to five
/// entries with a bounded content excerpt.
///
/// An empty hit list produces a message that names both possible causes,
/// since the backend filters by permission and an empty set is ambiguous.
pub fn format_hits(hits: &[SearchHit], source_label: &str) -> String {
    if hits.is_empty() {
        return format!(
            "No accessible results found in {source_label}.\n\n\
             This could mean:\n\
             • No matching records exist for this query\n\
             • You may not have permission to view matching records in this source\n\n\
             Try a different source or rephrase your query."
        );
    }

    let mut entries = Vec::new();
    for (position, hit) in hits.iter().take(MAX_ENTRIES).enumerate() {
        let excerpt = truncate_chars(&hit.content, MAX_EXCERPT_CHARS);
        let mut entry = format!("**[{}] {}**\n", position + 1, hit.title);
        entry.push_str(&format!("- **Datasource: {}**\n", hit.datasource));
        entry.push_str(&format!("- Content: {excerpt}\n"));
        entry.push_str(&format!("- URL: {}\n", hit.url));
        entries.push(entry);
    }

    format!("Found {} result(s) from {}\n\n{}", hits.len(), source_label, entries.join("\n"))
}

/// Char-boundary-safe truncation with a trailing ellipsis when cut.
fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let mut truncated: String = content.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
