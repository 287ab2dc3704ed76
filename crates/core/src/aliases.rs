//! The closed account-alias table.
//!
//! Account managers refer to the same account by several names ("JPMC",
//! "JP Morgan", "Chase"). The table maps each canonical account name to its
//! known aliases and is built once at startup into a case-insensitive lookup
//! structure; lookups are exact-substring matches, never fuzzy.

use std::sync::OnceLock;

/// One canonical account with its display-name expansion.
#[derive(Clone, Debug)]
struct AliasEntry {
    /// Canonical name first, then aliases in table order, deduplicated
    /// case-insensitively. Used verbatim when building OR-clauses.
    display_names: Vec<String>,
}

/// A successful lookup: the byte span of the matched substring in the
/// original query and the OR-of-quoted-names clause that replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasMatch {
    pub start: usize,
    pub end: usize,
    pub or_clause: String,
}

#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    /// Lowercased lookup keys in insertion order: for each entry the
    /// canonical name first, then its aliases. First key that matches wins.
    keys: Vec<(String, usize)>,
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut table = Self::default();
        for (canonical, aliases) in pairs {
            table.insert(canonical, aliases);
        }
        table
    }

    fn insert(&mut self, canonical: &str, aliases: &[&str]) {
        let index = self.entries.len();

        let mut display_names = vec![canonical.to_string()];
        for alias in aliases {
            let lowered = alias.to_ascii_lowercase();
            let seen = display_names.iter().any(|name| name.to_ascii_lowercase() == lowered);
            if !seen {
                display_names.push((*alias).to_string());
            }
        }
        self.entries.push(AliasEntry { display_names });

        self.keys.push((canonical.to_ascii_lowercase(), index));
        for alias in aliases {
            self.keys.push((alias.to_ascii_lowercase(), index));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the first lookup key (in table order) that occurs as a
    /// case-insensitive substring of `query` and returns the span of its
    /// first occurrence together with the expansion clause.
    pub fn first_match(&self, query: &str) -> Option<AliasMatch> {
        let query_lower = query.to_ascii_lowercase();

        for (key, index) in &self.keys {
            if let Some(start) = query_lower.find(key.as_str()) {
                let names = &self.entries[*index].display_names;
                let quoted =
                    names.iter().map(|name| format!("\"{name}\"")).collect::<Vec<_>>().join(" OR ");
                return Some(AliasMatch {
                    start,
                    end: start + key.len(),
                    or_clause: format!("({quoted})"),
                });
            }
        }

        None
    }

    /// The process-wide table of known accounts, built on first use.
    pub fn shared() -> &'static AliasTable {
        static TABLE: OnceLock<AliasTable> = OnceLock::new();
        TABLE.get_or_init(|| AliasTable::from_pairs(ACCOUNT_ALIASES))
    }
}

/// Known account aliases. Configuration data, not logic: extend this table
/// rather than special-casing names elsewhere.
const ACCOUNT_ALIASES: &[(&str, &[&str])] = &[
    ("JPMorgan Chase", &["JPMC", "JPM", "JP Morgan", "Chase"]),
    ("USAA", &[]),
    ("PNC", &[]),
    ("Fidelity", &[]),
    ("Discover", &[]),
    ("Allstate", &[]),
    ("Regions", &[]),
    ("Rocket", &[]),
    ("Zurich", &[]),
    ("AdventHealth", &["AH", "Advent Health", "Advent"]),
    ("Baylor Scott & White Health", &["BSWH", "Baylor Scott White", "BSW"]),
    ("Bon Secours Mercy Health", &["BSMH", "Bon Secours"]),
    ("UCHealth", &["UCH", "UC Health"]),
    ("Main Line Health", &["MLH"]),
    ("Sentara Health", &["Sentara"]),
    ("Humana", &[]),
    ("Baptist Health", &[]),
    ("CHRISTUS Health", &["CHRISTUS"]),
    ("Cincinnati Children's", &["Cinci Children's"]),
    ("IU Health", &["Indiana University Health"]),
    ("Johns Hopkins Health System", &["JHHS", "Johns Hopkins"]),
    ("Trinity Health", &[]),
    ("Providence", &[]),
    ("Sutter Health", &["Sutter"]),
    ("Wellstar", &[]),
    ("Sharp HealthCare", &["Sharp"]),
    ("The Cigna Group", &["Cigna"]),
    ("Walgreens", &[]),
    ("Walmart", &["WMT", "Wal-Mart"]),
    ("Target", &["TGT"]),
    ("Bath & Body Works", &["BBW", "Bath and Body Works"]),
    ("Kohl's", &["Kohls"]),
    ("Lowe's", &["Lowes"]),
    ("Macy's, Inc.", &["Macys", "Macy's"]),
    ("Sherwin-Williams", &["Sherwin Williams"]),
    ("Whole Foods Market", &["WFM", "Whole Foods"]),
    ("H-E-B", &["HEB"]),
    ("Hy-Vee and Affiliates", &["Hy-Vee", "HyVee"]),
    ("Giant Eagle", &[]),
    ("Meijer", &[]),
    ("Disney", &["Walt Disney", "WDW"]),
    ("Hilton", &[]),
    ("Herschend", &[]),
    ("Tesla", &[]),
    ("Ford", &[]),
    ("PepsiCo", &["Pepsi"]),
    ("Tyson", &["Tyson Foods"]),
    ("Smithfield", &[]),
    ("Hershey", &["The Hershey Company"]),
    ("Lennox", &[]),
    ("Chipotle", &[]),
    ("Five Guys", &[]),
    ("MOD Pizza", &["MOD"]),
    ("Din Tai Fung", &["DTF"]),
    ("Guild for Guilders", &["G4G"]),
    ("Charter", &[]),
    ("Sunrun", &[]),
    ("Lennar", &[]),
    ("Pitney Bowes", &[]),
];

#[cfg(test)]
mod tests {
    use super::AliasTable;

    fn fixture() -> AliasTable {
        AliasTable::from_pairs(&[
            ("JPMorgan Chase", &["JPMC", "JPM", "JP Morgan", "Chase"]),
            ("AdventHealth", &["AH", "Advent Health", "Advent"]),
        ])
    }

    #[test]
    fn matches_alias_case_insensitively() {
        let table = fixture();
        let matched = table.first_match("jpmc renewal").expect("alias should match");

        assert_eq!(&"jpmc renewal"[matched.start..matched.end], "jpmc");
        assert_eq!(
            matched.or_clause,
            "(\"JPMorgan Chase\" OR \"JPMC\" OR \"JPM\" OR \"JP Morgan\" OR \"Chase\")"
        );
    }

    #[test]
    fn canonical_key_wins_over_its_own_aliases() {
        let table = fixture();
        let matched = table.first_match("AdventHealth calls").expect("canonical should match");

        // "adventhealth" precedes the shorter "ah" key in table order, so the
        // full canonical span is matched, not the embedded alias.
        assert_eq!(&"AdventHealth calls"[matched.start..matched.end], "AdventHealth");
    }

    #[test]
    fn no_match_returns_none() {
        let table = fixture();
        assert!(table.first_match("Acme Corp renewal").is_none());
    }

    #[test]
    fn display_names_deduplicate_case_insensitively() {
        let table = AliasTable::from_pairs(&[("Tesla", &["TESLA", "Tesla Inc"])]);
        let matched = table.first_match("tesla contacts").expect("alias should match");
        assert_eq!(matched.or_clause, "(\"Tesla\" OR \"Tesla Inc\")");
    }

    #[test]
    fn shared_table_contains_known_accounts() {
        let table = AliasTable::shared();
        assert!(!table.is_empty());
        assert!(table.first_match("BSWH qbr notes").is_some());
        assert!(table.first_match("Walmart renewal").is_some());
    }
}
