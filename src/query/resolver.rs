//! Search term → concrete sample identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::metrics::QueryMetrics;
use crate::schema::QcTable;
use crate::store::QcStore;

/// Trailing marker that switches a search into prefix mode
pub const WILDCARD: char = '*';

/// Sequencing-batch prefix in front of the sample id ("CAP12WGS_", "CAP3-")
static BATCH_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CAP\d+(?:WGS)?[_-]").expect("valid batch prefix regex"));

/// Cohort tokens a prefix search must start with
pub const COHORT_TOKENS: [&str; 2] = ["MO", "MS"];

/// Table whose sample column prefix searches run against
pub const ANCHOR_TABLE: QcTable = QcTable::ReportedAges;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    Exact(String),
    Prefix(String),
}

impl SearchTerm {
    pub fn parse(term: &str) -> SearchTerm {
        let term = term.trim();
        match term.strip_suffix(WILDCARD) {
            Some(prefix) => SearchTerm::Prefix(prefix.trim_end_matches(WILDCARD).to_string()),
            None => SearchTerm::Exact(term.to_string()),
        }
    }
}

/// Strip a batch prefix and apply the cohort gate. `None` means the prefix
/// is rejected.
pub fn clean_prefix(prefix: &str) -> Option<String> {
    let cleaned = BATCH_PREFIX.replace(prefix.trim(), "").into_owned();
    let upper = cleaned.to_ascii_uppercase();
    if COHORT_TOKENS.iter().any(|t| upper.starts_with(t)) {
        Some(cleaned)
    } else {
        None
    }
}

pub struct SampleResolver<'a> {
    store: &'a dyn QcStore,
    anchor: QcTable,
}

impl<'a> SampleResolver<'a> {
    pub fn new(store: &'a dyn QcStore) -> Self {
        Self {
            store,
            anchor: ANCHOR_TABLE,
        }
    }

    /// Exact terms come back as-is without an existence check; prefix terms
    /// are matched case-insensitively as a substring of anchor samples.
    pub fn resolve(&self, term: &str) -> Result<Vec<String>> {
        let samples = match SearchTerm::parse(term) {
            SearchTerm::Exact(id) if id.is_empty() => return Ok(Vec::new()),
            SearchTerm::Exact(id) => {
                QueryMetrics::record_search("exact", 1);
                return Ok(vec![id]);
            }
            SearchTerm::Prefix(prefix) => match clean_prefix(&prefix) {
                Some(cleaned) => {
                    let found = self.store.search_samples(self.anchor, &cleaned)?;
                    debug!("Prefix '{}' matched {} samples", cleaned, found.len());
                    found
                }
                None => {
                    debug!("Prefix '{}' rejected by cohort gate", prefix);
                    Vec::new()
                }
            },
        };
        QueryMetrics::record_search("prefix", samples.len());
        Ok(samples)
    }
}
