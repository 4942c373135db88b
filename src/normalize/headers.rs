use std::collections::HashMap;
use tracing::debug;

use super::key::normalize_key;
use crate::schema::SAMPLE_KEY;
use crate::tabular::{RawCell, RawRow};

/// What to do when two raw headers of one row normalize to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later column in row order replaces the earlier one
    LastWins,
    /// A populated cell under this verbatim header always wins. Otherwise the
    /// first populated variant is kept and empty variants never replace it.
    PreferHeader(&'static str),
}

/// Registry of header overrides layered on top of [`normalize_key`].
pub struct HeaderNormalizer {
    aliases: HashMap<String, String>,
    policies: HashMap<String, CollisionPolicy>,
}

/// A row with canonical keys. Column order follows first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub index: usize,
    pub cells: Vec<(String, RawCell)>,
    /// Canonical names that more than one raw header mapped to
    pub collisions: Vec<String>,
}

impl CanonicalRow {
    pub fn get(&self, key: &str) -> Option<&RawCell> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }
}

impl Default for HeaderNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderNormalizer {
    /// Create a normalizer with the built-in overrides for headers the
    /// generic rules cannot map
    pub fn new() -> Self {
        let mut normalizer = Self {
            aliases: HashMap::new(),
            policies: HashMap::new(),
        };

        normalizer.register_alias("pUC19vector", "puc19vector");
        normalizer.register_alias("pUC19", "puc19");
        normalizer.register_alias("¦Ë-DNA(ConversionRate)", "lambda_dna_conversion_rate");
        normalizer.register_alias("λ-DNA(ConversionRate)", "lambda_dna_conversion_rate");
        for depth in ["5X", "15X", "20X"] {
            normalizer.register_alias(
                &format!("PCT_PCages_sites_{depth}"),
                &format!("pct_pcages_sites_{}", depth.to_ascii_lowercase()),
            );
        }

        // Picard sheets carry both "Sample" and a "SAMPLE" read-group label
        normalizer.register_policy(SAMPLE_KEY, CollisionPolicy::PreferHeader("Sample"));

        normalizer
    }

    /// Map a verbatim raw header to a canonical name, bypassing the generic rules
    pub fn register_alias(&mut self, raw: &str, canonical: &str) {
        self.aliases.insert(raw.trim().to_string(), canonical.to_string());
    }

    pub fn register_policy(&mut self, canonical: &str, policy: CollisionPolicy) {
        self.policies.insert(canonical.to_string(), policy);
    }

    pub fn policy_for(&self, canonical: &str) -> CollisionPolicy {
        self.policies
            .get(canonical)
            .copied()
            .unwrap_or(CollisionPolicy::LastWins)
    }

    /// Canonical name for one header
    pub fn canonical(&self, raw: &str) -> String {
        match self.aliases.get(raw.trim()) {
            Some(alias) => alias.clone(),
            None => normalize_key(raw),
        }
    }

    /// Normalize every header of a row. Cells whose header normalizes to an
    /// empty name are dropped.
    pub fn normalize_row(&self, row: &RawRow) -> CanonicalRow {
        let mut cells: Vec<(String, RawCell)> = Vec::with_capacity(row.cells.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        // verbatim header currently holding each canonical cell
        let mut sources: Vec<&str> = Vec::with_capacity(row.cells.len());
        let mut collisions = Vec::new();

        for (raw, cell) in &row.cells {
            let key = self.canonical(raw);
            if key.is_empty() {
                debug!("Dropping column with unusable header {:?}", raw);
                continue;
            }

            match positions.get(&key) {
                None => {
                    positions.insert(key.clone(), cells.len());
                    sources.push(raw.trim());
                    cells.push((key, cell.clone()));
                }
                Some(&idx) => {
                    if !collisions.contains(&key) {
                        collisions.push(key.clone());
                    }
                    let replace = match self.policy_for(&key) {
                        CollisionPolicy::LastWins => true,
                        CollisionPolicy::PreferHeader(preferred) => {
                            let held_preferred = sources[idx] == preferred && !is_blank(&cells[idx].1);
                            !is_blank(cell) && (raw.trim() == preferred || is_blank(&cells[idx].1)) && !held_preferred
                        }
                    };
                    debug!(
                        "Header collision on '{}' (raw {:?}), replaced: {}",
                        key, raw, replace
                    );
                    if replace {
                        cells[idx].1 = cell.clone();
                        sources[idx] = raw.trim();
                    }
                }
            }
        }

        CanonicalRow {
            index: row.index,
            cells,
            collisions,
        }
    }
}

fn is_blank(cell: &RawCell) -> bool {
    match cell {
        RawCell::Empty => true,
        RawCell::Text(s) => s.trim().is_empty(),
        RawCell::Float(v) => v.is_nan(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, RawCell)]) -> RawRow {
        RawRow::new(
            1,
            cells
                .iter()
                .map(|(h, c)| (h.to_string(), c.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_aliases_override_generic_rules() {
        let n = HeaderNormalizer::new();
        assert_eq!(n.canonical("pUC19vector"), "puc19vector");
        assert_eq!(n.canonical("¦Ë-DNA(ConversionRate)"), "lambda_dna_conversion_rate");
        assert_eq!(n.canonical("PCT_PCages_sites_15X"), "pct_pcages_sites_15x");
        assert_eq!(n.canonical("PCT_horvath_sites_5X"), "pct_horvath_sites_5x");
    }

    #[test]
    fn test_populated_sample_survives_empty_duplicate() {
        let n = HeaderNormalizer::new();
        let r = row(&[
            ("Sample", RawCell::text("MO001")),
            ("SAMPLE", RawCell::Empty),
            ("PCT_SELECTED_BASES", RawCell::Float(0.8)),
        ]);
        let out = n.normalize_row(&r);
        assert_eq!(out.get("sample"), Some(&RawCell::text("MO001")));
        assert_eq!(out.collisions, vec!["sample".to_string()]);
        assert_eq!(out.cells.len(), 2);
    }

    #[test]
    fn test_populated_later_sample_replaces_empty_earlier() {
        let n = HeaderNormalizer::new();
        let r = row(&[("SAMPLE", RawCell::text("  ")), ("Sample", RawCell::text("MO002"))]);
        assert_eq!(n.normalize_row(&r).get("sample"), Some(&RawCell::text("MO002")));
    }

    #[test]
    fn test_mixed_case_sample_beats_populated_upper_case_variant() {
        let n = HeaderNormalizer::new();
        let after = row(&[
            ("Sample", RawCell::text("MO001")),
            ("SAMPLE", RawCell::text("CAP12WGS_MO001_L1")),
        ]);
        assert_eq!(n.normalize_row(&after).get("sample"), Some(&RawCell::text("MO001")));

        let before = row(&[
            ("SAMPLE", RawCell::text("CAP12WGS_MO001_L1")),
            ("Sample", RawCell::text("MO001")),
        ]);
        assert_eq!(n.normalize_row(&before).get("sample"), Some(&RawCell::text("MO001")));
    }

    #[test]
    fn test_upper_case_sample_used_when_mixed_case_is_blank() {
        let n = HeaderNormalizer::new();
        let r = row(&[("Sample", RawCell::Empty), ("SAMPLE", RawCell::text("MO003"))]);
        assert_eq!(n.normalize_row(&r).get("sample"), Some(&RawCell::text("MO003")));
    }

    #[test]
    fn test_default_collision_is_last_value_wins() {
        let n = HeaderNormalizer::new();
        let r = row(&[
            ("Sample", RawCell::text("MO001")),
            ("WBC", RawCell::text("3.2")),
            ("wbc", RawCell::Empty),
        ]);
        let out = n.normalize_row(&r);
        assert_eq!(out.get("wbc"), Some(&RawCell::Empty));
        // position of the first occurrence is kept
        assert_eq!(out.cells[1].0, "wbc");
    }

    #[test]
    fn test_unusable_headers_are_dropped() {
        let n = HeaderNormalizer::new();
        let r = row(&[("Sample", RawCell::text("MO001")), ("???", RawCell::text("x"))]);
        assert_eq!(n.normalize_row(&r).cells.len(), 1);
    }
}
