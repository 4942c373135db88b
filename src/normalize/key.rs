//! Raw column header → canonical snake-case field name.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Digits followed by a single capital used as a multiplier suffix ("10X")
static MULTIPLIER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)([A-Z])([^A-Za-z]|$)").expect("valid multiplier regex"));

static SCREAMING_SNAKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_]+$").expect("valid screaming-snake regex"));

/// A capitalized word preceded by any character ("adjOvary" → "adj_Ovary")
static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("valid capitalized-word regex"));

/// A lowercase letter or digit directly followed by a capital ("read1Mean")
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid lower-upper regex"));

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid separator regex"));

/// Normalize a header to its canonical field name.
///
/// Steps, in order:
/// 1. `<digits><Capital>` multiplier suffixes are lowercased in place (`5X` → `5x`);
/// 2. an all-uppercase header (`PCT_SELECTED_BASES`) is lowercased directly;
/// 3. otherwise camel/Pascal word boundaries get a `_` and the result is lowercased;
/// 4. every run of non-alphanumeric characters collapses to a single `_`;
/// 5. leading and trailing `_` are stripped.
///
/// Returns an empty string when nothing alphanumeric survives.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();

    let suffixed = MULTIPLIER_SUFFIX.replace_all(trimmed, |caps: &Captures| {
        format!("{}{}{}", &caps[1], caps[2].to_ascii_lowercase(), &caps[3])
    });

    let lowered = if SCREAMING_SNAKE.is_match(&suffixed) {
        suffixed.to_ascii_lowercase()
    } else {
        let split = CAPITALIZED_WORD.replace_all(&suffixed, "${1}_${2}");
        let split = LOWER_UPPER.replace_all(&split, "${1}_${2}");
        split.to_lowercase()
    };

    let collapsed = NON_ALNUM.replace_all(&lowered, "_");
    collapsed.trim_matches('_').to_string()
}
