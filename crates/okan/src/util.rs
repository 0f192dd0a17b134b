//! Small text and number helpers shared by pages and the server.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Derives a URL slug from a title.
///
/// Lowercases, strips diacritics (NFD decomposition with combining marks dropped), collapses
/// every run of non-alphanumeric characters into one hyphen and trims hyphens from both ends.
/// The output only contains `[a-z0-9-]`, so applying it twice yields the same slug.
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    NON_ALNUM_RUN
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Completion percentage rounded to the nearest integer; `0` when there is nothing to complete.
pub fn percent(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// First word of a display name, or `fallback` when the name is blank.
pub fn first_name<'a>(full_name: Option<&'a str>, fallback: &'a str) -> &'a str {
    full_name
        .and_then(|name| name.split_whitespace().next())
        .unwrap_or(fallback)
}

/// Up to two uppercase initials from a display name; `"U"` when the name is blank.
pub fn initials(full_name: Option<&str>) -> String {
    let initials: String = full_name
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        "U".to_string()
    } else {
        initials
    }
}

/// Returns `None` for blank form input so optional columns are stored as null.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
