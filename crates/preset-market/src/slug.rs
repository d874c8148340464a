//! URL slugs derived from preset names

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a base slug, in characters
pub const MAX_SLUG_LEN: usize = 200;

/// Slug used when a name has no word characters at all
pub const FALLBACK_SLUG: &str = "preset";

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Turn a display name into a slug.
///
/// Lowercases, drops everything except word characters, whitespace and
/// hyphens, collapses runs of whitespace/hyphens into one hyphen and keeps
/// the first [`MAX_SLUG_LEN`] characters.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = SEPARATORS.replace_all(&stripped, "-");
    let slug: String = collapsed.chars().take(MAX_SLUG_LEN).collect();

    if slug.is_empty() || slug == "-" {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Candidate slugs in the order they should be tried: `base`, `base-1`,
/// `base-2`, ...
///
/// A base that would push a suffixed candidate past [`MAX_SLUG_LEN`] is cut
/// short to make room for the suffix.
pub fn slug_candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string()).chain((1u64..).map(move |n| {
        let suffix = format!("-{}", n);
        let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
        let head: String = base.chars().take(room).collect();
        format!("{}{}", head, suffix)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_append_increasing_suffix() {
        let first: Vec<String> = slug_candidates("my-preset").take(3).collect();
        assert_eq!(first, vec!["my-preset", "my-preset-1", "my-preset-2"]);
    }

    #[test]
    fn suffixed_candidates_stay_within_limit() {
        let base = slugify(&"é".repeat(300));
        assert_eq!(base.chars().count(), MAX_SLUG_LEN);

        let candidates: Vec<String> = slug_candidates(&base).take(12).collect();
        for candidate in &candidates {
            assert!(candidate.chars().count() <= MAX_SLUG_LEN, "{}", candidate);
        }
        assert!(candidates[1].ends_with("-1"));
        assert!(candidates[11].ends_with("-11"));
        assert_eq!(candidates[11].chars().count(), MAX_SLUG_LEN);
    }

    #[test]
    fn punctuation_only_name_falls_back() {
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
        assert_eq!(slugify(" - "), FALLBACK_SLUG);
    }
}
