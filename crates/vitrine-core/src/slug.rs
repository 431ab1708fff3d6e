//! URL slug derivation.
//!
//! A slug is derived once, when an entity is created without one, and is
//! never recomputed afterwards. Collisions are resolved by appending `-1`,
//! `-2`, … to the base slug until a free candidate is found.

use serde::{Deserialize, Serialize};

/// Entity families that own an independent slug namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugScope {
    Category,
    Product,
    Kit,
}

impl SlugScope {
    /// Base slug used when a name normalizes to nothing (e.g. `"!!!"`).
    #[must_use]
    pub fn fallback(self) -> &'static str {
        match self {
            SlugScope::Category => "category",
            SlugScope::Product => "product",
            SlugScope::Kit => "kit",
        }
    }
}

impl std::fmt::Display for SlugScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SlugScope::Category => "category",
            SlugScope::Product => "product",
            SlugScope::Kit => "kit",
        })
    }
}

/// Normalize a display name into a lowercase, hyphenated ASCII token.
///
/// Latin accented letters fold to their base letter, apostrophes vanish,
/// unknown non-ASCII letters are stripped and every other run of
/// non-alphanumerics collapses into a single `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if let Some(ascii) = fold_to_ascii(c) {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ascii);
        } else if c == '\'' || c == '\u{2019}' || c.is_alphanumeric() {
            // dropped without introducing a separator
        } else {
            pending_dash = true;
        }
    }

    out
}

fn fold_to_ascii(c: char) -> Option<char> {
    if c.is_ascii_alphanumeric() {
        return Some(c);
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Slugify `name`, substituting the scope's fallback word for an empty result.
#[must_use]
pub fn base_slug(name: &str, scope: SlugScope) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        scope.fallback().to_string()
    } else {
        slug
    }
}

/// Infinite sequence `base`, `base-1`, `base-2`, …
#[derive(Debug, Clone)]
pub struct SlugCandidates {
    base: String,
    next: u64,
}

impl Iterator for SlugCandidates {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let candidate = nth_candidate(&self.base, self.next);
        self.next += 1;
        Some(candidate)
    }
}

/// The `n`-th collision candidate: `base` for 0, `base-n` otherwise.
#[must_use]
pub fn nth_candidate(base: &str, n: u64) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

/// Collision-retry candidates for a base slug.
#[must_use]
pub fn candidates(base: impl Into<String>) -> SlugCandidates {
    SlugCandidates {
        base: base.into(),
        next: 0,
    }
}

/// Pick the first candidate for `name` that `is_taken` reports as free.
///
/// There is no retry bound.
pub fn unique_slug<F>(name: &str, scope: SlugScope, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = base_slug(name, scope);
    let mut n = 0;
    loop {
        let candidate = nth_candidate(&base, n);
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn slugify_simple_name() {
        assert_eq!(slugify("Cartão de Visita"), "cartao-de-visita");
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("  Frente & Verso -- 4x4 "), "frente-verso-4x4");
    }

    #[test]
    fn slugify_drops_apostrophes_without_separator() {
        assert_eq!(slugify("Uncle Arnie's"), "uncle-arnies");
    }

    #[test]
    fn slugify_folds_portuguese_accents() {
        assert_eq!(slugify("Adesivo Promoção Ímã"), "adesivo-promocao-ima");
    }

    #[test]
    fn slugify_strips_unknown_letters() {
        assert_eq!(slugify("Señorita Ωmega"), "senorita-mega");
    }

    #[test]
    fn base_slug_uses_scope_fallback_for_empty_result() {
        assert_eq!(base_slug("!!!", SlugScope::Product), "product");
        assert_eq!(base_slug("", SlugScope::Kit), "kit");
    }

    #[test]
    fn candidates_start_with_base_then_count_up() {
        let first: Vec<String> = candidates("banner").take(3).collect();
        assert_eq!(first, vec!["banner", "banner-1", "banner-2"]);
    }

    #[test]
    fn unique_slug_returns_base_when_free() {
        let slug = unique_slug("Flyer A5", SlugScope::Product, |_| false);
        assert_eq!(slug, "flyer-a5");
    }

    #[test]
    fn colliding_names_get_distinct_numeric_suffixes() {
        let mut taken: HashSet<String> = HashSet::new();

        let first = unique_slug("Adesivo Redondo", SlugScope::Product, |c| taken.contains(c));
        taken.insert(first.clone());
        let second = unique_slug("Adesivo Redondo", SlugScope::Product, |c| taken.contains(c));
        taken.insert(second.clone());
        let third = unique_slug("Adesivo  redondo!", SlugScope::Product, |c| taken.contains(c));

        assert_eq!(first, "adesivo-redondo");
        assert_eq!(second, "adesivo-redondo-1");
        assert_eq!(third, "adesivo-redondo-2");
        assert_ne!(first, second);
        assert_eq!(second.strip_prefix(first.as_str()), Some("-1"));
    }

    #[test]
    fn unique_slug_skips_gaps_in_order() {
        let taken: HashSet<&str> = ["kit", "kit-1", "kit-3"].into_iter().collect();
        let slug = unique_slug("Kit", SlugScope::Kit, |c| taken.contains(c));
        assert_eq!(slug, "kit-2");
    }

    #[test]
    fn unique_slug_keeps_probing_past_a_taken_fallback() {
        let taken: HashSet<String> = std::iter::once("product".to_string())
            .chain((1..10).map(|n| format!("product-{n}")))
            .collect();
        let slug = unique_slug("!!!", SlugScope::Product, |c| taken.contains(c));
        assert_eq!(slug, "product-10");
    }
}
