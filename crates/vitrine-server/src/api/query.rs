//! Query-string extractor that never rejects.
//!
//! Filters on read endpoints are optional and parsed leniently, so a
//! repeated key or an alias sent next to its canonical name must not turn
//! into a 400. The last occurrence of a key wins.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, Uri},
};

#[derive(Debug, Default)]
pub(super) struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub(super) fn from_uri(uri: &Uri) -> Self {
        Query::<Vec<(String, String)>>::try_from_uri(uri)
            .map(|Query(pairs)| Self(pairs))
            .unwrap_or_default()
    }

    /// Last value sent for `name`.
    pub(super) fn get(&self, name: &str) -> Option<&str> {
        self.get_any(&[name])
    }

    /// Last value sent under any of `names`.
    pub(super) fn get_any(&self, names: &[&str]) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| names.contains(&key.as_str()))
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed, non-blank owned value.
    pub(super) fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(uri: &str) -> QueryParams {
        QueryParams::from_uri(&uri.parse::<Uri>().expect("valid uri"))
    }

    #[test]
    fn repeated_key_keeps_last_value() {
        let q = params("/api/v1/products?min_price=80&min_price=90");
        assert_eq!(q.get("min_price"), Some("90"));
    }

    #[test]
    fn alias_and_canonical_name_resolve_to_last_sent() {
        let q = params("/api/v1/products?category=a&category__slug=b");
        assert_eq!(q.get_any(&["category", "category__slug"]), Some("b"));
    }

    #[test]
    fn missing_query_string_is_empty() {
        let q = params("/api/v1/products");
        assert_eq!(q.get("search"), None);
    }

    #[test]
    fn text_drops_blank_values_and_decodes() {
        let q = params("/api/v1/kits?search=%20&code=PROMO%2015");
        assert_eq!(q.text("search"), None);
        assert_eq!(q.text("code").as_deref(), Some("PROMO 15"));
    }
}
