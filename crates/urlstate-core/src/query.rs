//! `application/x-www-form-urlencoded` form of a store's contents.

use url::form_urlencoded;

use crate::error::QueryError;

pub type Params = Vec<(String, String)>;

/// Serializes pairs in order, without a leading `?`.
pub fn encode(params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

/// Parses a query string, with or without its leading `?`.
///
/// A repeated key keeps its first value, as `URLSearchParams.get` does.
pub fn decode(query: &str) -> Result<Params, QueryError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut out: Params = Vec::new();
    for (index, (k, v)) in form_urlencoded::parse(query.as_bytes()).enumerate() {
        if k.is_empty() {
            return Err(QueryError::EmptyKey { index });
        }
        if out.iter().any(|(existing, _)| *existing == k) {
            log::trace!("query: ignoring repeated key `{k}`");
            continue;
        }
        out.push((k.into_owned(), v.into_owned()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reserved_characters_survive() {
        let params = p(&[
            ("state", "light|0|2024-06-01"),
            ("json", "{\"theme\":\"dark\"}"),
            ("q", "a b&c=d"),
        ]);
        let q = encode(&params);
        assert!(!q.contains('|'));
        assert!(!q.contains('"'));
        assert_eq!(decode(&q).unwrap(), params);
    }

    #[test]
    fn leading_question_mark_and_repeats() {
        assert_eq!(
            decode("?a=1&b=2&a=3").unwrap(),
            p(&[("a", "1"), ("b", "2")])
        );
        assert_eq!(decode("").unwrap(), Params::new());
        assert_eq!(decode("?").unwrap(), Params::new());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert_eq!(decode("a=1&=2"), Err(QueryError::EmptyKey { index: 1 }));
    }
}
