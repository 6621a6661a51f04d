//! Short opaque tokens standing in for attribute names.
//!
//! Tokens are assigned from a stable sort of the attribute names, so the
//! same attribute set always produces the same mapping regardless of the
//! order the backend listed the attributes in.

use std::collections::HashMap;

use indexmap::IndexMap;

/// Bijection between attribute names and short tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeIdentifiers {
    tokens: IndexMap<String, String>,
    names: HashMap<String, String>,
}

impl AttributeIdentifiers {
    /// Generate tokens for a set of attribute names.
    pub fn generate<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut sorted: Vec<&str> = names.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut tokens = IndexMap::with_capacity(sorted.len());
        let mut lookup = HashMap::with_capacity(sorted.len());
        for (index, name) in sorted.into_iter().enumerate() {
            let token = token_for_index(index);
            lookup.insert(token.clone(), name.to_string());
            tokens.insert(name.to_string(), token);
        }

        Self {
            tokens,
            names: lookup,
        }
    }

    /// Token for an attribute name.
    pub fn encode(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// Attribute name for a token.
    pub fn decode(&self, token: &str) -> Option<&str> {
        self.names.get(token).map(String::as_str)
    }

    /// Replace every key and value that names a known attribute with its
    /// token. Anything without a token passes through unchanged.
    pub fn encode_map(&self, map: &IndexMap<String, String>) -> IndexMap<String, String> {
        map.iter()
            .map(|(k, v)| {
                (
                    self.encode(k).unwrap_or(k).to_string(),
                    self.encode(v).unwrap_or(v).to_string(),
                )
            })
            .collect()
    }

    /// Check whether a name has a token.
    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(name)
    }

    /// (name, token) pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    /// Number of mapped attributes.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if no attributes are mapped.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// `t` followed by the index in bijective base 26 (a, b, ..., z, aa, ab, ...).
fn token_for_index(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    let mut token = String::with_capacity(letters.len() + 1);
    token.push('t');
    token.extend(letters.into_iter().map(char::from));
    token
}
