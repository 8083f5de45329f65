use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// Header names that are always exposed with this exact casing.
const CANONICAL_NAMES: [&str; 2] = ["Authorization", "Content-Type"];

/// A header list that preserves insertion order and the casing of names.
///
/// Lookups are case-insensitive. Names and values are validated only when
/// the list is converted into an [`http::HeaderMap`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedHeaders {
    headers: Vec<(String, String)>,
}

impl OrderedHeaders {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Set `name` to `value`, replacing every existing entry with that name.
    ///
    /// The first existing entry keeps its position but takes the new casing.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.position(&name) {
            Some(idx) => {
                self.headers[idx] = (name.clone(), value);
                let mut seen = 0;
                self.headers.retain(|(n, _)| {
                    if n.eq_ignore_ascii_case(&name) {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.headers.push((name, value)),
        }
    }

    /// Add an entry without touching existing ones (e.g. repeated `Set-Cookie`).
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.headers[idx].1.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// True if an entry is stored under exactly this casing.
    pub fn contains_exact(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Copy every header of `defaults` whose name is not already present.
    pub fn merge_defaults(&mut self, defaults: &OrderedHeaders) {
        for (name, value) in defaults.iter() {
            if !self.contains(name) {
                self.append(name, value);
            }
        }
    }

    /// Re-key `authorization` and `content-type` (any casing) under
    /// `Authorization` and `Content-Type`.
    ///
    /// Several entries for the same name collapse into one; a non-canonical
    /// entry's value wins over an already canonical one. Applying this twice
    /// changes nothing.
    pub fn canonicalize_casing(&mut self) {
        for canonical in CANONICAL_NAMES {
            let matches: Vec<usize> = self
                .headers
                .iter()
                .enumerate()
                .filter(|(_, (n, _))| n.eq_ignore_ascii_case(canonical))
                .map(|(i, _)| i)
                .collect();

            let Some(&first) = matches.first() else {
                continue;
            };
            let chosen = matches
                .iter()
                .rev()
                .find(|&&i| self.headers[i].0 != canonical)
                .or(matches.last())
                .copied()
                .unwrap_or(first);

            let value = self.headers[chosen].1.clone();
            self.headers[first] = (canonical.to_string(), value);
            for &idx in matches[1..].iter().rev() {
                self.headers.remove(idx);
            }
        }
    }

    /// Snapshot of an [`http::HeaderMap`]. Values that are not valid UTF-8
    /// are converted lossily.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let headers = map
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        Self { headers }
    }

    /// Convert to a standard [`http::HeaderMap`].
    /// Note: http::HeaderMap preserves insertion order but lowercases names.
    pub fn to_header_map(&self) -> Result<HeaderMap, NetError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_str(name).map_err(|_| NetError::InvalidHeader)?;
            let value = HeaderValue::from_str(value).map_err(|_| NetError::InvalidHeader)?;
            map.append(name, value);
        }
        Ok(map)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OrderedHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = OrderedHeaders::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}
