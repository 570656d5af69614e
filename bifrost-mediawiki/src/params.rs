//! Ordered parameter bags for `api.php` requests.
//!
//! The encoded query string doubles as the cache key for the SWR layer, so
//! encoding must be deterministic: pairs keep their insertion order and the
//! `action`/`format` defaults are always prepended unless the caller set
//! them explicitly.

/// Default parameters merged into every request; caller values win.
const DEFAULTS: [(&str, &str); 2] = [("action", "ask"), ("format", "json")];

/// An ordered set of query-string key/value pairs for one API call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiParams {
    pairs: Vec<(String, String)>,
}

impl ApiParams {
    /// An empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag for an `action=ask` request with the given selector.
    pub fn ask(query: impl Into<String>) -> Self {
        Self::new().with("query", query)
    }

    /// A bag for an `action=browsebysubject` request.
    pub fn browse_by_subject(subject: impl Into<String>) -> Self {
        Self::new()
            .with("action", "browsebysubject")
            .with("subject", subject)
    }

    /// A bag for an `action=parse` request over one page.
    pub fn parse_page(page: impl Into<String>, prop: impl Into<String>) -> Self {
        Self::new()
            .with("action", "parse")
            .with("page", page)
            .with("prop", prop)
    }

    /// Appends a pair, replacing an earlier value for the same key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Encodes the bag, defaults included, as a percent-encoded query string.
    pub fn query_string(&self) -> String {
        let mut encoded = Vec::with_capacity(self.pairs.len() + DEFAULTS.len());
        for (key, value) in DEFAULTS {
            if self.get(key).is_none() {
                encoded.push(encode_pair(key, value));
            }
        }
        for (key, value) in &self.pairs {
            encoded.push(encode_pair(key, value));
        }
        encoded.join("&")
    }

    /// The full request URL against `base`.
    pub fn url(&self, base: &str) -> String {
        format!("{}?{}", base, self.query_string())
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!(
        "{}={}",
        urlencoding::encode(key),
        urlencoding::encode(value)
    )
}
