//! Scope filter - the reference exchange filter.

use tracing::debug;

use crate::traits::filter::ExchangeFilter;
use crate::types::config::CollectorConfig;
use crate::types::exchange::HttpExchange;

/// Excludes out-of-scope origins, blocked hosts and static files.
///
/// Host patterns are either exact (`example.com`) or subdomain wildcards
/// (`*.example.com`, which does not match `example.com` itself).
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    scope: Vec<String>,
    blocked_hosts: Vec<String>,
    excluded_suffixes: Vec<String>,
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::from_config(&CollectorConfig::default())
    }
}

impl ScopeFilter {
    /// Build from the collector configuration.
    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            scope: config.scope.clone(),
            blocked_hosts: config
                .blocked_hosts
                .iter()
                .map(|h| h.trim().to_lowercase())
                .collect(),
            excluded_suffixes: config
                .excluded_suffixes
                .iter()
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Whether `host` matches a blocked pattern.
    pub fn is_blocked_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.blocked_hosts.iter().any(|pattern| match pattern.strip_prefix("*.") {
            Some(domain) => host
                .strip_suffix(domain)
                .is_some_and(|rest| rest.ends_with('.')),
            None => *pattern == host,
        })
    }

    /// Whether the last path segment ends in an excluded suffix.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        let last = path.rsplit('/').next().unwrap_or(path);
        match last.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_lowercase();
                self.excluded_suffixes.iter().any(|s| *s == ext)
            }
            None => false,
        }
    }
}

impl ExchangeFilter for ScopeFilter {
    fn is_excluded(&self, exchange: &HttpExchange, origin: &str) -> bool {
        if !self.scope.iter().any(|s| s.eq_ignore_ascii_case(origin)) {
            return true;
        }

        let Some(request) = &exchange.request else {
            return false;
        };
        let Ok(url) = url::Url::parse(&request.url) else {
            // Let the pipeline decide what an unparseable URL is worth
            return false;
        };

        if url.host_str().is_some_and(|h| self.is_blocked_host(h)) {
            debug!(url = %request.url, "blocked host");
            return true;
        }
        self.is_excluded_path(url.path())
    }

    fn decode_parameter(&self, raw: &str) -> String {
        form_decode(raw)
    }
}

/// Decode a form/query component: `+` is a space, then percent-decoding.
///
/// Input that does not decode to UTF-8 is returned unchanged.
pub fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::exchange::{HttpRequest, HttpResponse};

    fn exchange(url: &str) -> HttpExchange {
        HttpExchange::pair(HttpRequest::get(url), HttpResponse::ok("{}"))
    }

    #[test]
    fn test_origin_scope() {
        let filter = ScopeFilter::default();
        let ex = exchange("https://example.com/api");

        assert!(!filter.is_excluded(&ex, "Proxy"));
        assert!(!filter.is_excluded(&ex, "proxy"));
        assert!(filter.is_excluded(&ex, "Intruder"));
    }

    #[test]
    fn test_blocked_hosts() {
        let config = CollectorConfig::new()
            .block_host("*.google.com")
            .block_host("Tracker.io");
        let filter = ScopeFilter::from_config(&config);

        assert!(filter.is_blocked_host("www.google.com"));
        assert!(filter.is_blocked_host("a.b.GOOGLE.com"));
        assert!(!filter.is_blocked_host("google.com"));
        assert!(!filter.is_blocked_host("notgoogle.com"));
        assert!(filter.is_blocked_host("tracker.io"));
        assert!(filter.is_excluded(&exchange("https://www.google.com/search?q=1"), "Proxy"));
    }

    #[test]
    fn test_static_suffixes() {
        let filter = ScopeFilter::default();

        assert!(filter.is_excluded(&exchange("https://example.com/logo.PNG"), "Proxy"));
        assert!(filter.is_excluded(&exchange("https://example.com/a/b/font.woff2?v=3"), "Proxy"));
        assert!(!filter.is_excluded(&exchange("https://example.com/app.js"), "Proxy"));
        assert!(!filter.is_excluded(&exchange("https://example.com/png/list"), "Proxy"));
    }

    #[test]
    fn test_response_only_is_in_scope() {
        let filter = ScopeFilter::default();
        let ex = HttpExchange::response_only(HttpResponse::ok("{}"));
        assert!(!filter.is_excluded(&ex, "Proxy"));
    }

    #[test]
    fn test_decode_parameter() {
        let filter = ScopeFilter::default();

        assert_eq!(filter.decode_parameter("user%5Fid"), "user_id");
        assert_eq!(filter.decode_parameter("a+b%20c"), "a b c");
        assert_eq!(filter.decode_parameter("%7B%22k%22%3A1%7D"), r#"{"k":1}"#);
        assert_eq!(filter.decode_parameter("plain"), "plain");
        // Invalid UTF-8 keeps the raw text
        assert_eq!(filter.decode_parameter("%FF%FE"), "%FF%FE");
    }
}
