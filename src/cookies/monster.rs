use crate::cookies::canonicalcookie::CanonicalCookie;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use url::{Host, Url};

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies.
/// Chromium uses 3300, but we use a slightly lower limit to keep memory usage predictable.
const MAX_COOKIES_TOTAL: usize = 3000;

/// In-memory cookie store.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// Cookies are bucketed by their normalized domain. Every bucket sits behind
/// one of `DashMap`'s shard locks, so a reader sees a cookie either with all
/// of its attributes or not at all.
pub struct CookieMonster {
    // Store: Map<Domain, List<Cookie>>
    store: DashMap<String, Vec<CanonicalCookie>>,
    next_seq: AtomicU64,
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    pub fn new() -> Self {
        Self {
            store: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Insert or replace the cookie stored under `(domain, path, name)`.
    ///
    /// A replacement keeps the creation order of the cookie it replaces. A
    /// cookie that is already expired deletes the stored entry instead.
    pub fn set_canonical_cookie(&self, mut cookie: CanonicalCookie) {
        let now = OffsetDateTime::now_utc();

        if cookie.is_expired(now) {
            self.delete_equivalent(&cookie);
            return;
        }

        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        if let Some(existing) = entry.iter_mut().find(|c| c.is_equivalent(&cookie)) {
            cookie.creation_time = existing.creation_time;
            cookie.creation_seq = existing.creation_seq;
            *existing = cookie;
            return;
        }

        cookie.creation_seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;

        // Enforce per-domain limit, evicting the oldest cookie first
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            match Self::oldest_index(&entry) {
                Some(idx) => {
                    let evicted = entry.remove(idx);
                    tracing::debug!(domain = %evicted.domain, name = %evicted.name, "evicted cookie (domain limit)");
                }
                None => break,
            }
        }

        entry.push(cookie);
        drop(entry); // Release lock before checking global count

        self.enforce_global_limit();
    }

    fn delete_equivalent(&self, cookie: &CanonicalCookie) {
        let mut emptied = false;
        if let Some(mut entry) = self.store.get_mut(&cookie.domain) {
            let before = entry.len();
            entry.retain(|c| !c.is_equivalent(cookie));
            if entry.len() != before {
                tracing::debug!(domain = %cookie.domain, path = %cookie.path, name = %cookie.name, "deleted cookie via expired write");
            }
            emptied = entry.is_empty();
        }
        if emptied {
            self.store.remove_if(&cookie.domain, |_, v| v.is_empty());
        }
    }

    fn oldest_index(cookies: &[CanonicalCookie]) -> Option<usize> {
        cookies
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.creation_seq)
            .map(|(i, _)| i)
    }

    /// Enforce the global cookie limit by evicting oldest cookies.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            // Find the oldest cookie across all domains
            let mut oldest: Option<(String, u64)> = None;

            for entry in self.store.iter() {
                for cookie in entry.value().iter() {
                    let older = oldest
                        .as_ref()
                        .map_or(true, |(_, seq)| cookie.creation_seq < *seq);
                    if older {
                        oldest = Some((entry.key().clone(), cookie.creation_seq));
                    }
                }
            }

            let Some((domain, seq)) = oldest else {
                break;
            };
            let mut emptied = false;
            if let Some(mut entry) = self.store.get_mut(&domain) {
                entry.retain(|c| c.creation_seq != seq);
                emptied = entry.is_empty();
            }
            if emptied {
                self.store.remove_if(&domain, |_, v| v.is_empty());
            }
            tracing::debug!(domain = %domain, "evicted cookie (global limit)");
        }
    }

    /// Get cookies matching the URL with proper domain suffix matching.
    ///
    /// Results are ordered longest path first, then by creation order. A URL
    /// without a host yields nothing.
    pub fn get_cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        let host = host.to_ascii_lowercase();
        let is_ip = !matches!(url.host(), Some(Host::Domain(_)));
        let secure_scheme = matches!(url.scheme(), "https" | "wss");
        let now = OffsetDateTime::now_utc();

        let domains_to_check = if is_ip {
            vec![host.clone()]
        } else {
            Self::get_matching_domains(&host)
        };

        let mut result = Vec::new();
        for domain in domains_to_check {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    if !Self::domain_matches(&cookie.domain, &host, cookie.host_only) {
                        continue;
                    }
                    if !Self::path_matches(&cookie.path, url.path()) {
                        continue;
                    }
                    if cookie.secure && !secure_scheme {
                        continue;
                    }
                    if cookie.is_expired(now) {
                        continue;
                    }
                    result.push(cookie.clone());
                }
            }
        }

        // Sort by path length (longest first) then creation order
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_seq.cmp(&b.creation_seq))
        });

        result
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only || request_host.eq_ignore_ascii_case(cookie_domain) {
            return request_host.eq_ignore_ascii_case(cookie_domain);
        }

        // Domain cookie: request_host must end with ".cookie_domain"
        let (host, domain) = (request_host.as_bytes(), cookie_domain.as_bytes());
        host.len() > domain.len()
            && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain)
            && host[host.len() - domain.len() - 1] == b'.'
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            if cookie_path.ends_with('/') {
                return true;
            }
            // Next character in request_path must start a new segment
            return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }

    /// Get all domains to check for a given host.
    /// Returns the host itself and all parent domains.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_string()];

        // For "foo.bar.example.com", add "bar.example.com", "example.com"
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join("."));
        }

        domains
    }

    /// Drop every expired cookie. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let mut removed = 0;
        for mut entry in self.store.iter_mut() {
            let before = entry.len();
            entry.retain(|c| !c.is_expired(now));
            removed += before - entry.len();
        }
        self.store.retain(|_, v| !v.is_empty());
        removed
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Clear all cookies.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Snapshot of every stored cookie, in no particular order.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }
}
