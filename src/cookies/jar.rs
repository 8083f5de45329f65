//! Cookie jar façade.
//!
//! [`CookieJar`] is what the request adapter talks to: it turns `Set-Cookie`
//! response headers into [`CanonicalCookie`]s for the [`CookieMonster`] and
//! turns the monster's matches back into a `Cookie` request header.

use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::{CanonicalCookie, SameSite};
use crate::cookies::monster::CookieMonster;
use crate::cookies::psl;
use std::sync::Arc;
use time::OffsetDateTime;
use url::{Host, Url};

/// Shared handle to a cookie store.
///
/// Cloning is cheap and every clone sees the same cookies, so one jar can be
/// handed to several clients.
#[derive(Clone, Default)]
pub struct CookieJar {
    store: Arc<CookieMonster>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store.
    pub fn with_store(store: Arc<CookieMonster>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &CookieMonster {
        &self.store
    }

    /// Cookies applicable to `url`, longest path first.
    pub fn get_cookies(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.store.get_cookies_for_url(url)
    }

    /// Like [`get_cookies`](Self::get_cookies) for a URL that has not been
    /// parsed yet. Unparseable input matches nothing.
    pub fn get_cookies_for(&self, url: &str) -> Vec<CanonicalCookie> {
        match Url::parse(url) {
            Ok(url) => self.get_cookies(&url),
            Err(_) => Vec::new(),
        }
    }

    /// Value for a `Cookie` request header, or `None` when nothing matches.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(CanonicalCookie::cookie_pair)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Parse one `Set-Cookie` header value received from `url` and store it.
    ///
    /// On error nothing is stored; other cookies are unaffected.
    pub fn set_cookie(&self, url: &Url, set_cookie: &str) -> Result<(), NetError> {
        let cookie = parse_set_cookie(url, set_cookie, OffsetDateTime::now_utc())?;
        self.store.set_canonical_cookie(cookie);
        Ok(())
    }

    /// Total number of stored cookies.
    pub fn len(&self) -> usize {
        self.store.total_cookie_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}

/// Parse a `Set-Cookie` header value into a [`CanonicalCookie`].
///
/// `now` anchors `Max-Age` and becomes the creation time.
pub fn parse_set_cookie(
    url: &Url,
    cookie_line: &str,
    now: OffsetDateTime,
) -> Result<CanonicalCookie, NetError> {
    use cookie::Cookie;

    let parsed =
        Cookie::parse(cookie_line).map_err(|e| NetError::malformed_cookie(e.to_string()))?;

    if parsed.name().is_empty() {
        return Err(NetError::malformed_cookie("empty cookie name"));
    }

    // The cookie crate quietly drops attributes it cannot parse; a cookie
    // whose lifetime we cannot read is rejected instead.
    let present = attribute_names(cookie_line);
    if present.iter().any(|a| a == "max-age") && parsed.max_age().is_none() {
        return Err(NetError::malformed_cookie("invalid Max-Age attribute"));
    }
    let expires = parsed.expires().and_then(|e| e.datetime());
    if present.iter().any(|a| a == "expires") && expires.is_none() {
        return Err(NetError::malformed_cookie("invalid Expires attribute"));
    }

    let host = url.host_str().ok_or(NetError::InvalidUrl)?;
    let host_is_ip = !matches!(url.host(), Some(Host::Domain(_)));

    // Domain logic
    let (domain, host_only) = match parsed.domain() {
        Some(d) => psl::resolve_cookie_domain(d, host, host_is_ip)?,
        None => (host.to_ascii_lowercase(), true),
    };

    // Path logic
    let path = match parsed.path() {
        Some(p) if p.starts_with('/') => p.to_string(),
        _ => "/".to_string(),
    };

    // Expiry logic: Max-Age wins over Expires
    let expiration_time = match parsed.max_age() {
        Some(age) if age.is_positive() => Some(now.saturating_add(age)),
        Some(_) => Some(OffsetDateTime::UNIX_EPOCH),
        None => expires,
    };

    let same_site = match parsed.same_site() {
        Some(cookie::SameSite::Lax) => SameSite::Lax,
        Some(cookie::SameSite::Strict) => SameSite::Strict,
        Some(cookie::SameSite::None) => SameSite::NoRestriction,
        None => SameSite::Unspecified,
    };

    let mut c = CanonicalCookie::new(
        parsed.name(),
        parsed.value(),
        domain,
        path,
        now,
        expiration_time,
    );
    c.secure = parsed.secure().unwrap_or(false);
    c.http_only = parsed.http_only().unwrap_or(false);
    c.host_only = host_only;
    c.same_site = same_site;

    c.validate_prefix(matches!(url.scheme(), "https" | "wss"))?;

    Ok(c)
}

/// Lowercased names of the attributes following the name/value pair.
fn attribute_names(cookie_line: &str) -> Vec<String> {
    cookie_line
        .split(';')
        .skip(1)
        .map(|attr| {
            attr.split('=')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .collect()
}
