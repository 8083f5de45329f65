//! Public Suffix List (PSL) validation for cookie domain security.
//!
//! Prevents supercookie attacks by rejecting cookies set on public
//! suffixes like `.com`, `.co.uk`, etc.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::normalize_domain;
use psl::{List, Psl};

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_ascii_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Resolve the `Domain=` attribute of a `Set-Cookie` received from `host`.
///
/// Returns the normalized storage domain and whether the cookie is
/// host-only. Per RFC 6265 §5.3 a public suffix is only accepted when it is
/// the request host itself, in which case the cookie degrades to host-only.
/// IP-address hosts accept nothing but their own address.
pub fn resolve_cookie_domain(
    domain_attr: &str,
    host: &str,
    host_is_ip: bool,
) -> Result<(String, bool), NetError> {
    let domain = normalize_domain(domain_attr);
    let host = host.to_ascii_lowercase();

    if domain.is_empty() {
        return Ok((host, true));
    }

    if host_is_ip {
        return if domain == host {
            Ok((host, true))
        } else {
            Err(NetError::CookieDomainMismatch)
        };
    }

    if is_public_suffix(&domain) {
        return if domain == host {
            Ok((host, true))
        } else {
            Err(NetError::CookiePublicSuffix)
        };
    }

    if host == domain || host.ends_with(&format!(".{domain}")) {
        Ok((domain, false))
    } else {
        Err(NetError::CookieDomainMismatch)
    }
}
