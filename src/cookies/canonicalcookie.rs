use time::OffsetDateTime;

use crate::base::neterror::NetError;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// `domain` is always stored lowercased and without a leading dot; whether it
/// also applies to subdomains is carried by `host_only`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub creation_time: OffsetDateTime,
    pub expiration_time: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    /// Store-assigned insertion order. Zero until the cookie is stored.
    pub(crate) creation_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

impl CanonicalCookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: normalize_domain(&domain.into()),
            path: path.into(),
            creation_time,
            expiration_time,
            secure: false,
            http_only: false,
            host_only: true,
            same_site: SameSite::Unspecified,
            creation_seq: 0,
        }
    }

    /// A cookie is live until its expiry instant; at or after it, it is gone.
    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.expiration_time {
            Some(expiry) => expiry <= current_time,
            None => false,
        }
    }

    /// Session cookies have no expiry and live as long as the store.
    pub fn is_persistent(&self) -> bool {
        self.expiration_time.is_some()
    }

    /// Two cookies occupy the same store slot when domain, path and name agree.
    pub fn is_equivalent(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    /// `name=value`, the form used inside a `Cookie` request header.
    pub fn cookie_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), NetError> {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(NetError::malformed_cookie("__Secure- prefix requires Secure"));
        }

        if self.name.starts_with("__Host-")
            && (!self.secure || self.path != "/" || !self.host_only || !secure_origin)
        {
            return Err(NetError::malformed_cookie(
                "__Host- prefix requires Secure, Path=/ and no Domain",
            ));
        }

        Ok(())
    }
}

/// Lowercase and strip leading dots, producing the store's domain key.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}
