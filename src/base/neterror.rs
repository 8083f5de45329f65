use thiserror::Error;

/// Errors surfaced by the cookie store and the request adapter.
///
/// Codes follow Chromium's `net_error_list.h` where an equivalent exists.
/// Crate-specific conditions live in the `-10000` range so they never collide
/// with a Chromium code.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Address unreachable")]
    AddressUnreachable,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Connection to {host}:{port} failed: {reason}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("Name not resolved for {domain}: {reason}")]
    NameNotResolvedFor { domain: String, reason: String },

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,

    // Crate-specific errors
    #[error("Malformed Set-Cookie header: {reason}")]
    MalformedCookieHeader { reason: String },
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,
    #[error("Cookie domain does not match request host")]
    CookieDomainMismatch,
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Failed to read HTTP body")]
    HttpBodyError,
    #[error("Response body is not valid JSON (status {status})")]
    JsonParseError { status: u16 },
    #[error("Failed to encode request body: {reason}")]
    RequestBodyEncoding { reason: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed | NetError::ConnectionFailedTo { .. } => -104,
            NetError::NameNotResolved | NetError::NameNotResolvedFor { .. } => -105,
            NetError::SslProtocolError => -107,
            NetError::AddressUnreachable => -109,
            NetError::ConnectionTimedOut => -118,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,

            NetError::MalformedCookieHeader { .. } => -10001,
            NetError::CookiePublicSuffix => -10002,
            NetError::CookieDomainMismatch => -10003,
            NetError::InvalidHeader => -10004,
            NetError::HttpBodyError => -10005,
            NetError::JsonParseError { .. } => -10006,
            NetError::RequestBodyEncoding { .. } => -10007,

            NetError::Unknown(code) => *code,
        }
    }

    /// True for errors raised before or while talking to the peer, i.e. the
    /// ones for which no response exists.
    pub fn is_connection_error(&self) -> bool {
        (-199..=-100).contains(&self.as_i32())
    }

    pub fn connection_failed_to(
        host: impl Into<String>,
        port: u16,
        reason: impl std::fmt::Display,
    ) -> Self {
        NetError::ConnectionFailedTo {
            host: host.into(),
            port,
            reason: reason.to_string(),
        }
    }

    pub fn dns_failed(domain: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_cookie(reason: impl Into<String>) -> Self {
        NetError::MalformedCookieHeader {
            reason: reason.into(),
        }
    }
}

impl From<i32> for NetError {
    /// Structured variants map back to their context-free counterpart.
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -109 => NetError::AddressUnreachable,
            -118 => NetError::ConnectionTimedOut,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,

            -10002 => NetError::CookiePublicSuffix,
            -10003 => NetError::CookieDomainMismatch,
            -10004 => NetError::InvalidHeader,
            -10005 => NetError::HttpBodyError,
            _ => NetError::Unknown(code),
        }
    }
}
