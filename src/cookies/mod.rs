//! Cookie management.
//!
//! This module provides the in-memory cookie system used by the request
//! adapter:
//!
//! - **Storage**: process-lifetime cookie store ([`CookieMonster`](monster::CookieMonster))
//! - **Façade**: `Set-Cookie` ingestion and `Cookie` header building ([`CookieJar`](jar::CookieJar))
//! - **Validation**: Public Suffix List checks for `Domain=` attributes ([`psl`])
//!
//! # Architecture
//!
//! This implementation mirrors Chromium's cookie storage architecture:
//!
//! | Chromium (C++) | sessionnet (Rust) | Responsibility |
//! |----------------|-------------------|----------------|
//! | `net::CookieMonster` | [`CookieMonster`](monster::CookieMonster) | Cookie store with eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie representation |
//! | `net::CookieStore` | [`CookieJar`](jar::CookieJar) | Request-facing interface |
//!
//! # Example
//!
//! ```rust
//! use sessionnet::cookies::jar::CookieJar;
//! use url::Url;
//!
//! let jar = CookieJar::new();
//! let origin = Url::parse("https://example.com/x").unwrap();
//! jar.set_cookie(&origin, "a=1; Path=/; Domain=example.com").unwrap();
//!
//! let target = Url::parse("https://api.example.com/x/y").unwrap();
//! assert_eq!(jar.cookie_header(&target).as_deref(), Some("a=1"));
//! ```
//!
//! Cookies are never written to disk; a store lives as long as its last
//! [`CookieJar`](jar::CookieJar) handle.

pub mod canonicalcookie;
pub mod jar;
pub mod monster;
pub mod psl;

pub use canonicalcookie::CanonicalCookie;
pub use jar::CookieJar;
pub use monster::CookieMonster;
