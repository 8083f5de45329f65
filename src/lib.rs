//! # sessionnet
//!
//! A cookie-aware request/response adapter for JSON HTTP APIs.
//!
//! `sessionnet` sits between an API client and an HTTP transport. It keeps a
//! session cookie jar across calls, narrows big-integer query parameters to
//! what JSON numbers can carry, and hands back every server answer (errors
//! included) as a normalized [`ResponseEnvelope`].
//!
//! ## Features
//!
//! - **Cookie Management**: RFC 6265 matching with PSL validation, shared jars
//! - **Three-Step Calls**: prepare, execute and finalize can run separately
//! - **Pluggable Transport**: `hyper` over HTTP or BoringSSL HTTPS by default, any [`Transport`] otherwise
//! - **Header Casing**: `Authorization` and `Content-Type` always canonically cased
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sessionnet::{Client, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sessionnet::NetError> {
//!     let client = Client::new();
//!     let resp = client
//!         .send::<serde_json::Value>(RequestDescriptor::get("http://127.0.0.1:8080/v1"))
//!         .await?;
//!     println!("Status: {} {}", resp.status(), resp.status_text());
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions
//! - [`cookies`] - Cookie parsing, storage and matching
//! - [`http`] - Requests, responses, headers and the transport seam
//! - [`client`] - The adapter tying them together

pub mod base;
pub mod client;
pub mod cookies;
pub mod http;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder};
pub use cookies::{CanonicalCookie, CookieJar, CookieMonster};
pub use http::{
    Exchange, OrderedHeaders, PreparedRequest, QueryParam, RawResponse, RequestBody,
    RequestDescriptor, ResponseEnvelope, Transport, TransportConfig, TransportError,
};
