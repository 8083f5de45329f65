//! Cookie-aware API client.
//!
//! [`Client`] runs one call in three explicit steps:
//!
//! 1. [`prepare`](Client::prepare): narrow big-integer query parameters,
//!    serialize the query and body, attach the `Cookie` header;
//! 2. [`execute`](Client::execute): hand the request to the [`Transport`],
//!    ingest `Set-Cookie` headers, follow redirects;
//! 3. [`finalize`](Client::finalize): canonicalize header casing and decode
//!    the body into a [`ResponseEnvelope`]. A body that is not JSON still
//!    yields an envelope, with the raw text kept.
//!
//! [`send`](Client::send) runs all three.
//!
//! # Example
//!
//! ```rust,ignore
//! use sessionnet::{Client, CookieJar, RequestDescriptor};
//!
//! let jar = CookieJar::new();
//! let client = Client::builder().cookie_jar(jar.clone()).build();
//!
//! let resp = client
//!     .send::<serde_json::Value>(
//!         RequestDescriptor::get("http://127.0.0.1:8080/v1/accounts/0x1")
//!             .param("ledger_version", 12_345u64),
//!     )
//!     .await?;
//! if !resp.is_success() {
//!     eprintln!("server said {}", resp.status());
//! }
//! ```

use crate::base::neterror::NetError;
use crate::cookies::jar::CookieJar;
use crate::http::orderedheaders::OrderedHeaders;
use crate::http::params::{apply_query, coerce_params};
use crate::http::request::{PreparedRequest, RequestDescriptor};
use crate::http::response::{Exchange, RawResponse, ResponseEnvelope};
use crate::http::transport::{HyperTransport, Transport, TransportConfig, TransportError};
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Default redirect limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Request/response adapter.
///
/// Cloning is cheap; clones share the transport and the cookie jar.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    cookie_jar: CookieJar,
    default_headers: OrderedHeaders,
    max_redirects: usize,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a new client with default settings and a fresh cookie jar.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Prepare, execute and finalize one call.
    ///
    /// Only failures without any server response come back as `Err`; HTTP
    /// error statuses and undecodable bodies are returned as envelopes.
    pub async fn send<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, NetError> {
        let prepared = self.prepare(&descriptor)?;
        let exchange = self.execute(prepared).await?;
        Ok(self.finalize(exchange))
    }

    /// Turn a descriptor into a transport-ready request.
    pub fn prepare(&self, descriptor: &RequestDescriptor) -> Result<PreparedRequest, NetError> {
        let mut url = Url::parse(&descriptor.url).map_err(|_| NetError::InvalidUrl)?;
        apply_query(&mut url, &coerce_params(&descriptor.params));

        let mut headers = descriptor.headers.clone();
        headers.merge_defaults(&self.default_headers);

        let body = match &descriptor.body {
            Some(body) => {
                if body.is_json() && !headers.contains("Content-Type") {
                    headers.insert("Content-Type", "application/json");
                }
                body.encode()?
            }
            None => Bytes::new(),
        };

        let mut prepared = PreparedRequest {
            method: descriptor.method.clone(),
            url,
            headers,
            body,
        };
        self.attach_cookies(&mut prepared);
        Ok(prepared)
    }

    /// Send `request`, following redirects.
    ///
    /// A transport failure that still carries a response is treated like a
    /// normal response. Running out of redirects returns the last 3xx.
    ///
    /// A `Cookie` header the jar did not produce is the caller's. It follows
    /// same-origin redirects where the jar has nothing to send and is dropped
    /// at the first cross-origin hop.
    pub async fn execute(&self, request: PreparedRequest) -> Result<Exchange, NetError> {
        let mut request = request;
        let mut hops = 0;
        let mut caller_cookie = request
            .cookie_header()
            .filter(|c| self.cookie_jar.cookie_header(&request.url).as_deref() != Some(*c))
            .map(str::to_owned);

        loop {
            tracing::debug!(method = %request.method, url = %request.url, "sending request");

            let response = match self.transport.execute(request.clone()).await {
                Ok(resp) => resp,
                Err(TransportError::Response(resp)) => {
                    tracing::debug!(status = %resp.status, "transport failure carried a response");
                    *resp
                }
                Err(TransportError::Net(e)) => {
                    tracing::debug!(error = %e, url = %request.url, "request failed without response");
                    return Err(e);
                }
            };

            self.ingest_cookies(&response);

            let Some(next) = self.redirect_request(&request, &response, &mut caller_cookie) else {
                return Ok(Exchange { request, response });
            };
            if hops >= self.max_redirects {
                tracing::warn!(limit = self.max_redirects, url = %request.url, "redirect limit reached");
                return Ok(Exchange { request, response });
            }
            tracing::debug!(from = %request.url, to = %next.url, status = %response.status, "following redirect");
            hops += 1;
            request = next;
        }
    }

    /// Build the caller-facing envelope.
    pub fn finalize<T: DeserializeOwned>(&self, exchange: Exchange) -> ResponseEnvelope<T> {
        let Exchange {
            mut request,
            response,
        } = exchange;

        let decoded = response.json::<T>();
        if let Err(e) = &decoded {
            tracing::debug!(error = %e, url = %response.url, "body is not JSON, keeping raw text");
        }

        let mut headers = OrderedHeaders::from_header_map(&response.headers);
        headers.canonicalize_casing();
        request.headers.canonicalize_casing();

        ResponseEnvelope::new(decoded, headers, request, response)
    }

    /// Set the `Cookie` header from the jar; a caller-supplied one is kept
    /// when no stored cookie matches.
    fn attach_cookies(&self, request: &mut PreparedRequest) {
        if let Some(cookie) = self.cookie_jar.cookie_header(&request.url) {
            tracing::debug!(url = %request.url, "attaching cookies");
            request.headers.insert("Cookie", cookie);
        }
    }

    fn ingest_cookies(&self, response: &RawResponse) {
        for line in response.set_cookie_headers() {
            if let Err(e) = self.cookie_jar.set_cookie(&response.url, line) {
                tracing::warn!(error = %e, url = %response.url, "ignoring Set-Cookie header");
            }
        }
    }

    /// The request to send next if `response` is a followable redirect.
    fn redirect_request(
        &self,
        request: &PreparedRequest,
        response: &RawResponse,
        caller_cookie: &mut Option<String>,
    ) -> Option<PreparedRequest> {
        let status = response.status;
        if !matches!(status.as_u16(), 301..=303 | 307 | 308) {
            return None;
        }

        let location = response.headers.get(http::header::LOCATION)?.to_str().ok()?;
        let url = response.url.join(location).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            tracing::warn!(location = %url, "refusing redirect to non-HTTP scheme");
            return None;
        }

        let mut next = request.clone();
        next.headers.remove("Cookie");

        let rewrite_to_get = status == StatusCode::SEE_OTHER
            || ((status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND)
                && request.method != Method::GET
                && request.method != Method::HEAD);
        if rewrite_to_get {
            if request.method != Method::HEAD {
                next.method = Method::GET;
            }
            next.body = Bytes::new();
            next.headers.remove("Content-Type");
            next.headers.remove("Content-Length");
        }

        let same_origin = url.host_str() == request.url.host_str()
            && url.port_or_known_default() == request.url.port_or_known_default();
        if !same_origin {
            next.headers.remove("Authorization");
            *caller_cookie = None;
        }
        if let Some(cookie) = caller_cookie.as_deref() {
            next.headers.insert("Cookie", cookie);
        }

        next.url = url;
        self.attach_cookies(&mut next);
        Some(next)
    }
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    cookie_jar: Option<CookieJar>,
    transport: Option<Arc<dyn Transport>>,
    transport_config: Option<TransportConfig>,
    default_headers: OrderedHeaders,
    max_redirects: Option<usize>,
}

impl ClientBuilder {
    /// Share an existing cookie jar.
    pub fn cookie_jar(mut self, jar: CookieJar) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Use a custom transport.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use a transport shared with other clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Configure the default [`HyperTransport`]. Ignored when a custom
    /// transport is set.
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = Some(config);
        self
    }

    /// Header sent with every request unless the request sets it itself.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Set the redirect limit; `0` disables following.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::new(
                self.transport_config.unwrap_or_default(),
            )),
        };

        Client {
            transport,
            cookie_jar: self.cookie_jar.unwrap_or_default(),
            default_headers: self.default_headers,
            max_redirects: self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::params::QueryParam;
    use crate::http::requestbody::RequestBody;
    use crate::http::transport::Executing;
    use std::sync::Mutex;

    /// Replays canned responses and records what it was asked to send.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<Vec<Result<RawResponse, TransportError>>>,
        seen: Mutex<Vec<PreparedRequest>>,
    }

    impl ScriptedTransport {
        fn new(mut replies: Vec<Result<RawResponse, TransportError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<PreparedRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: PreparedRequest) -> Executing<'_> {
            Box::pin(async move {
                let url = request.url.clone();
                self.seen.lock().unwrap().push(request);
                let mut reply = self
                    .replies
                    .lock()
                    .unwrap()
                    .pop()
                    .expect("no scripted reply left");
                match &mut reply {
                    Ok(resp) => resp.url = url,
                    Err(TransportError::Response(resp)) => resp.url = url,
                    Err(TransportError::Net(_)) => {}
                }
                reply
            })
        }
    }

    fn reply(status: u16, headers: &[(&str, &str)], body: &'static str) -> RawResponse {
        let mut resp = RawResponse::new(
            Url::parse("http://placeholder/").unwrap(),
            StatusCode::from_u16(status).unwrap(),
        );
        for (k, v) in headers {
            resp.headers.append(
                http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                v.parse().unwrap(),
            );
        }
        resp.body = Bytes::from_static(body.as_bytes());
        resp
    }

    fn client_with(transport: Arc<ScriptedTransport>) -> Client {
        Client::builder().shared_transport(transport).build()
    }

    #[test]
    fn test_prepare_serializes_query_and_body() {
        let client = client_with(ScriptedTransport::new(vec![]));
        let desc = RequestDescriptor::post("https://example.com/v1/view")
            .param("ledger_version", QueryParam::BigInt(42))
            .json(&serde_json::json!({"function": "0x1::coin::balance"}))
            .unwrap();

        let prepared = client.prepare(&desc).unwrap();
        assert_eq!(prepared.url.query(), Some("ledger_version=42"));
        assert_eq!(prepared.headers.get("content-type"), Some("application/json"));
        assert_eq!(prepared.body.as_ref(), br#"{"function":"0x1::coin::balance"}"#);
        assert!(prepared.cookie_header().is_none());
    }

    #[test]
    fn test_prepare_keeps_raw_bytes_and_content_type() {
        let client = client_with(ScriptedTransport::new(vec![]));
        let desc = RequestDescriptor::post("https://example.com/v1/transactions")
            .header("Content-Type", "application/x.aptos.signed_transaction+bcs")
            .body(RequestBody::from(vec![0xde, 0xad]));

        let prepared = client.prepare(&desc).unwrap();
        assert_eq!(prepared.body.as_ref(), &[0xde, 0xad]);
        assert_eq!(
            prepared.headers.get("content-type"),
            Some("application/x.aptos.signed_transaction+bcs")
        );
    }

    #[test]
    fn test_prepare_rejects_bad_url() {
        let client = client_with(ScriptedTransport::new(vec![]));
        let err = client.prepare(&RequestDescriptor::get("not a url")).unwrap_err();
        assert_eq!(err, NetError::InvalidUrl);
    }

    #[test]
    fn test_prepare_merges_default_headers() {
        let client = Client::builder()
            .shared_transport(ScriptedTransport::new(vec![]))
            .default_header("x-aptos-client", "sessionnet")
            .default_header("Accept", "application/json")
            .build();
        let desc = RequestDescriptor::get("https://example.com/").header("accept", "*/*");

        let prepared = client.prepare(&desc).unwrap();
        assert_eq!(prepared.headers.get("Accept"), Some("*/*"));
        assert_eq!(prepared.headers.get("X-Aptos-Client"), Some("sessionnet"));
    }

    #[tokio::test]
    async fn test_cookies_flow_between_calls() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(200, &[("set-cookie", "session=abc; Path=/")], "{}")),
            Ok(reply(200, &[], "{}")),
        ]);
        let client = client_with(transport.clone());

        let first = client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/v1"))
            .await
            .unwrap();
        assert!(first.request().cookie_header().is_none());

        client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/v1/blocks"))
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen[1].cookie_header(), Some("session=abc"));
    }

    #[tokio::test]
    async fn test_response_carrying_failure_becomes_envelope() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Response(Box::new(
            reply(404, &[], r#"{"error_code":"account_not_found"}"#),
        )))]);
        let client = client_with(transport);

        let resp = client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/v1/accounts/0x9"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
        assert_eq!(resp.status_text(), "Not Found");
        assert!(!resp.is_success());
        assert_eq!(resp.data().unwrap()["error_code"], "account_not_found");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Net(
            NetError::ConnectionRefused,
        ))]);
        let client = client_with(transport);

        let err = client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/"))
            .await
            .unwrap_err();
        assert_eq!(err, NetError::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_set_cookie_on_error_response_is_ingested() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Response(Box::new(
            reply(500, &[("set-cookie", "lb=node-2")], "null"),
        )))]);
        let client = client_with(transport);

        let resp = client
            .send::<Option<u8>>(RequestDescriptor::get("http://node.example.com/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        assert_eq!(client.cookie_jar().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_cookie_does_not_block_others() {
        let transport = ScriptedTransport::new(vec![Ok(reply(
            200,
            &[
                ("set-cookie", "=nameless"),
                ("set-cookie", "good=1"),
                ("set-cookie", "bad=1; Max-Age=later"),
            ],
            "{}",
        ))]);
        let client = client_with(transport);

        client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/"))
            .await
            .unwrap();

        let names: Vec<_> = client
            .cookie_jar()
            .get_cookies_for("http://node.example.com/")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["good"]);
    }

    #[tokio::test]
    async fn test_finalize_canonicalizes_headers() {
        let transport = ScriptedTransport::new(vec![Ok(reply(
            200,
            &[("authorization", "Bearer x"), ("content-type", "application/json")],
            "[]",
        ))]);
        let client = client_with(transport);

        let resp = client
            .send::<Vec<u8>>(
                RequestDescriptor::get("http://node.example.com/").header("authorization", "Bearer x"),
            )
            .await
            .unwrap();

        assert!(resp.headers().contains_exact("Authorization"));
        assert!(!resp.headers().contains_exact("authorization"));
        assert!(resp.headers().contains_exact("Content-Type"));
        assert!(resp.request().headers.contains_exact("Authorization"));
        assert_eq!(resp.data(), Some(&Vec::new()));
    }

    #[tokio::test]
    async fn test_redirect_rewrites_post_and_keeps_cookies() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(
                302,
                &[("location", "/v1/next"), ("set-cookie", "hop=1")],
                "",
            )),
            Ok(reply(200, &[], r#"{"ok":true}"#)),
        ]);
        let client = client_with(transport.clone());

        let resp = client
            .send::<serde_json::Value>(
                RequestDescriptor::post("http://node.example.com/v1/start")
                    .json(&serde_json::json!({"a": 1}))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let seen = transport.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].method, Method::GET);
        assert!(seen[1].body.is_empty());
        assert_eq!(seen[1].url.path(), "/v1/next");
        assert_eq!(seen[1].cookie_header(), Some("hop=1"));
        assert_eq!(resp.request().url.path(), "/v1/next");
    }

    #[tokio::test]
    async fn test_cross_host_redirect_drops_authorization() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(307, &[("location", "http://other.example.org/x")], "")),
            Ok(reply(200, &[], "{}")),
        ]);
        let client = client_with(transport.clone());

        client
            .send::<serde_json::Value>(
                RequestDescriptor::post("http://node.example.com/")
                    .header("Authorization", "Bearer secret")
                    .body(vec![1u8]),
            )
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen[1].method, Method::POST);
        assert_eq!(seen[1].body.as_ref(), &[1u8]);
        assert!(seen[1].headers.get("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_caller_cookie_survives_same_origin_redirect() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(302, &[("location", "/v1/next")], "")),
            Ok(reply(302, &[("location", "http://other.example.org/")], "")),
            Ok(reply(200, &[], "{}")),
        ]);
        let client = client_with(transport.clone());

        client
            .send::<serde_json::Value>(
                RequestDescriptor::get("http://node.example.com/v1/start")
                    .header("Cookie", "pinned=1"),
            )
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen[0].cookie_header(), Some("pinned=1"));
        assert_eq!(seen[1].cookie_header(), Some("pinned=1"));
        assert!(seen[2].cookie_header().is_none());
    }

    #[tokio::test]
    async fn test_jar_cookie_not_carried_to_unmatched_path() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(302, &[("location", "/public")], "")),
            Ok(reply(200, &[], "{}")),
        ]);
        let client = client_with(transport.clone());
        client
            .cookie_jar()
            .set_cookie(&Url::parse("http://node.example.com/").unwrap(), "scoped=1; Path=/private")
            .unwrap();

        client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/private/x"))
            .await
            .unwrap();

        let seen = transport.seen();
        assert_eq!(seen[0].cookie_header(), Some("scoped=1"));
        assert!(seen[1].cookie_header().is_none());
    }

    #[tokio::test]
    async fn test_redirect_limit_returns_last_redirect() {
        let transport = ScriptedTransport::new(vec![
            Ok(reply(302, &[("location", "/a")], "")),
            Ok(reply(302, &[("location", "/b")], "")),
        ]);
        let client = Client::builder()
            .shared_transport(transport.clone())
            .max_redirects(1)
            .build();

        let resp = client
            .send::<Option<u8>>(RequestDescriptor::get("http://node.example.com/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.data(), Some(&None));
        assert_eq!(transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_envelope() {
        let transport = ScriptedTransport::new(vec![Ok(reply(
            502,
            &[("content-type", "text/html")],
            "<html>bad gateway</html>",
        ))]);
        let client = client_with(transport);

        let resp = client
            .send::<serde_json::Value>(RequestDescriptor::get("http://node.example.com/"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
        assert_eq!(resp.status_text(), "Bad Gateway");
        assert!(resp.data().is_none());
        assert_eq!(resp.decode_error(), Some(&NetError::JsonParseError { status: 502 }));
        assert_eq!(resp.text(), "<html>bad gateway</html>");
        assert_eq!(resp.headers().get("Content-Type"), Some("text/html"));
    }
}
