//! The transport seam.
//!
//! The client never opens sockets itself: it hands a [`PreparedRequest`] to a
//! [`Transport`] and gets a [`RawResponse`] back. Pooling, TLS, timeouts and
//! cancellation are the transport's business.
//!
//! [`HyperTransport`] is the bundled implementation: plain HTTP over
//! `hyper-util`'s pooled client, and HTTPS over BoringSSL with ALPN choosing
//! between HTTP/2 and HTTP/1.1.

use crate::base::context::classify_io_error;
use crate::base::neterror::NetError;
use crate::http::request::PreparedRequest;
use crate::http::response::RawResponse;
use boring::ssl::{SslConnector, SslMethod};
use boring::x509::X509;
use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::{http1, http2};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as PooledClient;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use url::Url;

/// Why a transport call did not produce a plain response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport treats the exchange as failed, but the server answered.
    #[error("request failed with status {}", .0.status)]
    Response(Box<RawResponse>),
    /// No response exists (connect failure, timeout, reset, ...).
    #[error(transparent)]
    Net(#[from] NetError),
}

/// Future returned by [`Transport::execute`].
pub type Executing<'a> = BoxFuture<'a, Result<RawResponse, TransportError>>;

/// Executes one HTTP exchange.
pub trait Transport: Send + Sync {
    fn execute(&self, request: PreparedRequest) -> Executing<'_>;
}

/// Settings for [`HyperTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for one exchange, body included.
    pub timeout: Option<Duration>,
    pub pool_idle_timeout: Option<Duration>,
    /// Speak HTTP/2 without upgrade negotiation; over TLS, offer only `h2`.
    pub http2_prior_knowledge: bool,
    /// Sent when the request carries no `User-Agent` of its own.
    pub user_agent: Option<String>,
    /// PEM certificates trusted in addition to the system roots.
    pub root_certificates: Vec<Vec<u8>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            pool_idle_timeout: Some(Duration::from_secs(90)),
            http2_prior_knowledge: false,
            user_agent: Some(concat!("sessionnet/", env!("CARGO_PKG_VERSION")).to_string()),
            root_certificates: Vec::new(),
        }
    }
}

/// HTTP and HTTPS transport.
///
/// Plain HTTP goes through `hyper-util`'s connection pool. HTTPS opens a
/// BoringSSL connection per request.
#[derive(Clone)]
pub struct HyperTransport {
    client: PooledClient<HttpConnector, Full<Bytes>>,
    config: TransportConfig,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl HyperTransport {
    pub fn new(config: TransportConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);

        let mut builder = PooledClient::builder(TokioExecutor::new());
        builder
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .http2_only(config.http2_prior_knowledge);

        Self {
            client: builder.build(connector),
            config,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, TransportError> {
        if !matches!(request.url.scheme(), "http" | "https") {
            return Err(NetError::DisallowedUrlScheme.into());
        }

        let mut req = request.to_http_request()?;
        if let Some(agent) = &self.config.user_agent {
            if !req.headers().contains_key(http::header::USER_AGENT) {
                let value = agent.parse().map_err(|_| NetError::InvalidHeader)?;
                req.headers_mut().insert(http::header::USER_AGENT, value);
            }
        }

        let url = request.url;
        let resp: http::Response<Incoming> = if url.scheme() == "https" {
            self.send_tls(&url, req).await?
        } else {
            self.client
                .request(req)
                .await
                .map_err(|e| map_client_error(&e, &url))?
        };

        Ok(RawResponse::from_http(url, resp).await?)
    }

    fn tls_connector(&self) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;

        // ALPN wire format: length-prefixed protocol names
        let protos: &[u8] = if self.config.http2_prior_knowledge {
            b"\x02h2"
        } else {
            b"\x02h2\x08http/1.1"
        };
        builder
            .set_alpn_protos(protos)
            .map_err(|_| NetError::SslProtocolError)?;

        for pem in &self.config.root_certificates {
            let cert = X509::from_pem(pem).map_err(|_| NetError::SslProtocolError)?;
            builder
                .cert_store_mut()
                .add_cert(cert)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        Ok(builder.build())
    }

    // TODO: pool TLS connections per origin the way plain HTTP is pooled.
    async fn send_tls(
        &self,
        url: &Url,
        mut req: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Incoming>, NetError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().unwrap_or(443);
        // IPv6 literals come bracketed
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((bare_host, port))
            .await
            .map_err(|e| NetError::dns_failed(host, e))?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::dns_failed(host, "no addresses"));
        }

        let tcp = TcpStream::connect(&addrs[..])
            .await
            .map_err(|e| classify_io_error(&e, host, port))?;
        let _ = tcp.set_nodelay(true);

        let config = self
            .tls_connector()?
            .configure()
            .map_err(|_| NetError::SslProtocolError)?;
        let tls = tokio_boring::connect(config, bare_host, tcp)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, host = %host, "TLS handshake failed");
                NetError::SslProtocolError
            })?;

        let use_h2 = tls.ssl().selected_alpn_protocol() == Some(b"h2".as_slice());
        tracing::debug!(host = %host, h2 = use_h2, "TLS connection established");

        if use_h2 {
            let (mut sender, conn) = http2::handshake(TokioExecutor::new(), TokioIo::new(tls))
                .await
                .map_err(|e| NetError::connection_failed_to(host, port, e))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(error = %e, "h2 connection closed with error");
                }
            });
            sender
                .send_request(req)
                .await
                .map_err(|e| hyper_error(&e, host, port))
        } else {
            // HTTP/1.1 on a raw connection wants origin-form plus Host
            let authority = match url.port() {
                Some(p) => format!("{host}:{p}"),
                None => host.to_string(),
            };
            if !req.headers().contains_key(http::header::HOST) {
                let value = authority.parse().map_err(|_| NetError::InvalidHeader)?;
                req.headers_mut().insert(http::header::HOST, value);
            }
            let origin_form = match url.query() {
                Some(q) => format!("{}?{q}", url.path()),
                None => url.path().to_string(),
            };
            *req.uri_mut() = origin_form.parse().map_err(|_| NetError::InvalidUrl)?;

            let (mut sender, conn) = http1::handshake(TokioIo::new(tls))
                .await
                .map_err(|e| NetError::connection_failed_to(host, port, e))?;
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    tracing::debug!(error = %e, "http/1.1 connection closed with error");
                }
            });
            sender
                .send_request(req)
                .await
                .map_err(|e| hyper_error(&e, host, port))
        }
    }
}

impl Transport for HyperTransport {
    fn execute(&self, request: PreparedRequest) -> Executing<'_> {
        Box::pin(async move {
            match self.config.timeout {
                Some(limit) => tokio::time::timeout(limit, self.send(request))
                    .await
                    .map_err(|_| TransportError::Net(NetError::ConnectionTimedOut))?,
                None => self.send(request).await,
            }
        })
    }
}

/// Walk the error chain for the IO error behind a failed exchange.
fn map_client_error(err: &hyper_util::client::legacy::Error, url: &Url) -> NetError {
    let host = url.host_str().unwrap_or_default();
    let port = url.port_or_known_default().unwrap_or(80);

    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        // hyper-util's connector labels resolver failures this way
        if e.to_string().starts_with("dns error") {
            let reason = e.source().map_or_else(|| e.to_string(), |s| s.to_string());
            return NetError::dns_failed(host, reason);
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return classify_io_error(io, host, port);
        }
        source = e.source();
    }

    if err.is_connect() {
        NetError::connection_failed_to(host, port, err)
    } else {
        tracing::debug!(error = %err, url = %url, "exchange failed without IO cause");
        NetError::ConnectionClosed
    }
}

/// Map an error from a hand-driven hyper connection.
fn hyper_error(err: &hyper::Error, host: &str, port: u16) -> NetError {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return classify_io_error(io, host, port);
        }
        source = e.source();
    }
    tracing::debug!(error = %err, host = %host, "exchange failed without IO cause");
    NetError::ConnectionClosed
}
