//! Request descriptors.
//!
//! A [`RequestDescriptor`] is what callers build; the client turns it into a
//! [`PreparedRequest`] (cookies attached, query serialized, body encoded)
//! which is what a [`Transport`](crate::http::transport::Transport) sends.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::OrderedHeaders;
use crate::http::params::QueryParam;
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::Method;
use http_body_util::Full;
use serde::Serialize;
use url::Url;

/// Transport-neutral description of one API call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, QueryParam)>,
    pub headers: OrderedHeaders,
    pub body: Option<RequestBody>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: OrderedHeaders::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a query parameter. Order is preserved on the wire.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryParam>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any existing value under the same name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set request body.
    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, NetError> {
        self.body = Some(RequestBody::json(value)?);
        Ok(self)
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: OrderedHeaders,
    pub body: Bytes,
}

impl PreparedRequest {
    /// The `Cookie` header attached by the client, if any.
    pub fn cookie_header(&self) -> Option<&str> {
        self.headers.get("Cookie")
    }

    /// Build an [`http::Request`] carrying this request.
    pub fn to_http_request(&self) -> Result<http::Request<Full<Bytes>>, NetError> {
        let mut req = http::Request::builder()
            .method(self.method.clone())
            .uri(self.url.as_str())
            .body(Full::new(self.body.clone()))
            .map_err(|_| NetError::InvalidUrl)?;
        *req.headers_mut() = self.headers.to_header_map()?;
        Ok(req)
    }
}
