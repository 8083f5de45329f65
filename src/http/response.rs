//! Raw transport responses and the normalized envelope handed to callers.

use crate::base::neterror::NetError;
use crate::http::orderedheaders::OrderedHeaders;
use crate::http::request::PreparedRequest;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use http_body::Body;
use http_body_util::BodyExt;
use std::borrow::Cow;
use url::Url;

/// A fully received response, as produced by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// URL that produced this response.
    pub url: Url,
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(url: Url, status: StatusCode) -> Self {
        Self {
            url,
            status,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Receive the whole body of a response.
    ///
    /// Works for any body type; transports built on hyper pass
    /// `http::Response<hyper::body::Incoming>` straight in.
    pub async fn from_http<B>(url: Url, resp: http::Response<B>) -> Result<Self, NetError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = resp.into_parts();
        let collected = body.collect().await.map_err(|e| {
            tracing::debug!(error = %e, url = %url, "failed to read response body");
            NetError::HttpBodyError
        })?;
        Ok(Self {
            url,
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            body: collected.to_bytes(),
        })
    }

    /// Reason phrase for the status, empty for unregistered codes.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Every `Set-Cookie` value that is valid UTF-8, in arrival order.
    pub fn set_cookie_headers(&self) -> impl Iterator<Item = &str> {
        self.headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// Read body as UTF-8 string.
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.to_vec()).map_err(|_| NetError::HttpBodyError)
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(body).map_err(|_| NetError::JsonParseError {
            status: self.status.as_u16(),
        })
    }
}

/// The final request of a call together with the response it produced.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub request: PreparedRequest,
    pub response: RawResponse,
}

/// Normalized result of one call.
///
/// Server-side failures (4xx, 5xx) arrive here like any other response; check
/// [`status`](Self::status) or [`is_success`](Self::is_success). A body that
/// does not decode as `T` leaves [`data`](Self::data) empty; the raw body stays
/// available through [`text`](Self::text) and [`raw_response`](Self::raw_response).
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<T> {
    status: u16,
    status_text: String,
    data: Option<T>,
    decode_error: Option<NetError>,
    headers: OrderedHeaders,
    request: PreparedRequest,
    response: RawResponse,
}

impl<T> ResponseEnvelope<T> {
    pub(crate) fn new(
        decoded: Result<T, NetError>,
        headers: OrderedHeaders,
        request: PreparedRequest,
        response: RawResponse,
    ) -> Self {
        let (data, decode_error) = match decoded {
            Ok(data) => (Some(data), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            status: response.status.as_u16(),
            status_text: response.status_text().to_string(),
            data,
            decode_error,
            headers,
            request,
            response,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The decoded body, `None` when it was not valid JSON for `T`.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Why the body did not decode (always [`NetError::JsonParseError`]).
    pub fn decode_error(&self) -> Option<&NetError> {
        self.decode_error.as_ref()
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.response.body)
    }

    /// Response headers; `Authorization` and `Content-Type` are canonically cased.
    pub fn headers(&self) -> &OrderedHeaders {
        &self.headers
    }

    /// The request that produced this response (the last hop after redirects).
    pub fn request(&self) -> &PreparedRequest {
        &self.request
    }

    pub fn raw_response(&self) -> &RawResponse {
        &self.response
    }
}
