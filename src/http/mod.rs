//! HTTP request/response plumbing: descriptors, headers, bodies, query
//! parameters and the transport seam.

pub mod orderedheaders;
pub mod params;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod transport;

// Re-exports for convenience
pub use orderedheaders::OrderedHeaders;
pub use params::QueryParam;
pub use request::{PreparedRequest, RequestDescriptor};
pub use requestbody::RequestBody;
pub use response::{Exchange, RawResponse, ResponseEnvelope};
pub use transport::{Executing, HyperTransport, Transport, TransportConfig, TransportError};
