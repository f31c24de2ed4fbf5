//! HTTP request helper: URL construction, transport, timeout race and
//! status-code dispatch.

mod client;
pub mod endpoint;
mod request;
pub mod response;
mod transport;

pub use client::{Client, RequestOptions};
pub use endpoint::build_url;
pub use request::{APPLICATION_JSON, HttpRequest, HttpResponse, Method};
pub use transport::{ReqwestTransport, Transport, TransportError};
