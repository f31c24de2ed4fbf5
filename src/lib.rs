pub mod config;
pub mod error;
pub mod global;
pub mod http;
pub mod schema;

pub use config::ClientConfig;
pub use error::{RequestError, Result, ValidationIssue};
pub use http::{Client, RequestOptions};
pub use schema::{JsonSchemaValidator, SchemaValidator};
pub use tokio_util::sync::CancellationToken;
