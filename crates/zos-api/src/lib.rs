// zos-api: async client for the zOS REST API
//
// `RestClient` handles transport (cookies, bearer token, TLS, filters,
// status mapping); endpoint groups live in `channels`, `messages`, `auth`,
// and `users` as inherent methods. Wire types are in `models`.

pub mod auth;
pub mod channels;
pub mod client;
pub mod error;
pub mod messages;
pub mod models;
pub mod transport;
pub mod users;

pub use client::{RequestFilter, RestClient, UploadFile};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
