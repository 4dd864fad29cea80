//! cumulus-client — the OAuth/JSON-RPC cloud client and the blocking
//! HTTP transport beneath it.

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod list;
pub mod oauth;
pub mod transport;

pub use client::{AccountInfo, CloudClient};
pub use config::{ClientConfig, ConfigError, OAuthConfig};
pub use error::{ClientError, ErrorKind, PART_NOT_FOUND_CODE};
pub use list::{CloudObject, ListQuery, Listing, ObjectKind};
pub use transport::{HttpBackend, HttpClient, HttpReply, TransportError};
