// millbook-api: Async HTTP client for the rice-mill back-office API

pub mod client;
pub mod error;
pub mod models;
mod records;
pub mod transport;

pub use client::MillClient;
pub use error::Error;
pub use models::{RawPagination, RecordPage};
pub use transport::{TlsMode, TransportConfig};
