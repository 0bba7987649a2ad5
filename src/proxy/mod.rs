//! Upstream side of the relay
//!
//! Opens a connection to the configured provider for every request and
//! captures its response.

pub mod upstream;

pub use upstream::UpstreamClient;
