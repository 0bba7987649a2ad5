//! SourceLink - session-injecting HTTP relay
//!
//! Accepts plain HTTP requests, points their `Host` and `Cookie` headers at a
//! fixed upstream provider and relays the provider's response back.

pub mod config;
pub mod error;
pub mod http;
pub mod proxy;
pub mod server;
