//! Inbound socket handling

pub mod listener;

pub use listener::Listener;
