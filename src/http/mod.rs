//! Client side of the relay.
//!
//! - **`connection`**: drives one accepted client socket from first byte to close
//! - **`rewrite`**: sets header values directly on the raw request text
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │  Receiving  │ ← Read 256-byte chunks until "\r\n\r\n"
//!        └──────┬──────┘
//!               │ Terminator seen        (peer hung up → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │  HeaderComplete  │ ← Rewrite Host, then Cookie
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │   Forwarding     │ ← One request to the upstream
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Write upstream bytes verbatim
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```
//!
//! There is no keep-alive: a connection carries exactly one request. Any
//! error ends the machine early and the socket is closed with nothing written.

pub mod connection;
pub mod rewrite;
