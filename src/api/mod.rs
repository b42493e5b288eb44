//! Backend protocol
//!
//! - `TimedClient` issues one HTTP call per request under a per-endpoint bound
//! - `Backend` is the seam the conversation orchestrator talks to
//! - `ApiClient` implements `Backend` over HTTP

pub mod client;
pub mod endpoint;
pub mod messages;

pub use client::{ApiClient, Backend, RequestBody, TimedClient};
pub use endpoint::{Endpoint, TimeoutBudgets};
pub use messages::{Transcription, Validation};
