//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Tenant registry
//!     → listener.rs (one binding per distinct port)
//!     → tls.rs (optional certificate loading)
//!     → Hand off to HTTP layer (one axum-server per binding)
//! ```
//!
//! # Design Decisions
//! - Ports come from tenant settings, not from a fixed listener list
//! - TLS is optional and handled per port

pub mod listener;
pub mod tls;

pub use listener::{plan_bindings, ListenerBinding};
