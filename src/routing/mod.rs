//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header, path and query)
//!     → registry.rs (snapshot of tenants, registration order)
//!     → router.rs (exact match, else sole-active fallback)
//!     → matcher.rs (host/port/path rules per tenant)
//!     → Return: Resolution or None
//! ```
//!
//! # Design Decisions
//! - Tenants are swapped in atomically; lookups never block
//! - No regex in hot path (exact hosts, prefix paths)
//! - First registered match wins
//! - A single active tenant catches everything unmatched

pub mod matcher;
pub mod registry;
pub mod router;
pub mod tenant;

pub use matcher::{HostMatch, RequestTarget};
pub use registry::TenantRegistry;
pub use router::{resolve, Resolution, ResolutionKind};
pub use tenant::{EnvDefaults, Port, Tenant};
