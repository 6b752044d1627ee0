//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Config file → inline tenants → discovered tenants → listener plan → serve
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber (server, watcher loop) wakes once
//!     → listeners stop accepting → in-flight requests drain up to the grace period
//!
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → trigger()
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
