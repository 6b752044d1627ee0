//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, panic isolation)
//!     → request.rs (host + URL extraction, buffered body)
//!     → routing (resolve tenant)
//!     → dispatch.rs (start-request → handle-request → end-request)
//!     → response.rs (status, headers, body written by subscribers)
//!     → Send to client
//! ```

pub mod context;
pub mod dispatch;
pub mod events;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use context::{LifecycleState, RequestContext};
pub use dispatch::{dispatch, handle_request, middleware as dispatch_middleware, DispatchError};
pub use events::{HandlerError, LifecycleHandler, LifecycleHooks, LifecyclePhase};
pub use request::{TenantRequest, X_REQUEST_ID};
pub use response::TenantResponse;
pub use server::{HttpServer, ServerError};
