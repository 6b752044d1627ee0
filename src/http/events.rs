//! Per-tenant lifecycle notifications.
//!
//! Each tenant owns one subscriber list per phase. Emitting a phase calls
//! every subscriber synchronously, in subscription order, with the shared
//! request context. The first failing subscriber stops the emission and its
//! error is handed back to the caller untouched.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::http::context::RequestContext;

/// A named point in a request's handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    StartRequest,
    HandleRequest,
    EndRequest,
}

impl LifecyclePhase {
    /// Phases in emission order.
    pub const ALL: [LifecyclePhase; 3] = [
        LifecyclePhase::StartRequest,
        LifecyclePhase::HandleRequest,
        LifecyclePhase::EndRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::StartRequest => "start-request",
            LifecyclePhase::HandleRequest => "handle-request",
            LifecyclePhase::EndRequest => "end-request",
        }
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a lifecycle subscriber.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A lifecycle subscriber.
pub type LifecycleHandler =
    Arc<dyn Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync>;

/// Subscriber lists for the three lifecycle phases.
pub struct LifecycleHooks {
    start: ArcSwap<Vec<LifecycleHandler>>,
    handle: ArcSwap<Vec<LifecycleHandler>>,
    end: ArcSwap<Vec<LifecycleHandler>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self {
            start: ArcSwap::from_pointee(Vec::new()),
            handle: ArcSwap::from_pointee(Vec::new()),
            end: ArcSwap::from_pointee(Vec::new()),
        }
    }

    fn slot(&self, phase: LifecyclePhase) -> &ArcSwap<Vec<LifecycleHandler>> {
        match phase {
            LifecyclePhase::StartRequest => &self.start,
            LifecyclePhase::HandleRequest => &self.handle,
            LifecyclePhase::EndRequest => &self.end,
        }
    }

    /// Subscribe a handler to `phase`.
    pub fn on<F>(&self, phase: LifecyclePhase, handler: F)
    where
        F: Fn(&mut RequestContext) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let handler: LifecycleHandler = Arc::new(handler);
        self.slot(phase).rcu(|handlers| {
            let mut next = Vec::clone(handlers);
            next.push(Arc::clone(&handler));
            next
        });
    }

    /// Number of subscribers on `phase`.
    pub fn count(&self, phase: LifecyclePhase) -> usize {
        self.slot(phase).load().len()
    }

    /// Call every subscriber of `phase` in order.
    ///
    /// Works on a snapshot: handlers subscribed during emission run from the
    /// next emission on.
    pub fn emit(&self, phase: LifecyclePhase, ctx: &mut RequestContext) -> Result<(), HandlerError> {
        let handlers = self.slot(phase).load_full();
        for handler in handlers.iter() {
            handler(ctx)?;
        }
        Ok(())
    }
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("start", &self.count(LifecyclePhase::StartRequest))
            .field("handle", &self.count(LifecyclePhase::HandleRequest))
            .field("end", &self.count(LifecyclePhase::EndRequest))
            .finish()
    }
}
