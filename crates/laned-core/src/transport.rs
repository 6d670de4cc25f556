use async_trait::async_trait;

use crate::error::LanedError;

/// A single connection of whatever request/response protocol the host
/// speaks. The core never parses or executes requests itself — callers
/// reach the concrete transport through `BorrowedHandle`'s `Deref` and call
/// its own inherent API.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Cheap, non-blocking liveness check.
    fn is_open(&self) -> bool;

    /// Physically closes the transport. Idempotent: a transport that is
    /// already closed returns `Ok(())`.
    async fn close(&self) -> Result<(), LanedError>;
}

/// Opens one new `Transport`. Called exactly `N` times during
/// `LanedManager` construction and never again afterward — lanes are
/// long-lived for the manager's lifetime.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    type Transport: Transport;

    async fn open(&self) -> Result<Self::Transport, LanedError>;
}
