use std::error::Error as StdError;
use std::fmt;

/// Error surface of the laned core.
///
/// None of these variants carry an `std::io::Error` directly because the
/// core has no I/O of its own — it only ever wraps a caller-supplied
/// transport's failures.
#[derive(Debug)]
pub enum LanedError {
    /// `num_lanes` was outside `[1, 64]`.
    InvalidLaneCount { requested: usize },
    /// A transport failed to open during manager construction. Any lanes
    /// already opened for this manager were closed before this error surfaced.
    InitializationFailed {
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
    /// `acquire` was called after `teardown` completed.
    ManagerShutDown,
    /// A stateful strategy's `select` ran before its `initialize`. Reaching
    /// this indicates a bug in a user-supplied `SelectionStrategy` — the
    /// manager always calls `initialize` during construction.
    NotInitialized,
    /// The underlying transport reported itself closed when the caller
    /// attempted an operation through a `BorrowedHandle`.
    TransportClosed,
}

impl fmt::Display for LanedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanedError::InvalidLaneCount { requested } => {
                write!(f, "lane count {requested} is outside the valid range [1, 64]")
            }
            LanedError::InitializationFailed { source } => {
                write!(f, "transport initialization failed: {source}")
            }
            LanedError::ManagerShutDown => write!(f, "manager has already been torn down"),
            LanedError::NotInitialized => {
                write!(f, "selection strategy used before initialize() was called")
            }
            LanedError::TransportClosed => write!(f, "transport is closed"),
        }
    }
}

impl StdError for LanedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LanedError::InitializationFailed { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl LanedError {
    /// Wraps an arbitrary transport-open failure as `InitializationFailed`.
    pub fn initialization_failed<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        LanedError::InitializationFailed {
            source: Box::new(source),
        }
    }
}

impl From<std::io::Error> for LanedError {
    fn from(e: std::io::Error) -> Self {
        LanedError::initialization_failed(e)
    }
}
