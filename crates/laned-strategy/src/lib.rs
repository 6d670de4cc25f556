//! The three lane-selection strategies shipped alongside `laned-core`.
//! Each implements `laned_core::SelectionStrategy`; a caller may also
//! supply their own.

mod least_in_flight;
mod round_robin;
mod thread_affinity;

pub use least_in_flight::LeastInFlight;
pub use round_robin::RoundRobin;
pub use thread_affinity::ThreadAffinity;
