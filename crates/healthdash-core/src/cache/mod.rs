//! In-memory resource caching for one dashboard session.
//!
//! `ResourceCache` holds the resources of the focused member: the last
//! fetched payload (with its fetch time), a failure, or the handle of a
//! fetch in progress. Nothing is persisted; the cache is cleared whenever
//! the focus changes.

pub mod store;

pub use store::{CachedData, InFlight, LoadTicket, ResourceCache};
