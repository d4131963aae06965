//! Remote data access for the health dashboard.
//!
//! [`DataSource`] is the capability the controller depends on; [`ApiClient`]
//! implements it over the backend's REST API. Response bodies pass through
//! [`normalize`] before structural parsing, and every failure is reported
//! as a [`FetchError`] value.

pub mod client;
pub mod error;
pub mod normalize;
pub mod source;

pub use client::ApiClient;
pub use error::FetchError;
pub use normalize::{normalize_non_finite, parse_payload};
pub use source::DataSource;
