//! Core library for healthdash.
//!
//! Fetches member health data from the dashboard backend, caches it in
//! memory for the focused member and keeps the dashboard's views in step
//! with data that arrives asynchronously:
//!
//! - `api`: the [`DataSource`](api::DataSource) capability and its HTTP
//!   implementation, typed fetch errors, payload normalization
//! - `cache`: per-focus resource cache with in-flight coalescing
//! - `models`: resource identifiers and typed payload views
//! - `view`: active tab and focus state machine
//! - `chat`: AI chat transcript and query gate
//! - `controller`: the [`AggregateController`](controller::AggregateController)
//! - `config`: persisted preferences and environment overrides

pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod controller;
pub mod models;
pub mod view;

pub use api::{ApiClient, DataSource, FetchError};
pub use chat::{QueryError, QueryReply, Speaker, TranscriptEntry};
pub use config::Config;
pub use controller::{Action, AggregateController, ControllerEvent, ControllerOptions};
pub use models::{MemberId, Payload, Resource, ResourceId, ResourceStatus};
pub use view::Tab;
