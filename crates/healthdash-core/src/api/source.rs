use futures::future::BoxFuture;

use super::FetchError;
use crate::chat::QueryReply;
use crate::models::{MemberId, Payload, ResourceId};

/// Capability that performs the remote reads the controller needs.
///
/// Futures are boxed and `'static` so the controller can drive them from
/// spawned tasks; implementations clone whatever they need out of `self`.
pub trait DataSource: Send + Sync + 'static {
    /// Fetch one resource of `member`.
    fn fetch(&self, resource: ResourceId, member: &MemberId) -> BoxFuture<'static, Result<Payload, FetchError>>;

    /// Forward a free-text question to the AI endpoint.
    fn send_query(&self, query: &str) -> BoxFuture<'static, Result<QueryReply, FetchError>>;
}
