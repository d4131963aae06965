//! Resource identifiers, opaque payloads and per-resource load status.

use std::fmt;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::api::FetchError;
use crate::cache::CachedData;

/// One named category of backend data for the focused member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceId {
    Profile,
    Chats,
    Biomarkers,
    Wearables,
    TestReports,
    Diagnostics,
    InternalMetrics,
}

impl ResourceId {
    pub const ALL: [ResourceId; 7] = [
        ResourceId::Profile,
        ResourceId::Chats,
        ResourceId::Biomarkers,
        ResourceId::Wearables,
        ResourceId::TestReports,
        ResourceId::Diagnostics,
        ResourceId::InternalMetrics,
    ];

    /// Endpoint path segment under `/members/{member}/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ResourceId::Profile => "profile",
            ResourceId::Chats => "chats",
            ResourceId::Biomarkers => "biomarkers",
            ResourceId::Wearables => "wearables",
            ResourceId::TestReports => "test-reports",
            ResourceId::Diagnostics => "diagnostics",
            ResourceId::InternalMetrics => "internal-metrics",
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Parsed backend payload.
///
/// The shape is owned by the backend contract; this type only carries it.
/// Cloning shares the underlying value, so two handles to the same fetch
/// compare equal under [`Payload::ptr_eq`].
#[derive(Debug, Clone)]
pub struct Payload(Arc<Value>);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Decode into one of the typed views in [`crate::models`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        T::deserialize(self.0.as_ref()).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Load status of a resource under the current focus.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceStatus {
    NotRequested,
    Loading,
    Ready(CachedData<Payload>),
    Failed(FetchError),
}

/// A resource identifier paired with its current status.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub status: ResourceStatus,
}

impl Resource {
    pub fn not_requested(id: ResourceId) -> Self {
        Self { id, status: ResourceStatus::NotRequested }
    }

    pub fn loading(id: ResourceId) -> Self {
        Self { id, status: ResourceStatus::Loading }
    }

    pub fn ready(id: ResourceId, data: CachedData<Payload>) -> Self {
        Self { id, status: ResourceStatus::Ready(data) }
    }

    pub fn failed(id: ResourceId, error: FetchError) -> Self {
        Self { id, status: ResourceStatus::Failed(error) }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, ResourceStatus::Ready(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ResourceStatus::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ResourceStatus::Failed(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.status {
            ResourceStatus::Ready(cached) => Some(&cached.data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.status {
            ResourceStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Decode the payload of a Ready resource; `None` for any other status.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<Result<T, FetchError>> {
        self.payload().map(Payload::decode)
    }
}
