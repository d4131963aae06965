use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};

use crate::api::FetchError;
use crate::models::{Payload, Resource, ResourceId, ResourceStatus};

/// Handle to a fetch in progress. Every clone resolves to the same final
/// resource state.
pub type InFlight = Shared<BoxFuture<'static, Resource>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

enum Entry {
    Loading(InFlight),
    Ready(CachedData<Payload>),
    Failed(FetchError),
}

/// Outcome of [`ResourceCache::mark_loading`].
pub enum LoadTicket {
    /// The entry was already Ready or Failed; nothing was started.
    Settled(Resource),
    /// A fetch was already running; attach to it.
    Joined(InFlight),
    /// A new fetch was registered.
    Started(InFlight),
}

/// Session-scoped store of the resources of one focused member.
///
/// Unbounded within a focus (the resource set is small and fixed); the
/// only eviction is [`ResourceCache::clear`] on focus change.
#[derive(Default)]
pub struct ResourceCache {
    entries: HashMap<ResourceId, Entry>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ResourceId) -> Option<Resource> {
        self.entries.get(&id).map(|entry| Resource {
            id,
            status: match entry {
                Entry::Loading(_) => ResourceStatus::Loading,
                Entry::Ready(cached) => ResourceStatus::Ready(cached.clone()),
                Entry::Failed(e) => ResourceStatus::Failed(e.clone()),
            },
        })
    }

    /// Store a fetched payload, stamping the fetch time.
    pub fn put(&mut self, id: ResourceId, payload: Payload) -> Resource {
        let cached = CachedData::new(payload);
        self.entries.insert(id, Entry::Ready(cached.clone()));
        Resource::ready(id, cached)
    }

    /// Register a fetch for `id` unless one is running or already settled.
    ///
    /// `start` is only called when the entry is absent, so concurrent
    /// callers for a Loading resource all get the same handle.
    pub fn mark_loading<F>(&mut self, id: ResourceId, start: F) -> LoadTicket
    where
        F: FnOnce() -> InFlight,
    {
        match self.entries.get(&id) {
            Some(Entry::Loading(handle)) => LoadTicket::Joined(handle.clone()),
            Some(Entry::Ready(cached)) => LoadTicket::Settled(Resource::ready(id, cached.clone())),
            Some(Entry::Failed(e)) => LoadTicket::Settled(Resource::failed(id, e.clone())),
            None => {
                let handle = start();
                self.entries.insert(id, Entry::Loading(handle.clone()));
                LoadTicket::Started(handle)
            }
        }
    }

    pub fn mark_failed(&mut self, id: ResourceId, error: FetchError) -> Resource {
        self.entries.insert(id, Entry::Failed(error.clone()));
        Resource::failed(id, error)
    }

    /// Drop a Failed entry so the next lookup fetches again.
    /// Returns false (and keeps the entry) for any other status.
    pub fn forget_failure(&mut self, id: ResourceId) -> bool {
        if matches!(self.entries.get(&id), Some(Entry::Failed(_))) {
            self.entries.remove(&id);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetch time of the most recently stored payload.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entries
            .values()
            .filter_map(|entry| match entry {
                Entry::Ready(cached) => Some(cached.cached_at),
                _ => None,
            })
            .max()
    }
}

// ============================================================================
// Tests
// ============================================================================
