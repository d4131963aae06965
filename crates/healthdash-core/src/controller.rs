//! The aggregate controller: read-through cache plus view synchronizer.
//!
//! `AggregateController` owns the view state, the resource cache of the
//! focused member and the AI transcript. Presentation talks to it through
//! [`Action`] values (or the equivalent methods) and mirrors its state from
//! the [`ControllerEvent`] stream.
//!
//! All state lives behind one mutex that is never held across an `.await`.
//! Fetches run in spawned tasks and finish even when every caller has
//! gone away; each carries the focus generation it was started under and
//! is discarded on completion if that focus is no longer current.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{DataSource, FetchError};
use crate::cache::{CachedData, InFlight, LoadTicket, ResourceCache};
use crate::chat::{QueryError, Transcript, TranscriptEntry};
use crate::config::Config;
use crate::models::{MemberId, Payload, Resource, ResourceId};
use crate::view::{FocusState, Tab, ViewState};

/// Typed user intents handled by [`AggregateController::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FocusChanged(MemberId),
    TabSelected(Tab),
    QuerySubmitted(String),
    RetryRequested(ResourceId),
}

/// State changes published to Presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A new member is focused. The cache and the transcript were cleared
    /// and any pending AI query was abandoned.
    FocusChanged { member: MemberId, generation: u64 },
    TabChanged(Tab),
    /// A resource of the current focus changed status.
    ResourceChanged(Resource),
    TranscriptAppended(TranscriptEntry),
    QueryPending(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub initial_tab: Tab,
    /// Resources warmed after the primary one; `None` means every resource
    /// except `internal-metrics`, which backs an on-demand panel.
    pub warm: Option<Vec<ResourceId>>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial_tab: Tab::Profile,
            warm: None,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_tab: config.initial_tab,
            warm: config.warm_resources.clone(),
        }
    }

    fn warm_set(&self, primary: Option<ResourceId>) -> Vec<ResourceId> {
        let candidates: Vec<ResourceId> = match &self.warm {
            Some(list) => list.clone(),
            None => ResourceId::ALL
                .into_iter()
                .filter(|id| *id != ResourceId::InternalMetrics)
                .collect(),
        };
        let mut warm = Vec::with_capacity(candidates.len());
        for id in candidates {
            if Some(id) != primary && !warm.contains(&id) {
                warm.push(id);
            }
        }
        warm
    }
}

struct Inner {
    view: ViewState,
    cache: ResourceCache,
    transcript: Transcript,
    options: ControllerOptions,
    events: UnboundedSender<ControllerEvent>,
}

impl Inner {
    fn emit(&self, event: ControllerEvent) {
        // Presentation may already be gone during shutdown.
        let _ = self.events.send(event);
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of registering interest in a resource.
enum Pending {
    Done(Resource),
    Wait(InFlight),
}

impl Pending {
    fn into_future(self) -> BoxFuture<'static, Resource> {
        match self {
            Pending::Done(resource) => future::ready(resource).boxed(),
            Pending::Wait(handle) => handle.boxed(),
        }
    }
}

/// One dashboard session.
///
/// Cloning yields another handle to the same session.
pub struct AggregateController<S: DataSource> {
    inner: Arc<Mutex<Inner>>,
    source: Arc<S>,
}

impl<S: DataSource> Clone for AggregateController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: DataSource> AggregateController<S> {
    pub fn new(source: S, options: ControllerOptions) -> (Self, UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            view: ViewState::new(options.initial_tab),
            cache: ResourceCache::new(),
            transcript: Transcript::new(),
            options,
            events: tx,
        };
        let controller = Self {
            inner: Arc::new(Mutex::new(inner)),
            source: Arc::new(source),
        };
        (controller, rx)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    // ===== Resources =====

    /// Return the resource for the current focus, fetching it on a miss.
    ///
    /// Ready and Failed entries are returned without touching the network;
    /// a Loading entry is joined rather than fetched again. The request is
    /// registered when this is called, not when the future is first polled.
    /// Never fails: errors come back as a `Failed` resource.
    pub fn ensure(&self, id: ResourceId) -> BoxFuture<'static, Resource> {
        self.request(id, false).into_future()
    }

    /// Fetch a Failed resource again. Behaves like [`ensure`](Self::ensure)
    /// for any other status.
    pub fn retry(&self, id: ResourceId) -> BoxFuture<'static, Resource> {
        self.request(id, true).into_future()
    }

    fn request(&self, id: ResourceId, retry: bool) -> Pending {
        let mut inner = self.lock();

        let (member, generation) = match inner.view.focus_state() {
            FocusState::Focused { member, generation } => (member.clone(), *generation),
            FocusState::Unfocused => {
                debug!(resource = %id, "Resource requested without a focused member");
                return Pending::Done(Resource::failed(id, FetchError::NoFocus));
            }
        };

        if retry && inner.cache.forget_failure(id) {
            info!(resource = %id, member = %member, "Retrying failed resource");
        }

        let source = Arc::clone(&self.source);
        let weak = Arc::downgrade(&self.inner);
        let ticket = inner
            .cache
            .mark_loading(id, || start_fetch(source.as_ref(), weak, id, member.clone(), generation));

        match ticket {
            LoadTicket::Settled(resource) => {
                debug!(resource = %id, "Cache hit");
                Pending::Done(resource)
            }
            LoadTicket::Joined(handle) => {
                debug!(resource = %id, "Joining in-flight fetch");
                Pending::Wait(handle)
            }
            LoadTicket::Started(handle) => {
                debug!(resource = %id, member = %member, generation, "Fetching resource");
                inner.emit(ControllerEvent::ResourceChanged(Resource::loading(id)));
                Pending::Wait(handle)
            }
        }
    }

    /// Current status of a resource without triggering a fetch.
    pub fn peek(&self, id: ResourceId) -> Resource {
        self.lock()
            .cache
            .get(id)
            .unwrap_or_else(|| Resource::not_requested(id))
    }

    /// Fetch time of the most recently loaded resource.
    pub fn last_updated(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.lock().cache.last_updated()
    }

    // ===== View =====

    /// Switch focus to `member`.
    ///
    /// The cache and the transcript are cleared before this returns. The
    /// active tab's resource is requested immediately and, once it has
    /// settled, the warm set is requested. The returned handle completes
    /// after all of them settle. Focusing the member that is already
    /// focused does nothing.
    pub fn on_focus_change(&self, member: MemberId) -> JoinHandle<()> {
        let (generation, primary, warm) = {
            let mut inner = self.lock();
            let Some(generation) = inner.view.focus(member.clone()) else {
                debug!(member = %member, "Member already focused");
                return tokio::spawn(async {});
            };
            inner.cache.clear();
            inner.transcript.reset();
            info!(member = %member, generation, "Focus changed");
            inner.emit(ControllerEvent::FocusChanged { member, generation });

            let primary = inner.view.active_tab().resource();
            let warm = inner.options.warm_set(primary);
            (generation, primary, warm)
        };

        let primary = primary.map(|id| self.ensure(id));
        let controller = self.clone();
        tokio::spawn(async move {
            if let Some(primary) = primary {
                primary.await;
            }
            if !controller.is_current(generation) {
                debug!(generation, "Focus moved on before warming");
                return;
            }
            debug!(count = warm.len(), generation, "Warming cache");
            let warmers: Vec<_> = warm.into_iter().map(|id| controller.ensure(id)).collect();
            future::join_all(warmers).await;
        })
    }

    /// Activate a tab, requesting its resource when a member is focused.
    pub fn select_tab(&self, tab: Tab) -> Option<JoinHandle<Resource>> {
        let focused = {
            let mut inner = self.lock();
            if inner.view.select_tab(tab) {
                inner.emit(ControllerEvent::TabChanged(tab));
            }
            inner.view.member().is_some()
        };
        let id = tab.resource()?;
        if !focused {
            return None;
        }
        Some(tokio::spawn(self.ensure(id)))
    }

    pub fn active_tab(&self) -> Tab {
        self.lock().view.active_tab()
    }

    pub fn member(&self) -> Option<MemberId> {
        self.lock().view.member().cloned()
    }

    pub fn generation(&self) -> Option<u64> {
        self.lock().view.generation()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().view.is_current(generation)
    }

    // ===== AI chat =====

    /// Submit a query and spawn the wait for its reply.
    ///
    /// The gate is checked and the query appended before this returns. The
    /// task yields the reply entry, or `None` when the focus changed while
    /// the query was pending and the reply was discarded.
    pub fn spawn_query(&self, text: &str) -> Result<JoinHandle<Option<TranscriptEntry>>, QueryError> {
        let (query, generation) = {
            let mut inner = self.lock();
            let entry = inner.transcript.begin(text)?;
            let generation = inner.view.generation();
            inner.emit(ControllerEvent::TranscriptAppended(entry.clone()));
            inner.emit(ControllerEvent::QueryPending(true));
            (entry.text, generation)
        };

        let reply = self.source.send_query(&query);
        let weak = Arc::downgrade(&self.inner);
        Ok(tokio::spawn(async move {
            let result = reply.await;
            let inner = weak.upgrade()?;
            let mut inner = lock_inner(&inner);
            if inner.view.generation() != generation {
                debug!("Discarding AI reply for a previous focus");
                return None;
            }
            let entry = inner.transcript.finish(result);
            inner.emit(ControllerEvent::TranscriptAppended(entry.clone()));
            inner.emit(ControllerEvent::QueryPending(false));
            Some(entry)
        }))
    }

    /// Submit a query and wait for its reply.
    pub async fn submit_query(&self, text: &str) -> Result<Option<TranscriptEntry>, QueryError> {
        let handle = self.spawn_query(text)?;
        Ok(handle.await.ok().flatten())
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.entries().to_vec()
    }

    pub fn is_query_pending(&self) -> bool {
        self.lock().transcript.is_pending()
    }

    // ===== Actions =====

    /// Handle one user action. Work is spawned; results arrive as events.
    pub fn dispatch(&self, action: Action) -> Result<(), QueryError> {
        match action {
            Action::FocusChanged(member) => {
                self.on_focus_change(member);
            }
            Action::TabSelected(tab) => {
                self.select_tab(tab);
            }
            Action::QuerySubmitted(text) => {
                self.spawn_query(&text)?;
            }
            Action::RetryRequested(id) => {
                tokio::spawn(self.retry(id));
            }
        }
        Ok(())
    }
}

/// Start the fetch task for `id` and return a handle every waiter can share.
fn start_fetch<S: DataSource>(
    source: &S,
    inner: Weak<Mutex<Inner>>,
    id: ResourceId,
    member: MemberId,
    generation: u64,
) -> InFlight {
    let fetch = source.fetch(id, &member);
    let task = tokio::spawn({
        let inner = inner.clone();
        async move {
            let result = fetch.await;
            complete(&inner, id, generation, result)
        }
    });

    async move {
        match task.await {
            Ok(resource) => resource,
            Err(e) => {
                warn!(resource = %id, error = %e, "Fetch task did not finish");
                complete(&inner, id, generation, Err(FetchError::Unreachable))
            }
        }
    }
    .boxed()
    .shared()
}

/// Record a finished fetch if its focus is still current.
///
/// Stale results are handed back to their waiters but never reach the
/// cache or the event stream.
fn complete(
    inner: &Weak<Mutex<Inner>>,
    id: ResourceId,
    generation: u64,
    result: Result<Payload, FetchError>,
) -> Resource {
    let detached = |result: Result<Payload, FetchError>| match result {
        Ok(payload) => Resource::ready(id, CachedData::new(payload)),
        Err(e) => Resource::failed(id, e),
    };

    let Some(inner) = inner.upgrade() else {
        return detached(result);
    };
    let mut inner = lock_inner(&inner);

    if !inner.view.is_current(generation) {
        debug!(resource = %id, generation, "Discarding stale fetch result");
        return detached(result);
    }

    let resource = match result {
        Ok(payload) => inner.cache.put(id, payload),
        Err(e) => {
            warn!(resource = %id, generation, error = %e, "Resource fetch failed");
            inner.cache.mark_failed(id, e)
        }
    };
    inner.emit(ControllerEvent::ResourceChanged(resource.clone()));
    resource
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{QueryReply, Speaker, FALLBACK_REPLY};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tokio::sync::Semaphore;

    /// In-memory data source with call counters and optional gates.
    #[derive(Clone, Default)]
    struct FakeSource {
        state: Arc<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        calls: Mutex<HashMap<(ResourceId, MemberId), usize>>,
        failures: Mutex<HashMap<ResourceId, FetchError>>,
        fetch_gate: Option<Arc<Semaphore>>,
        queries: Mutex<Vec<String>>,
        query_reply: Mutex<Option<Result<QueryReply, FetchError>>>,
        query_gate: Option<Arc<Semaphore>>,
    }

    impl FakeSource {
        fn gated(fetch_gate: Option<Arc<Semaphore>>, query_gate: Option<Arc<Semaphore>>) -> Self {
            Self {
                state: Arc::new(FakeState {
                    fetch_gate,
                    query_gate,
                    ..Default::default()
                }),
            }
        }

        fn fail(&self, id: ResourceId, error: FetchError) {
            self.state.failures.lock().unwrap().insert(id, error);
        }

        fn heal(&self, id: ResourceId) {
            self.state.failures.lock().unwrap().remove(&id);
        }

        fn reply_with(&self, reply: Result<QueryReply, FetchError>) {
            *self.state.query_reply.lock().unwrap() = Some(reply);
        }

        fn calls(&self, id: ResourceId, member: &str) -> usize {
            let calls = self.state.calls.lock().unwrap();
            calls.get(&(id, MemberId::new(member))).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.state.calls.lock().unwrap().values().sum()
        }
    }

    async fn pass(gate: Option<Arc<Semaphore>>) {
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    impl DataSource for FakeSource {
        fn fetch(&self, resource: ResourceId, member: &MemberId) -> BoxFuture<'static, Result<Payload, FetchError>> {
            *self
                .state
                .calls
                .lock()
                .unwrap()
                .entry((resource, member.clone()))
                .or_default() += 1;

            let failure = self.state.failures.lock().unwrap().get(&resource).cloned();
            let gate = self.state.fetch_gate.clone();
            let member = member.clone();
            async move {
                pass(gate).await;
                match failure {
                    Some(e) => Err(e),
                    None => Ok(Payload::new(json!({
                        "resource": resource.path_segment(),
                        "member": member.as_str(),
                    }))),
                }
            }
            .boxed()
        }

        fn send_query(&self, query: &str) -> BoxFuture<'static, Result<QueryReply, FetchError>> {
            self.state.queries.lock().unwrap().push(query.to_string());
            let reply = self
                .state
                .query_reply
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(QueryReply::new(format!("answer to {}", query))));
            let gate = self.state.query_gate.clone();
            async move {
                pass(gate).await;
                reply
            }
            .boxed()
        }
    }

    fn controller(source: &FakeSource, options: ControllerOptions) -> (AggregateController<FakeSource>, UnboundedReceiver<ControllerEvent>) {
        AggregateController::new(source.clone(), options)
    }

    fn no_warm() -> ControllerOptions {
        ControllerOptions {
            warm: Some(Vec::new()),
            ..Default::default()
        }
    }

    fn drain(rx: &mut UnboundedReceiver<ControllerEvent>) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn member_of(resource: &Resource) -> Value {
        resource.payload().unwrap().value()["member"].clone()
    }

    #[test]
    fn test_default_warm_set() {
        let options = ControllerOptions::default();
        assert_eq!(
            options.warm_set(Some(ResourceId::Profile)),
            vec![
                ResourceId::Chats,
                ResourceId::Biomarkers,
                ResourceId::Wearables,
                ResourceId::TestReports,
                ResourceId::Diagnostics,
            ]
        );
        assert_eq!(options.warm_set(None).len(), 6);
    }

    #[test]
    fn test_configured_warm_set_drops_primary_and_duplicates() {
        let options = ControllerOptions {
            warm: Some(vec![ResourceId::Chats, ResourceId::Profile, ResourceId::Chats]),
            ..Default::default()
        };
        assert_eq!(options.warm_set(Some(ResourceId::Profile)), vec![ResourceId::Chats]);
    }

    #[tokio::test]
    async fn test_ensure_without_focus() {
        let source = FakeSource::default();
        let (c, _rx) = controller(&source, ControllerOptions::default());

        let resource = c.ensure(ResourceId::Profile).await;
        assert_eq!(resource.error(), Some(&FetchError::NoFocus));
        assert_eq!(source.total_calls(), 0);
        assert_eq!(c.peek(ResourceId::Profile), Resource::not_requested(ResourceId::Profile));
    }

    #[tokio::test]
    async fn test_focus_warms_cache_and_serves_hits() {
        let source = FakeSource::default();
        let (c, mut rx) = controller(&source, ControllerOptions::default());

        c.on_focus_change(MemberId::new("m1")).await.unwrap();
        assert_eq!(source.total_calls(), 6);
        assert_eq!(source.calls(ResourceId::InternalMetrics, "m1"), 0);

        let biomarkers = c.ensure(ResourceId::Biomarkers).await;
        assert!(biomarkers.is_ready());
        assert_eq!(source.total_calls(), 6);

        let events = drain(&mut rx);
        assert_eq!(
            events[0],
            ControllerEvent::FocusChanged { member: MemberId::new("m1"), generation: 1 }
        );
        assert_eq!(
            events[1],
            ControllerEvent::ResourceChanged(Resource::loading(ResourceId::Profile))
        );
        let ready = events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::ResourceChanged(r) if r.is_ready()))
            .count();
        assert_eq!(ready, 6);
    }

    #[tokio::test]
    async fn test_cache_hit_returns_identical_payload() {
        let source = FakeSource::default();
        let (c, _rx) = controller(&source, no_warm());
        c.on_focus_change(MemberId::new("m1")).await.unwrap();

        let first = c.ensure(ResourceId::Chats).await;
        let second = c.ensure(ResourceId::Chats).await;
        assert!(first.payload().unwrap().ptr_eq(second.payload().unwrap()));
        assert_eq!(source.calls(ResourceId::Chats, "m1"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_coalesces() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(Some(gate.clone()), None);
        let (c, _rx) = controller(&source, no_warm());
        let focus = c.on_focus_change(MemberId::new("m1"));

        let first = c.ensure(ResourceId::Wearables);
        let second = c.ensure(ResourceId::Wearables);
        assert!(c.peek(ResourceId::Wearables).is_loading());
        assert_eq!(source.calls(ResourceId::Wearables, "m1"), 1);

        gate.add_permits(10);
        let (first, second) = tokio::join!(first, second);
        focus.await.unwrap();

        assert!(first.payload().unwrap().ptr_eq(second.payload().unwrap()));
        assert_eq!(source.calls(ResourceId::Wearables, "m1"), 1);
    }

    #[tokio::test]
    async fn test_fetch_completes_after_waiter_dropped() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(Some(gate.clone()), None);
        let (c, _rx) = controller(&source, no_warm());
        c.on_focus_change(MemberId::new("m1"));

        drop(c.ensure(ResourceId::Diagnostics));
        gate.add_permits(10);

        let resource = c.ensure(ResourceId::Diagnostics).await;
        assert!(resource.is_ready());
        assert_eq!(source.calls(ResourceId::Diagnostics, "m1"), 1);
    }

    #[tokio::test]
    async fn test_focus_change_invalidates_cache() {
        let source = FakeSource::default();
        let (c, _rx) = controller(&source, no_warm());

        c.on_focus_change(MemberId::new("m1")).await.unwrap();
        c.ensure(ResourceId::Chats).await;

        c.on_focus_change(MemberId::new("m2")).await.unwrap();
        assert_eq!(c.peek(ResourceId::Chats).status, Resource::not_requested(ResourceId::Chats).status);

        let chats = c.ensure(ResourceId::Chats).await;
        assert_eq!(member_of(&chats), json!("m2"));
        assert_eq!(source.calls(ResourceId::Chats, "m1"), 1);
        assert_eq!(source.calls(ResourceId::Chats, "m2"), 1);
    }

    #[tokio::test]
    async fn test_refocus_same_member_is_noop() {
        let source = FakeSource::default();
        let (c, mut rx) = controller(&source, ControllerOptions::default());

        c.on_focus_change(MemberId::new("m1")).await.unwrap();
        drain(&mut rx);
        c.on_focus_change(MemberId::new("m1")).await.unwrap();

        assert_eq!(source.total_calls(), 6);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(c.generation(), Some(1));
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(Some(gate.clone()), None);
        let (c, mut rx) = controller(&source, no_warm());

        let focus_m1 = c.on_focus_change(MemberId::new("m1"));
        let old_chats = c.ensure(ResourceId::Chats);
        let focus_m2 = c.on_focus_change(MemberId::new("m2"));

        gate.add_permits(10);
        let old_chats = old_chats.await;
        focus_m1.await.unwrap();
        focus_m2.await.unwrap();

        // The old waiter still sees its own result.
        assert_eq!(member_of(&old_chats), json!("m1"));
        // The new focus never saw it.
        assert_eq!(c.peek(ResourceId::Chats).status, Resource::not_requested(ResourceId::Chats).status);
        assert_eq!(member_of(&c.peek(ResourceId::Profile)), json!("m2"));

        let leaked = drain(&mut rx).into_iter().any(|e| match e {
            ControllerEvent::ResourceChanged(r) => r.is_ready() && member_of(&r) == json!("m1"),
            _ => false,
        });
        assert!(!leaked);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(Some(gate.clone()), None);
        source.fail(ResourceId::Chats, FetchError::Unreachable);
        let (c, mut rx) = controller(&source, no_warm());

        let focus_m1 = c.on_focus_change(MemberId::new("m1"));
        let old_chats = c.ensure(ResourceId::Chats);
        let focus_m2 = c.on_focus_change(MemberId::new("m2"));

        gate.add_permits(10);
        let old_chats = old_chats.await;
        focus_m1.await.unwrap();
        focus_m2.await.unwrap();

        assert_eq!(old_chats.error(), Some(&FetchError::Unreachable));
        assert_eq!(c.peek(ResourceId::Chats).status, Resource::not_requested(ResourceId::Chats).status);

        let leaked = drain(&mut rx)
            .into_iter()
            .any(|e| matches!(e, ControllerEvent::ResourceChanged(r) if r.is_failed()));
        assert!(!leaked);

        // The new focus fetches for itself.
        source.heal(ResourceId::Chats);
        let fresh = c.ensure(ResourceId::Chats).await;
        assert_eq!(member_of(&fresh), json!("m2"));
    }

    #[tokio::test]
    async fn test_failed_warm_is_isolated() {
        let source = FakeSource::default();
        source.fail(ResourceId::Wearables, FetchError::ServerError(500));
        let (c, _rx) = controller(&source, ControllerOptions::default());

        c.on_focus_change(MemberId::new("m1")).await.unwrap();

        assert_eq!(
            c.peek(ResourceId::Wearables).error(),
            Some(&FetchError::ServerError(500))
        );
        assert!(c.ensure(ResourceId::Biomarkers).await.is_ready());
        assert!(c.ensure(ResourceId::Profile).await.is_ready());
    }

    #[tokio::test]
    async fn test_failure_not_retried_until_requested() {
        let source = FakeSource::default();
        source.fail(ResourceId::Chats, FetchError::Unreachable);
        let (c, _rx) = controller(&source, no_warm());
        c.on_focus_change(MemberId::new("m1")).await.unwrap();

        assert!(c.ensure(ResourceId::Chats).await.is_failed());
        assert!(c.ensure(ResourceId::Chats).await.is_failed());
        assert_eq!(source.calls(ResourceId::Chats, "m1"), 1);

        source.heal(ResourceId::Chats);
        assert!(c.retry(ResourceId::Chats).await.is_ready());
        assert_eq!(source.calls(ResourceId::Chats, "m1"), 2);

        // Retrying a Ready resource is a plain cache hit.
        assert!(c.retry(ResourceId::Chats).await.is_ready());
        assert_eq!(source.calls(ResourceId::Chats, "m1"), 2);
    }

    #[tokio::test]
    async fn test_select_tab_fetches_on_miss() {
        let source = FakeSource::default();
        let (c, mut rx) = controller(&source, no_warm());

        assert!(c.select_tab(Tab::Biomarkers).is_none());
        assert_eq!(drain(&mut rx), vec![ControllerEvent::TabChanged(Tab::Biomarkers)]);

        c.on_focus_change(MemberId::new("m1")).await.unwrap();
        assert_eq!(source.calls(ResourceId::Biomarkers, "m1"), 1);

        let metrics = c.select_tab(Tab::Metrics).unwrap().await.unwrap();
        assert!(metrics.is_ready());
        assert!(c.select_tab(Tab::AiChat).is_none());
        assert_eq!(c.active_tab(), Tab::AiChat);
    }

    #[tokio::test]
    async fn test_ai_tab_focus_warms_everything_but_metrics() {
        let source = FakeSource::default();
        let options = ControllerOptions {
            initial_tab: Tab::AiChat,
            warm: None,
        };
        let (c, _rx) = controller(&source, options);

        c.on_focus_change(MemberId::new("m1")).await.unwrap();
        assert_eq!(source.total_calls(), 6);
        assert_eq!(source.calls(ResourceId::Profile, "m1"), 1);
    }

    #[tokio::test]
    async fn test_second_query_rejected_while_pending() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(None, Some(gate.clone()));
        let (c, _rx) = controller(&source, no_warm());

        let pending = c.spawn_query("what changed?").unwrap();
        assert!(c.is_query_pending());
        assert_eq!(c.spawn_query("and why?").unwrap_err(), QueryError::Busy);

        gate.add_permits(1);
        let reply = pending.await.unwrap().unwrap();
        assert_eq!(reply.text, "answer to what changed?");

        let transcript = c.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].speaker, Speaker::Member);
        assert_eq!(transcript[0].text, "what changed?");
        assert_eq!(transcript[1].speaker, Speaker::Assistant);
        assert!(!c.is_query_pending());
        assert_eq!(source.state.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_appends_fallback() {
        let source = FakeSource::default();
        source.reply_with(Err(FetchError::ServerError(502)));
        let (c, mut rx) = controller(&source, no_warm());

        let reply = c.submit_query("hello").await.unwrap().unwrap();
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert!(reply.failed);

        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&ControllerEvent::QueryPending(false)));
    }

    #[tokio::test]
    async fn test_reply_context_reaches_transcript() {
        let source = FakeSource::default();
        source.reply_with(Ok(QueryReply::new("Zone 2 builds aerobic base.")
            .with_context("[2025-02-03] Advik: adding zone 2")));
        let (c, mut rx) = controller(&source, no_warm());

        let reply = c.submit_query("why zone 2?").await.unwrap().unwrap();
        assert_eq!(reply.context.as_deref(), Some("[2025-02-03] Advik: adding zone 2"));

        let appended = drain(&mut rx).into_iter().any(|e| {
            matches!(e, ControllerEvent::TranscriptAppended(entry) if entry.context.is_some())
        });
        assert!(appended);
    }

    #[tokio::test]
    async fn test_reply_after_focus_change_discarded() {
        let gate = Arc::new(Semaphore::new(0));
        let source = FakeSource::gated(None, Some(gate.clone()));
        let (c, _rx) = controller(&source, no_warm());
        c.on_focus_change(MemberId::new("m1")).await.unwrap();

        let pending = c.spawn_query("about m1").unwrap();
        c.on_focus_change(MemberId::new("m2")).await.unwrap();
        assert!(c.transcript().is_empty());
        assert!(!c.is_query_pending());

        gate.add_permits(1);
        assert_eq!(pending.await.unwrap(), None);
        assert!(c.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_actions() {
        let source = FakeSource::default();
        let (c, mut rx) = controller(&source, no_warm());

        assert_eq!(c.dispatch(Action::QuerySubmitted("  ".into())), Err(QueryError::Empty));
        c.dispatch(Action::TabSelected(Tab::Reports)).unwrap();
        c.dispatch(Action::FocusChanged(MemberId::new("m1"))).unwrap();
        assert_eq!(c.member(), Some(MemberId::new("m1")));
        assert!(c.peek(ResourceId::TestReports).is_loading());

        let events = drain(&mut rx);
        assert_eq!(events[0], ControllerEvent::TabChanged(Tab::Reports));
        assert!(matches!(events[1], ControllerEvent::FocusChanged { .. }));

        let reports = c.ensure(ResourceId::TestReports).await;
        assert!(reports.is_ready());
        assert_eq!(source.calls(ResourceId::TestReports, "m1"), 1);
    }
}
