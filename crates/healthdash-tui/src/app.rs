//! Application state management for healthdash.
//!
//! `App` mirrors the controller's state from its event stream and holds
//! the terminal-only state (overlays, the AI input line, the member picker).
//! Rendering reads `App` only; user intents go back to the controller as
//! [`Action`] values.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use healthdash_core::api::ApiClient;
use healthdash_core::cache::CachedData;
use healthdash_core::chat::TranscriptEntry;
use healthdash_core::config::Config;
use healthdash_core::controller::{Action, AggregateController, ControllerEvent, ControllerOptions};
use healthdash_core::models::{MemberId, MemberProfile, MemberSummary, Resource, ResourceId};
use healthdash_core::view::Tab;
use healthdash_core::FetchError;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for an AI query.
pub const MAX_QUERY_LENGTH: usize = 500;

/// Number of lines to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: u16 = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    PickingMember,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Results of background work the controller does not own.
enum BackgroundResult {
    Members(Result<Vec<MemberSummary>, FetchError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    controller: AggregateController<ApiClient>,
    api: ApiClient,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
    background_rx: mpsc::Receiver<BackgroundResult>,
    background_tx: mpsc::Sender<BackgroundResult>,

    pub state: AppState,
    pub current_tab: Tab,
    pub member: Option<MemberId>,
    pub resources: HashMap<ResourceId, Resource>,
    pub content_scroll: u16,

    // AI chat
    pub transcript: Vec<TranscriptEntry>,
    pub query_pending: bool,
    pub query_input: String,

    // Member picker
    pub members: Vec<MemberSummary>,
    pub members_loading: bool,
    pub member_selection: usize,

    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config)?;
        let (controller, events_rx) =
            AggregateController::new(api.clone(), ControllerOptions::from_config(&config));
        let (background_tx, background_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let current_tab = config.initial_tab;
        debug!(base_url = %api.base_url(), "App created");

        Ok(Self {
            config,
            controller,
            api,
            events_rx,
            background_rx,
            background_tx,

            state: AppState::Normal,
            current_tab,
            member: None,
            resources: HashMap::new(),
            content_scroll: 0,

            transcript: Vec::new(),
            query_pending: false,
            query_input: String::new(),

            members: Vec::new(),
            members_loading: false,
            member_selection: 0,

            status_message: None,
        })
    }

    /// Load the member directory and focus the startup member, if any.
    pub fn start(&mut self, member: Option<MemberId>) {
        self.load_members();
        match member.or_else(|| self.config.startup_member().cloned()) {
            Some(member) => self.focus_member(member),
            None => {
                self.state = AppState::PickingMember;
                self.status_message = Some("Select a member to begin".to_string());
            }
        }
    }

    /// Fetch the member directory in the background.
    pub fn load_members(&mut self) {
        if self.members_loading {
            return;
        }
        self.members_loading = true;
        let api = self.api.clone();
        let tx = self.background_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_members().await;
            if tx.send(BackgroundResult::Members(result)).await.is_err() {
                debug!("Member directory arrived after shutdown");
            }
        });
    }

    // ===== Actions =====

    pub fn focus_member(&mut self, member: MemberId) {
        info!(member = %member, "Member selected");
        self.config.last_member = Some(member.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        self.dispatch(Action::FocusChanged(member));
    }

    /// Switch tabs right away; the controller's TabChanged event confirms it.
    pub fn select_tab(&mut self, tab: Tab) {
        if self.current_tab != tab {
            self.current_tab = tab;
            self.content_scroll = 0;
        }
        self.dispatch(Action::TabSelected(tab));
    }

    /// Retry the active tab's resource if it failed.
    pub fn retry_current(&mut self) {
        let Some(id) = self.current_tab.resource() else {
            return;
        };
        if self.resource(id).is_failed() {
            self.status_message = Some(format!("Retrying {}...", self.current_tab.title()));
            self.dispatch(Action::RetryRequested(id));
        }
    }

    pub fn submit_query(&mut self) {
        let query = self.query_input.clone();
        match self.controller.dispatch(Action::QuerySubmitted(query)) {
            Ok(()) => {
                self.query_input.clear();
                self.status_message = None;
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    fn dispatch(&mut self, action: Action) {
        if let Err(e) = self.controller.dispatch(action) {
            self.status_message = Some(e.to_string());
        }
    }

    // ===== Background updates =====

    /// Apply every pending controller event and background result.
    pub fn check_background_tasks(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
        }
        while let Ok(result) = self.background_rx.try_recv() {
            self.process_background_result(result);
        }
    }

    fn apply_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::FocusChanged { member, generation } => {
                debug!(member = %member, generation, "Focus mirrored");
                self.member = Some(member);
                self.resources.clear();
                self.transcript.clear();
                self.query_pending = false;
                self.content_scroll = 0;
                self.status_message = None;
            }
            ControllerEvent::TabChanged(tab) => {
                self.current_tab = tab;
                self.content_scroll = 0;
            }
            ControllerEvent::ResourceChanged(resource) => {
                if resource.is_ready() && Tab::from_resource(resource.id) == self.current_tab {
                    self.status_message = None;
                }
                self.resources.insert(resource.id, resource);
            }
            ControllerEvent::TranscriptAppended(entry) => self.transcript.push(entry),
            ControllerEvent::QueryPending(pending) => self.query_pending = pending,
        }
    }

    fn process_background_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::Members(Ok(members)) => {
                self.members_loading = false;
                self.member_selection = self
                    .member
                    .as_ref()
                    .and_then(|m| members.iter().position(|s| &s.member_id() == m))
                    .unwrap_or(0);
                self.members = members;
            }
            BackgroundResult::Members(Err(e)) => {
                self.members_loading = false;
                warn!(error = %e, "Failed to load member directory");
                // Fall back to the configured default so the picker is usable.
                if self.members.is_empty() {
                    if let Some(member) = self.config.preferred_member().cloned() {
                        self.members.push(MemberSummary {
                            id: Some(member.as_str().to_string()),
                            name: member.as_str().to_string(),
                            ..Default::default()
                        });
                    }
                }
                self.status_message = Some(format!("Member list: {}", e.user_message()));
            }
        }
    }

    // ===== Queries =====

    pub fn resource(&self, id: ResourceId) -> Resource {
        self.resources
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Resource::not_requested(id))
    }

    /// Display name of the focused member, from the profile when loaded.
    pub fn member_display_name(&self) -> Option<String> {
        let member = self.member.as_ref()?;
        let name = self
            .resources
            .get(&ResourceId::Profile)
            .and_then(|r| r.decode::<MemberProfile>())
            .and_then(Result::ok)
            .and_then(|p| p.name)
            .unwrap_or_else(|| member.to_string());
        Some(name)
    }

    /// Age of the most recently loaded resource, for the status bar.
    pub fn last_updated(&self) -> Option<String> {
        self.controller.last_updated().map(|cached_at| {
            CachedData { data: (), cached_at }.age_display()
        })
    }

    /// Number of resources still loading for the focused member.
    pub fn loading_count(&self) -> usize {
        self.resources.values().filter(|r| r.is_loading()).count()
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a query character should be accepted
pub fn can_add_query_char(current_len: usize, c: char) -> bool {
    current_len < MAX_QUERY_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================
