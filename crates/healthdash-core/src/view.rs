//! View state: the active tab and the focused member.

use serde::{Deserialize, Serialize};

use crate::models::{MemberId, ResourceId};

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    Profile,
    Chats,
    Biomarkers,
    Wearables,
    Reports,
    Diagnostics,
    Metrics,
    AiChat,
}

impl Tab {
    pub const ALL: [Tab; 8] = [
        Tab::Profile,
        Tab::Chats,
        Tab::Biomarkers,
        Tab::Wearables,
        Tab::Reports,
        Tab::Diagnostics,
        Tab::Metrics,
        Tab::AiChat,
    ];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Profile => "Profile",
            Tab::Chats => "Chats",
            Tab::Biomarkers => "Biomarkers",
            Tab::Wearables => "Wearables",
            Tab::Reports => "Reports",
            Tab::Diagnostics => "Diagnostics",
            Tab::Metrics => "Metrics",
            Tab::AiChat => "Ask AI",
        }
    }

    /// The resource backing this tab; `None` for tabs without remote data.
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Tab::Profile => Some(ResourceId::Profile),
            Tab::Chats => Some(ResourceId::Chats),
            Tab::Biomarkers => Some(ResourceId::Biomarkers),
            Tab::Wearables => Some(ResourceId::Wearables),
            Tab::Reports => Some(ResourceId::TestReports),
            Tab::Diagnostics => Some(ResourceId::Diagnostics),
            Tab::Metrics => Some(ResourceId::InternalMetrics),
            Tab::AiChat => None,
        }
    }

    pub fn from_resource(id: ResourceId) -> Self {
        match id {
            ResourceId::Profile => Tab::Profile,
            ResourceId::Chats => Tab::Chats,
            ResourceId::Biomarkers => Tab::Biomarkers,
            ResourceId::Wearables => Tab::Wearables,
            ResourceId::TestReports => Tab::Reports,
            ResourceId::Diagnostics => Tab::Diagnostics,
            ResourceId::InternalMetrics => Tab::Metrics,
        }
    }

    /// Zero-based position in the tab bar.
    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    /// Tab at a zero-based position, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Tab::ALL.get(index).copied()
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Focus state machine. There is no transition back to `Unfocused`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusState {
    Unfocused,
    Focused { member: MemberId, generation: u64 },
}

#[derive(Debug, Clone)]
pub struct ViewState {
    active_tab: Tab,
    focus: FocusState,
    last_generation: u64,
}

impl ViewState {
    pub fn new(initial_tab: Tab) -> Self {
        Self {
            active_tab: initial_tab,
            focus: FocusState::Unfocused,
            last_generation: 0,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Returns true when the active tab changed.
    pub fn select_tab(&mut self, tab: Tab) -> bool {
        let changed = self.active_tab != tab;
        self.active_tab = tab;
        changed
    }

    pub fn focus_state(&self) -> &FocusState {
        &self.focus
    }

    pub fn member(&self) -> Option<&MemberId> {
        match &self.focus {
            FocusState::Focused { member, .. } => Some(member),
            FocusState::Unfocused => None,
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self.focus {
            FocusState::Focused { generation, .. } => Some(generation),
            FocusState::Unfocused => None,
        }
    }

    /// Focus `member`, returning the new generation.
    ///
    /// Returns `None` and leaves the state untouched when the member is
    /// already focused.
    pub fn focus(&mut self, member: MemberId) -> Option<u64> {
        if self.member() == Some(&member) {
            return None;
        }
        self.last_generation += 1;
        self.focus = FocusState::Focused {
            member,
            generation: self.last_generation,
        };
        Some(self.last_generation)
    }

    /// Whether `generation` still identifies the current focus.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == Some(generation)
    }
}
