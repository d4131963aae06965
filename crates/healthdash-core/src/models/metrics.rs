//! Internal operational metrics for the care team.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `internal-metrics` resource.
///
/// Older backends only send the role totals, newer ones the monthly cards;
/// every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalMetrics {
    pub internal_metrics: Vec<MonthlyMetric>,
    pub total_messages: Option<u64>,
    pub messages_by_role: BTreeMap<String, u64>,
    pub members_served_by_role: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyMetric {
    pub month: Option<u32>,
    pub period: Option<String>,
    pub doctor_consults_hours: Option<f64>,
    pub coach_hours: Option<f64>,
    pub plan_adherence_percentage: Option<f64>,
    pub member_initiated_conversations: Option<u64>,
    pub notes: Option<String>,
}

impl InternalMetrics {
    /// Total messages, falling back to the sum of the per-role counts.
    pub fn total_messages(&self) -> Option<u64> {
        self.total_messages.or_else(|| {
            if self.messages_by_role.is_empty() {
                None
            } else {
                Some(self.messages_by_role.values().sum())
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.internal_metrics.is_empty()
            && self.total_messages().is_none()
            && self.members_served_by_role.is_empty()
    }
}
