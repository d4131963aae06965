//! Data models for the health dashboard.
//!
//! - `resource`: resource identifiers, opaque payloads and load status
//! - `member`: focus identity, profile and directory entries
//! - `communication`: chat history with the care team
//! - `biomarker`, `wearable`: time series with trend and chart helpers
//! - `report`: test panel reports and the diagnostic plan
//! - `metrics`: internal operational metrics
//!
//! Every payload view is null-safe: missing or `null` fields decode to
//! defaults rather than failing the whole resource.

pub mod biomarker;
pub mod communication;
pub mod member;
pub mod metrics;
pub mod report;
pub mod resource;
pub mod wearable;

pub use biomarker::{BiomarkerReading, BiomarkerReport, Trend};
pub use communication::{ChatHistory, ChatMessage};
pub use member::{MemberId, MemberProfile, MemberSummary};
pub use metrics::{InternalMetrics, MonthlyMetric};
pub use report::{display_value, DiagnosticPhase, DiagnosticPlan, MonthlyPlan, TestPanel, TestPanelReport, TestReports, TestResult};
pub use resource::{Payload, Resource, ResourceId, ResourceStatus};
pub use wearable::{headline_metrics, WearableDay, WearableMetric};
