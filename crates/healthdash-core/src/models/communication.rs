//! Chat history between the member and the care team.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatHistory {
    pub communications: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatMessage {
    pub sender: String,
    pub role: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<String>,
    #[serde(alias = "text")]
    pub message: String,
}

impl ChatMessage {
    /// "Ruby (Concierge)" or just the sender when no role is known.
    pub fn sender_label(&self) -> String {
        match self.role.as_deref() {
            Some(role) if !role.is_empty() => format!("{} ({})", self.sender, role),
            _ => self.sender.clone(),
        }
    }
}

impl ChatHistory {
    /// Messages grouped by date, preserving the original order within and
    /// across days. Messages without a date are grouped under "Undated".
    pub fn by_date(&self) -> Vec<(&str, Vec<&ChatMessage>)> {
        let mut groups: Vec<(&str, Vec<&ChatMessage>)> = Vec::new();
        for message in &self.communications {
            let date = message.date.as_deref().unwrap_or("Undated");
            match groups.last_mut() {
                Some((current, messages)) if *current == date => messages.push(message),
                _ => groups.push((date, vec![message])),
            }
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.communications.is_empty()
    }
}
