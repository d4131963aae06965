//! Member identity and profile models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the member under inspection (the focus).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Full member profile (the `profile` resource).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberProfile {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub residence: Option<String>,
    pub chronic_condition: Option<String>,
    pub goals: Vec<String>,
}

impl MemberProfile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown member")
    }

    /// "46 years old • Male • Singapore", skipping missing parts.
    pub fn demographics(&self) -> String {
        let mut parts = Vec::new();
        if let Some(age) = self.age {
            parts.push(format!("{} years old", age));
        }
        if let Some(ref gender) = self.gender {
            if !gender.is_empty() {
                parts.push(gender.clone());
            }
        }
        if let Some(ref residence) = self.residence {
            if !residence.is_empty() {
                parts.push(residence.clone());
            }
        }
        parts.join(" • ")
    }
}

/// Entry of the member directory used to pick a focus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSummary {
    pub id: Option<String>,
    pub name: String,
    pub occupation: Option<String>,
    pub chronic_condition: Option<String>,
}

impl MemberSummary {
    /// The focus identifier: explicit id when present, the name otherwise.
    pub fn member_id(&self) -> MemberId {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => MemberId::new(id),
            _ => MemberId::new(self.name.clone()),
        }
    }
}
