//! AI chat transcript.
//!
//! Queries are serialized: while one is pending, further submissions are
//! rejected, so the transcript always reads query, reply, query, reply in
//! submission order. The transcript belongs to the focused member and is
//! reset on focus change.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::api::FetchError;

/// Reply appended when the backend could not answer.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error processing your request. \
Please make sure the backend is running and try again.";

/// Shown under an answer whose backend found no supporting chat context.
pub const NO_CONTEXT: &str = "No specific context found.";

/// Answer from the AI endpoint, with the chat excerpts it was based on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryReply {
    pub answer: String,
    pub context: Option<String>,
}

impl QueryReply {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Member,
    Assistant,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Member => "You",
            Speaker::Assistant => "AI Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
    /// Set on the fallback reply of a failed query.
    pub failed: bool,
    /// Retrieved context behind an assistant answer, when the backend sent any.
    pub context: Option<String>,
}

impl TranscriptEntry {
    fn new(speaker: Speaker, text: impl Into<String>, failed: bool) -> Self {
        Self {
            speaker,
            text: text.into(),
            at: Utc::now(),
            failed,
            context: None,
        }
    }

    /// Context to display under an assistant answer.
    pub fn context_display(&self) -> Option<&str> {
        match self.speaker {
            Speaker::Assistant if !self.failed => Some(self.context.as_deref().unwrap_or(NO_CONTEXT)),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter a query")]
    Empty,

    #[error("A query is already pending")]
    Busy,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    pending: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a submission, append it and close the gate.
    pub fn begin(&mut self, text: &str) -> Result<TranscriptEntry, QueryError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(QueryError::Empty);
        }
        if self.pending {
            return Err(QueryError::Busy);
        }
        let entry = TranscriptEntry::new(Speaker::Member, query, false);
        self.entries.push(entry.clone());
        self.pending = true;
        Ok(entry)
    }

    /// Append the reply (or the fallback) and reopen the gate.
    pub fn finish(&mut self, reply: Result<QueryReply, FetchError>) -> TranscriptEntry {
        let entry = match reply {
            Ok(reply) if !reply.answer.trim().is_empty() => {
                let mut entry = TranscriptEntry::new(Speaker::Assistant, reply.answer.trim(), false);
                entry.context = reply
                    .context
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
                entry
            }
            Ok(_) => TranscriptEntry::new(Speaker::Assistant, FALLBACK_REPLY, true),
            Err(e) => {
                tracing::warn!(error = %e, "AI query failed");
                TranscriptEntry::new(Speaker::Assistant, FALLBACK_REPLY, true)
            }
        };
        self.entries.push(entry.clone());
        self.pending = false;
        entry
    }

    /// Drop all entries and reopen the gate.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.pending = false;
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
