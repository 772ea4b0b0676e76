//! crates/site_report_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database, transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Inbound Messages (owned by the chat transport, live for one pipeline run)
//=========================================================================================

/// The kind of chat message as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A push-to-talk voice note.
    Voice,
    /// Any other media message (image, document, audio file, sticker...).
    Media,
    /// A plain text message.
    Text,
}

/// A binary attachment that can be fetched through the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub mime_type: String,
    /// Transport-specific locator used to download the bytes.
    pub locator: String,
}

impl Attachment {
    pub fn is_audio(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("audio")
    }
}

/// A single message delivered by the chat transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: String,
    pub chat_id: String,
    pub is_group: bool,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub body: String,
    pub kind: MessageKind,
    pub attachment: Option<Attachment>,
}

impl InboundMessage {
    /// The part of the sender identity before the `@` (usually the phone number).
    pub fn sender_handle(&self) -> &str {
        self.sender_id.split('@').next().unwrap_or_default()
    }

    /// Best-effort display name for the sender.
    pub fn display_name(&self) -> String {
        match self.sender_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Usuario ({})", self.sender_handle()),
        }
    }
}

//=========================================================================================
// Reports (persisted, never mutated)
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Audio,
    Text,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Audio => "audio",
            ReportKind::Text => "text",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report kind '{0}'")]
pub struct UnknownReportKind(pub String);

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(ReportKind::Audio),
            "text" | "texto" => Ok(ReportKind::Text),
            other => Err(UnknownReportKind(other.to_string())),
        }
    }
}

/// Where a report came from. An audio report always carries the reference
/// to its stored attachment, a text report never does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOrigin {
    Audio { audio_ref: String },
    Text,
}

impl ReportOrigin {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportOrigin::Audio { .. } => ReportKind::Audio,
            ReportOrigin::Text => ReportKind::Text,
        }
    }

    pub fn audio_ref(&self) -> Option<&str> {
        match self {
            ReportOrigin::Audio { audio_ref } => Some(audio_ref),
            ReportOrigin::Text => None,
        }
    }
}

/// The seven fixed categories every report is normalized into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDetail {
    pub progress: String,
    pub issues: String,
    pub materials: String,
    pub personnel: String,
    pub weather: String,
    pub safety: String,
    pub next_steps: String,
}

/// A daily site report submitted by a contractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub id: Uuid,
    pub contractor_name: String,
    /// Stable sender identity, also the cooldown key.
    pub contractor_id: String,
    pub project_label: String,
    pub project_number: String,
    pub work_permit_number: String,
    pub submitted_at: DateTime<Utc>,
    pub origin: ReportOrigin,
    /// The transcription or the typed text the report was extracted from.
    pub source_text: String,
    pub detail: ReportDetail,
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        self.origin.kind()
    }

    pub fn audio_ref(&self) -> Option<&str> {
        self.origin.audio_ref()
    }
}

/// Filter for listing stored reports. Results are always newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub contractor_id: Option<String>,
    pub kind: Option<ReportKind>,
    pub limit: u32,
}

impl ReportQuery {
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a query, clamping the limit to `1..=MAX_LIMIT`.
    pub fn new(contractor_id: Option<String>, kind: Option<ReportKind>, limit: Option<u32>) -> Self {
        Self {
            contractor_id,
            kind,
            limit: limit.unwrap_or(Self::MAX_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}
