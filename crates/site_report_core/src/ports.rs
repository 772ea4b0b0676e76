//! crates/site_report_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the chat bridge, the AI provider and the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::contract::RawExtraction;
use crate::domain::{Attachment, Report, ReportQuery};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The chat session layer: sends replies and fetches attachment bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> PortResult<()>;

    async fn download_attachment(&self, attachment: &Attachment) -> PortResult<Vec<u8>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes an audio file into text. `file_name` carries the container
    /// format through its extension.
    async fn transcribe_audio(&self, audio_data: &[u8], file_name: &str) -> PortResult<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportExtractor: Send + Sync {
    /// Asks the language model to fill the extraction schema from free text.
    /// Malformed provider output is an error, never a partial result.
    async fn extract(&self, source_text: &str) -> PortResult<RawExtraction>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn insert_report(&self, report: &Report) -> PortResult<()>;

    /// Lists reports matching the query, newest first.
    async fn list_reports(&self, query: &ReportQuery) -> PortResult<Vec<Report>>;
}

/// Durable storage for downloaded voice notes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores the bytes under `file_name` and returns the reference kept on the report.
    async fn store(&self, file_name: &str, data: &[u8]) -> PortResult<String>;
}

/// Source of the current time, injected so cooldowns can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
