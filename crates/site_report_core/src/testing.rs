//! Deterministic in-memory doubles for the ports, shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::contract::RawExtraction;
use crate::domain::{Attachment, InboundMessage, MessageKind, Report, ReportQuery};
use crate::ports::{
    ChatTransport, Clock, MediaStorage, PortError, PortResult, ReportExtractor, ReportRepository,
    SpeechToTextService,
};

pub const TARGET_CHAT: &str = "120363418875627490@g.us";

pub fn group_text(sender_id: &str, body: &str) -> InboundMessage {
    InboundMessage {
        message_id: "wamid.text".to_string(),
        chat_id: TARGET_CHAT.to_string(),
        is_group: true,
        sender_id: sender_id.to_string(),
        sender_name: None,
        body: body.to_string(),
        kind: MessageKind::Text,
        attachment: None,
    }
}

pub fn voice_note(sender_id: &str, mime_type: &str) -> InboundMessage {
    InboundMessage {
        message_id: "wamid.voice".to_string(),
        kind: MessageKind::Voice,
        attachment: Some(Attachment {
            mime_type: mime_type.to_string(),
            locator: "media/voice-1".to_string(),
        }),
        ..group_text(sender_id, "")
    }
}

pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 5, 14, 17, 30, 0).unwrap()),
        }
    }
}

impl FakeClock {
    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Records every delivered message and serves a fixed attachment.
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    attachment: Mutex<Vec<u8>>,
    fail_downloads: AtomicBool,
    undeliverable_prefix: Mutex<Option<String>>,
}

impl RecordingTransport {
    pub fn with_attachment(attachment: Vec<u8>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attachment: Mutex::new(attachment),
            fail_downloads: AtomicBool::new(false),
            undeliverable_prefix: Mutex::new(None),
        }
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    pub fn serve_attachment(&self, attachment: Vec<u8>) {
        *self.attachment.lock().unwrap() = attachment;
    }

    /// Messages starting with `prefix` fail and are not recorded.
    pub fn fail_sends_starting_with(&self, prefix: &str) {
        *self.undeliverable_prefix.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat_id: &str, text: &str) -> PortResult<()> {
        let undeliverable = self
            .undeliverable_prefix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|prefix| text.starts_with(prefix));
        if undeliverable {
            return Err(PortError::Unexpected("bridge rejected the message".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn download_attachment(&self, _attachment: &Attachment) -> PortResult<Vec<u8>> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("bridge unreachable".to_string()));
        }
        Ok(self.attachment.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryReports {
    reports: Mutex<Vec<Report>>,
}

#[async_trait]
impl ReportRepository for MemoryReports {
    async fn insert_report(&self, report: &Report) -> PortResult<()> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn list_reports(&self, query: &ReportQuery) -> PortResult<Vec<Report>> {
        let mut reports: Vec<Report> = self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.contractor_id.as_deref().map_or(true, |id| r.contractor_id == id))
            .filter(|r| query.kind.map_or(true, |kind| r.kind() == kind))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        reports.truncate(query.limit as usize);
        Ok(reports)
    }
}

#[derive(Default)]
pub struct MemoryMedia {
    stored: Mutex<Vec<(String, usize)>>,
    fail_writes: AtomicBool,
}

impl MemoryMedia {
    pub fn stored(&self) -> Vec<(String, usize)> {
        self.stored.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStorage for MemoryMedia {
    async fn store(&self, file_name: &str, data: &[u8]) -> PortResult<String> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.stored
            .lock()
            .unwrap()
            .push((file_name.to_string(), data.len()));
        Ok(format!("memory/{file_name}"))
    }
}

pub struct StubTranscriber {
    transcript: String,
}

impl StubTranscriber {
    pub fn ok(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
        }
    }
}

#[async_trait]
impl SpeechToTextService for StubTranscriber {
    async fn transcribe_audio(&self, _audio_data: &[u8], _file_name: &str) -> PortResult<String> {
        Ok(self.transcript.clone())
    }
}

/// Answers every extraction with the same provider message content.
pub struct StubExtractor {
    content: String,
}

impl StubExtractor {
    pub fn answering(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl ReportExtractor for StubExtractor {
    async fn extract(&self, _source_text: &str) -> PortResult<RawExtraction> {
        RawExtraction::parse(&self.content).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
