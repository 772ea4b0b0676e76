//! crates/site_report_core/src/pipeline.rs
//!
//! The intake pipeline: turns one inbound chat message into at most one stored
//! report.
//!
//! Flow:
//! 1. `!grupoid` is answered in any chat; everything outside the target chat is ignored
//! 2. Access gate, then cooldown check (both silent on rejection)
//! 3. Dispatch by content: voice note, `!reporte` text, help, anything else
//! 4. Voice notes are downloaded, stored and transcribed
//! 5. The text goes through the extraction contract and coercion
//! 6. The report is persisted, the cooldown armed and a summary sent back

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::access::AccessGate;
use crate::contract::ExtractedFields;
use crate::domain::{Attachment, InboundMessage, MessageKind, Report, ReportOrigin};
use crate::ports::{
    ChatTransport, Clock, MediaStorage, PortError, ReportExtractor, ReportRepository,
    SpeechToTextService,
};
use crate::rate_limiter::{RateLimiter, Throttle};
use crate::replies;

const REPORT_PREFIXES: [&str; 2] = ["!reporte", "!report"];
const HELP_TRIGGERS: [&str; 3] = ["ayuda", "help", "?"];
const GROUP_ID_COMMANDS: [&str; 2] = ["!grupoid", "!groupid"];

//=========================================================================================
// Settings, Collaborators and Outcomes
//=========================================================================================

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// The only chat whose messages can become reports.
    pub target_chat_id: String,
    /// Empty means every sender is allowed.
    pub allowed_senders: Vec<String>,
    pub cooldown: TimeDelta,
    /// Minimum length, in characters, of a text report after the prefix.
    pub min_text_chars: usize,
}

/// The external collaborators the pipeline drives.
#[derive(Clone)]
pub struct PipelinePorts {
    pub transport: Arc<dyn ChatTransport>,
    pub transcriber: Arc<dyn SpeechToTextService>,
    pub extractor: Arc<dyn ReportExtractor>,
    pub reports: Arc<dyn ReportRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub clock: Arc<dyn Clock>,
}

/// A failure that aborts a report. Every variant leaves no record and no cooldown.
/// A summary that cannot be delivered after the report is stored is logged only.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to download attachment: {0}")]
    AttachmentDownload(PortError),
    #[error("failed to store audio: {0}")]
    MediaStorage(PortError),
    #[error("transcription failed: {0}")]
    Transcription(PortError),
    #[error("failed to persist report: {0}")]
    Persistence(PortError),
    #[error("failed to send reply: {0}")]
    Reply(PortError),
}

impl PipelineError {
    /// The text shown to the sender. Internal details are never exposed.
    pub fn user_reply(&self, sender_name: &str) -> String {
        match self {
            PipelineError::Transcription(_) => replies::transcription_failed(sender_name),
            _ => replies::generic_failure(sender_name),
        }
    }
}

#[derive(Debug)]
pub enum Rejection {
    Unauthorized,
    Cooldown { retry_after: TimeDelta },
    TooShort { chars: usize },
    Failed(PipelineError),
}

/// How the handling of one message ended.
#[derive(Debug)]
pub enum Outcome {
    Acknowledged(Report),
    GroupIdSent,
    HelpSent,
    Ignored,
    Rejected(Rejection),
}

//=========================================================================================
// Content Dispatch
//=========================================================================================

#[derive(Debug, PartialEq, Eq)]
enum Dispatch<'a> {
    Audio(&'a Attachment),
    Text(&'a str),
    Help,
    Ignore,
}

fn strip_report_prefix(body: &str) -> Option<&str> {
    let body = body.trim_start();
    REPORT_PREFIXES.iter().find_map(|prefix| {
        body.get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| body[prefix.len()..].trim())
    })
}

fn is_help(body: &str) -> bool {
    let body = body.trim();
    HELP_TRIGGERS.iter().any(|t| body.eq_ignore_ascii_case(t))
}

fn is_group_id_command(body: &str) -> bool {
    let body = body.trim();
    GROUP_ID_COMMANDS.contains(&body)
}

fn classify(message: &InboundMessage) -> Dispatch<'_> {
    if let Some(attachment) = &message.attachment {
        if attachment.is_audio() || message.kind == MessageKind::Voice {
            return Dispatch::Audio(attachment);
        }
    }
    if let Some(content) = strip_report_prefix(&message.body) {
        return Dispatch::Text(content);
    }
    if is_help(&message.body) {
        return Dispatch::Help;
    }
    Dispatch::Ignore
}

fn audio_extension(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/webm" => "webm",
        _ => "ogg",
    }
}

/// Unique per sender and instant: `audio_<sender digits>_<unix millis>.<ext>`.
fn audio_file_name(sender_handle: &str, at: DateTime<Utc>, mime_type: &str) -> String {
    let mut handle: String = sender_handle
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if handle.is_empty() {
        handle.push_str("unknown");
    }
    format!(
        "audio_{}_{}.{}",
        handle,
        at.timestamp_millis(),
        audio_extension(mime_type)
    )
}

//=========================================================================================
// The Pipeline
//=========================================================================================

pub struct IntakePipeline {
    settings: PipelineSettings,
    ports: PipelinePorts,
    access: AccessGate,
    limiter: RateLimiter,
}

impl IntakePipeline {
    pub fn new(settings: PipelineSettings, ports: PipelinePorts) -> Self {
        let access = AccessGate::new(settings.allowed_senders.iter().cloned());
        Self {
            settings,
            ports,
            access,
            limiter: RateLimiter::new(),
        }
    }

    /// Handles one inbound message. Never fails: errors are logged and, for
    /// the target chat, answered with a generic reply.
    #[instrument(skip(self, message), fields(chat = %message.chat_id, sender = %message.sender_id, message_id = %message.message_id))]
    pub async fn handle(&self, message: &InboundMessage) -> Outcome {
        if is_group_id_command(&message.body) {
            return match self.reply_group_id(message).await {
                Ok(()) => Outcome::GroupIdSent,
                Err(err) => {
                    error!(error = %err, "failed to answer group id lookup");
                    Outcome::Rejected(Rejection::Failed(err))
                }
            };
        }

        if self.settings.target_chat_id.is_empty() || message.chat_id != self.settings.target_chat_id {
            debug!("message outside the target chat, ignoring");
            return Outcome::Ignored;
        }

        let sender_name = message.display_name();
        match self.process(message, &sender_name).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "failed to process message");
                let reply = err.user_reply(&sender_name);
                if let Err(reply_err) = self.ports.transport.send_message(&message.chat_id, &reply).await {
                    error!(error = %reply_err, "failed to send error reply");
                }
                Outcome::Rejected(Rejection::Failed(err))
            }
        }
    }

    async fn process(
        &self,
        message: &InboundMessage,
        sender_name: &str,
    ) -> Result<Outcome, PipelineError> {
        let sender_id = message.sender_id.as_str();

        if !self.access.is_authorized(sender_id) {
            info!(sender_name, "unauthorized sender, ignoring");
            return Ok(Outcome::Rejected(Rejection::Unauthorized));
        }

        if let Throttle::Cooldown { retry_after } =
            self.limiter.check_and_throttle(sender_id, self.ports.clock.now())
        {
            info!(
                sender_name,
                retry_after_secs = retry_after.num_seconds(),
                "sender in cooldown, ignoring"
            );
            return Ok(Outcome::Rejected(Rejection::Cooldown { retry_after }));
        }

        let (origin, source_text) = match classify(message) {
            Dispatch::Audio(attachment) => {
                info!(mime_type = %attachment.mime_type, "processing voice report");
                self.receive_audio(message, attachment, sender_name).await?
            }
            Dispatch::Text(content) => {
                let chars = content.chars().count();
                if chars < self.settings.min_text_chars {
                    info!(chars, "text report too short");
                    self.reply(message, replies::TEXT_TOO_SHORT).await?;
                    return Ok(Outcome::Rejected(Rejection::TooShort { chars }));
                }
                info!(chars, "processing text report");
                self.reply(message, &replies::text_received(sender_name)).await?;
                (ReportOrigin::Text, content.to_string())
            }
            Dispatch::Help => {
                self.reply(message, replies::HELP).await?;
                return Ok(Outcome::HelpSent);
            }
            Dispatch::Ignore => {
                debug!(kind = ?message.kind, "message is not a report, ignoring");
                return Ok(Outcome::Ignored);
            }
        };

        let fields = self.extract(&source_text).await;
        let report = Report {
            id: Uuid::new_v4(),
            contractor_name: sender_name.to_string(),
            contractor_id: sender_id.to_string(),
            project_label: fields.project_label,
            project_number: fields.project_number,
            work_permit_number: fields.work_permit_number,
            submitted_at: self.ports.clock.now(),
            origin,
            source_text,
            detail: fields.detail,
        };

        self.ports
            .reports
            .insert_report(&report)
            .await
            .map_err(PipelineError::Persistence)?;
        self.limiter
            .arm(sender_id, report.submitted_at, self.settings.cooldown);
        info!(report_id = %report.id, kind = %report.kind(), "report stored");

        // The report is accepted from here on; a lost summary is not a failure.
        if let Err(err) = self.reply(message, &replies::summary(&report)).await {
            warn!(report_id = %report.id, error = %err, "report stored but the summary was not delivered");
        }
        Ok(Outcome::Acknowledged(report))
    }

    /// Downloads, stores and transcribes a voice note.
    async fn receive_audio(
        &self,
        message: &InboundMessage,
        attachment: &Attachment,
        sender_name: &str,
    ) -> Result<(ReportOrigin, String), PipelineError> {
        self.reply(message, &replies::audio_received(sender_name)).await?;

        let data = self
            .ports
            .transport
            .download_attachment(attachment)
            .await
            .map_err(PipelineError::AttachmentDownload)?;
        if data.is_empty() {
            return Err(PipelineError::AttachmentDownload(PortError::Unexpected(
                "attachment has no content".to_string(),
            )));
        }

        let file_name = audio_file_name(
            message.sender_handle(),
            self.ports.clock.now(),
            &attachment.mime_type,
        );
        let audio_ref = self
            .ports
            .media
            .store(&file_name, &data)
            .await
            .map_err(PipelineError::MediaStorage)?;
        debug!(audio_ref = %audio_ref, bytes = data.len(), "audio stored");

        let transcript = self
            .ports
            .transcriber
            .transcribe_audio(&data, &file_name)
            .await
            .map_err(PipelineError::Transcription)?;
        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(PipelineError::Transcription(PortError::Unexpected(
                "transcription is empty".to_string(),
            )));
        }
        debug!(transcript = %transcript, "audio transcribed");

        Ok((ReportOrigin::Audio { audio_ref }, transcript))
    }

    /// Runs the extraction contract. A failed extraction degrades to error
    /// placeholders so the report and its source text are still stored.
    async fn extract(&self, source_text: &str) -> ExtractedFields {
        match self.ports.extractor.extract(source_text).await {
            Ok(raw) => ExtractedFields::from_raw(&raw),
            Err(err) => {
                warn!(error = %err, "extraction failed, storing report with error placeholders");
                ExtractedFields::failed()
            }
        }
    }

    async fn reply_group_id(&self, message: &InboundMessage) -> Result<(), PipelineError> {
        if message.is_group {
            info!("answering group id lookup");
            self.reply(message, &replies::group_id(&message.chat_id)).await
        } else {
            self.reply(message, replies::GROUP_ID_OUTSIDE_GROUP).await
        }
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), PipelineError> {
        self.ports
            .transport
            .send_message(&message.chat_id, text)
            .await
            .map_err(PipelineError::Reply)
    }
}
