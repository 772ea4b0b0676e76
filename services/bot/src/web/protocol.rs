//! services/bot/src/web/protocol.rs
//!
//! Defines the webhook payload the chat bridge posts for every inbound message.

use serde::Deserialize;
use site_report_core::domain::{Attachment, InboundMessage, MessageKind};
use utoipa::ToSchema;

//=========================================================================================
// Messages Sent FROM the Bridge TO the Server
//=========================================================================================

/// The message type as labelled by the chat bridge.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BridgeMessageKind {
    /// Push-to-talk voice note.
    Ptt,
    Voice,
    /// An audio file sent as media.
    Audio,
    #[default]
    Chat,
    #[serde(other)]
    Other,
}

/// Media attached to a message, downloadable from the bridge.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct BridgeAttachment {
    pub mime_type: String,
    /// Absolute URL or path relative to the bridge base URL.
    pub url: String,
}

/// One inbound chat message.
#[derive(Deserialize, Debug, Clone, ToSchema)]
pub struct BridgeMessage {
    pub message_id: String,
    /// The conversation the message was posted in.
    pub chat_id: String,
    #[serde(default)]
    pub is_group: bool,
    /// The author; in group chats this differs from `chat_id`.
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: BridgeMessageKind,
    #[serde(default)]
    pub attachment: Option<BridgeAttachment>,
}

impl From<BridgeMessage> for InboundMessage {
    fn from(msg: BridgeMessage) -> Self {
        let kind = match msg.kind {
            BridgeMessageKind::Ptt | BridgeMessageKind::Voice => MessageKind::Voice,
            BridgeMessageKind::Chat => MessageKind::Text,
            BridgeMessageKind::Audio | BridgeMessageKind::Other => MessageKind::Media,
        };
        InboundMessage {
            message_id: msg.message_id,
            chat_id: msg.chat_id,
            is_group: msg.is_group,
            sender_id: msg.sender_id,
            sender_name: msg.sender_name,
            body: msg.body,
            kind,
            attachment: msg.attachment.map(|a| Attachment {
                mime_type: a.mime_type,
                locator: a.url,
            }),
        }
    }
}
