//! services/bot/src/web/rest.rs
//!
//! Contains the Axum handler for the bridge webhook and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{BridgeAttachment, BridgeMessage, BridgeMessageKind},
    signature::{verify_signature, SIGNATURE_HEADER},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use site_report_core::domain::InboundMessage;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        receive_message_handler,
        crate::web::reports::index_handler,
        crate::web::reports::list_reports_handler,
    ),
    components(
        schemas(BridgeMessage, BridgeAttachment, BridgeMessageKind)
    ),
    tags(
        (name = "Site Report Bot", description = "Chat intake webhook and read-only report listing.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Webhook Handler
//=========================================================================================

/// Receive one inbound chat message from the bridge.
///
/// The body must carry the bridge's HMAC-SHA256 signature. The message is
/// queued for the intake pipeline and acknowledged right away; replies travel
/// back through the bridge's outbound API.
#[utoipa::path(
    post,
    path = "/webhook/messages",
    request_body = BridgeMessage,
    params(
        ("X-Signature-256" = String, Header, description = "`sha256=` followed by the hex HMAC-SHA256 of the raw body")
    ),
    responses(
        (status = 202, description = "Message queued for processing"),
        (status = 401, description = "Signature missing or invalid"),
        (status = 503, description = "Intake queue full or shutting down; retry later")
    )
)]
pub async fn receive_message_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, String)> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if !verify_signature(app_state.webhook_secret.as_bytes(), signature, &body) {
        warn!(signed = signature.is_some(), "rejecting webhook with invalid signature");
        return Err((
            StatusCode::UNAUTHORIZED,
            "Invalid webhook signature".to_string(),
        ));
    }

    let Json(payload) = Json::<BridgeMessage>::from_bytes(&body)
        .map_err(|rejection| (rejection.status(), rejection.body_text()))?;
    debug!(chat = %payload.chat_id, message_id = %payload.message_id, "webhook message received");

    match app_state.intake.try_send(InboundMessage::from(payload)) {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(TrySendError::Full(msg)) => {
            warn!(message_id = %msg.message_id, "intake queue full, rejecting message");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                "Intake queue is full".to_string(),
            ))
        }
        Err(TrySendError::Closed(_)) => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "Service is shutting down".to_string(),
        )),
    }
}
