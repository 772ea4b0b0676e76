//! services/bot/src/web/state.rs
//!
//! Defines the application's shared state.

use site_report_core::domain::InboundMessage;
use site_report_core::ports::ReportRepository;
use std::sync::Arc;
use tokio::sync::mpsc;

//=========================================================================================
// AppState (Shared Across All Handlers)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<dyn ReportRepository>,
    /// Feeds the intake worker; the webhook never runs the pipeline inline.
    pub intake: mpsc::Sender<InboundMessage>,
    /// Key for the webhook body signatures.
    pub webhook_secret: String,
}
