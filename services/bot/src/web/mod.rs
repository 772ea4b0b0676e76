pub mod intake_task;
pub mod protocol;
pub mod reports;
pub mod rest;
pub mod signature;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use intake_task::run_intake;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the complete HTTP surface: webhook, report views and API docs.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let app_router = Router::new()
        .route("/", get(reports::index_handler))
        .route("/reports", get(reports::list_reports_handler))
        .route("/webhook/messages", post(rest::receive_message_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(app_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
