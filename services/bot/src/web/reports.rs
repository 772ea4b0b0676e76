//! services/bot/src/web/reports.rs
//!
//! Read-only HTML views over the stored reports.

use crate::web::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use site_report_core::contract::{is_placeholder, DEFAULT_PROJECT_LABEL};
use site_report_core::domain::{Report, ReportKind, ReportQuery};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 20px; background-color: #f4f4f4; color: #333; }
    h1 { color: #0056b3; border-bottom: 2px solid #0056b3; padding-bottom: 10px; }
    .reporte { background-color: #fff; border: 1px solid #ddd; padding: 20px; margin-bottom: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
    .reporte h2 { margin-top: 0; color: #004085; font-size: 1.1em; }
    .meta-info { font-size: 0.9em; color: #666; margin-bottom: 15px; border-bottom: 1px dashed #eee; padding-bottom: 10px; }
    .meta-info span { margin-right: 15px; }
    .etiqueta { font-weight: bold; color: #333; }
    .seccion { margin: 12px 0; line-height: 1.6; }
    .tipo-reporte { display: inline-block; padding: 4px 10px; border-radius: 12px; font-size: 0.8em; font-weight: bold; margin-left: 10px; vertical-align: middle; }
    .tipo-audio { background-color: #d1ecf1; color: #0c5460; border: 1px solid #bee5eb; }
    .tipo-text { background-color: #d4edda; color: #155724; border: 1px solid #c3e6cb; }
    .transcripcion { background-color: #f8f9fa; border-left: 3px solid #007bff; padding: 10px; margin-top: 10px; font-style: italic; color: #555; white-space: pre-wrap; }
    .no-especificado { color: #888; font-style: italic; }
"#;

/// Query parameters accepted by the listing.
#[derive(Deserialize, Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportsParams {
    /// `audio` or `text`.
    pub kind: Option<String>,
    /// Full sender id, e.g. `5215512345678@c.us`.
    pub contractor: Option<String>,
    /// 1 to 100, defaults to 100.
    pub limit: Option<u32>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Static status page.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is running", content_type = "text/html"))
)]
pub async fn index_handler() -> Html<&'static str> {
    Html(r#"Bot de reportes funcionando. Accede a <a href="/reports">/reports</a> para ver los datos."#)
}

/// Newest reports first, rendered as HTML.
#[utoipa::path(
    get,
    path = "/reports",
    params(ReportsParams),
    responses(
        (status = 200, description = "Rendered report listing", content_type = "text/html"),
        (status = 400, description = "Unknown report kind"),
        (status = 500, description = "Reports could not be loaded")
    )
)]
pub async fn list_reports_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<ReportsParams>,
) -> Result<Html<String>, (StatusCode, String)> {
    let kind = params
        .kind
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .map(str::parse::<ReportKind>)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let contractor = params.contractor.filter(|c| !c.trim().is_empty());
    let query = ReportQuery::new(contractor, kind, params.limit);

    match app_state.reports.list_reports(&query).await {
        Ok(reports) => Ok(Html(render_reports(&reports))),
        Err(e) => {
            error!("Failed to load reports: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al cargar los reportes".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Rendering
//=========================================================================================

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Placeholders and blanks are de-emphasised.
fn display(value: &str) -> String {
    if value.trim().is_empty() {
        r#"<span class="no-especificado">No disponible</span>"#.to_string()
    } else if is_placeholder(value) {
        format!(r#"<span class="no-especificado">{}</span>"#, escape_html(value))
    } else {
        escape_html(value)
    }
}

fn kind_label(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Audio => "Audio",
        ReportKind::Text => "Texto",
    }
}

fn render_report(html: &mut String, report: &Report) {
    let d = &report.detail;
    let contact = report.contractor_id.split('@').next().unwrap_or_default();
    let label = if report.project_label != DEFAULT_PROJECT_LABEL {
        format!(" ({})", escape_html(&report.project_label))
    } else {
        String::new()
    };
    let source_heading = match report.kind() {
        ReportKind::Audio => "Transcripción del Audio:",
        ReportKind::Text => "Texto del Reporte:",
    };

    let _ = write!(
        html,
        r#"
  <div class="reporte">
    <h2>Reporte de: {name} <span class="tipo-reporte tipo-{kind}">{kind_label}</span></h2>
    <div class="meta-info">
      <span><span class="etiqueta">Fecha:</span> {date}</span>
      <span><span class="etiqueta">Contacto:</span> {contact}</span>
      <span><span class="etiqueta">Proyecto:</span> {project}{label}</span>
      <span><span class="etiqueta">Permiso Trabajo:</span> {permit}</span>
    </div>
    <div class="seccion"><span class="etiqueta">Avance:</span> {progress}</div>
    <div class="seccion"><span class="etiqueta">Problemas:</span> {issues}</div>
    <div class="seccion"><span class="etiqueta">Materiales:</span> {materials}</div>
    <div class="seccion"><span class="etiqueta">Personal:</span> {personnel}</div>
    <div class="seccion"><span class="etiqueta">Clima:</span> {weather}</div>
    <div class="seccion"><span class="etiqueta">Seguridad:</span> {safety}</div>
    <div class="seccion"><span class="etiqueta">Siguientes Pasos:</span> {next_steps}</div>
    <div class="seccion">
      <span class="etiqueta">{source_heading}</span>
      <div class="transcripcion">{source}</div>
    </div>
  </div>
"#,
        name = display(&report.contractor_name),
        kind = report.kind(),
        kind_label = kind_label(report.kind()),
        date = report.submitted_at.format("%d/%m/%Y %H:%M UTC"),
        contact = display(contact),
        project = display(&report.project_number),
        permit = display(&report.work_permit_number),
        progress = display(&d.progress),
        issues = display(&d.issues),
        materials = display(&d.materials),
        personnel = display(&d.personnel),
        weather = display(&d.weather),
        safety = display(&d.safety),
        next_steps = display(&d.next_steps),
        source = escape_html(&report.source_text),
    );
}

/// Renders the full listing page.
pub fn render_reports(reports: &[Report]) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Reportes de Construcción</title>
  <style>{STYLE}</style>
</head>
<body>
  <h1>Reportes de Construcción</h1>
"#
    );

    if reports.is_empty() {
        html.push_str("  <p>No hay reportes para mostrar.</p>\n");
    } else {
        for report in reports {
            render_report(&mut html, report);
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}
