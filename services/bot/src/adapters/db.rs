//! services/bot/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ReportRepository` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use site_report_core::domain::{Report, ReportDetail, ReportKind, ReportOrigin, ReportQuery};
use site_report_core::ports::{PortError, PortResult, ReportRepository};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `ReportRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const REPORT_COLUMNS: &str = "id, contractor_name, contractor_id, project_label, project_number, \
     work_permit_number, submitted_at, report_kind, audio_ref, source_text, progress, issues, \
     materials, personnel, weather, safety, next_steps";

#[derive(FromRow)]
struct ReportRecord {
    id: Uuid,
    contractor_name: String,
    contractor_id: String,
    project_label: String,
    project_number: String,
    work_permit_number: String,
    submitted_at: DateTime<Utc>,
    report_kind: String,
    audio_ref: Option<String>,
    source_text: String,
    progress: String,
    issues: String,
    materials: String,
    personnel: String,
    weather: String,
    safety: String,
    next_steps: String,
}

impl ReportRecord {
    fn to_domain(self) -> PortResult<Report> {
        let kind = self
            .report_kind
            .parse::<ReportKind>()
            .map_err(|e| PortError::Unexpected(format!("Report {}: {}", self.id, e)))?;
        let origin = match (kind, self.audio_ref) {
            (ReportKind::Audio, Some(audio_ref)) => ReportOrigin::Audio { audio_ref },
            (ReportKind::Text, None) => ReportOrigin::Text,
            (kind, _) => {
                return Err(PortError::Unexpected(format!(
                    "Report {} has kind '{}' with an inconsistent audio reference",
                    self.id, kind
                )))
            }
        };

        Ok(Report {
            id: self.id,
            contractor_name: self.contractor_name,
            contractor_id: self.contractor_id,
            project_label: self.project_label,
            project_number: self.project_number,
            work_permit_number: self.work_permit_number,
            submitted_at: self.submitted_at,
            origin,
            source_text: self.source_text,
            detail: ReportDetail {
                progress: self.progress,
                issues: self.issues,
                materials: self.materials,
                personnel: self.personnel,
                weather: self.weather,
                safety: self.safety,
                next_steps: self.next_steps,
            },
        })
    }
}

//=========================================================================================
// `ReportRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReportRepository for DbAdapter {
    async fn insert_report(&self, report: &Report) -> PortResult<()> {
        let sql = format!(
            "INSERT INTO reports ({REPORT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        );
        let d = &report.detail;
        sqlx::query(&sql)
            .bind(report.id)
            .bind(&report.contractor_name)
            .bind(&report.contractor_id)
            .bind(&report.project_label)
            .bind(&report.project_number)
            .bind(&report.work_permit_number)
            .bind(report.submitted_at)
            .bind(report.kind().as_str())
            .bind(report.audio_ref())
            .bind(&report.source_text)
            .bind(&d.progress)
            .bind(&d.issues)
            .bind(&d.materials)
            .bind(&d.personnel)
            .bind(&d.weather)
            .bind(&d.safety)
            .bind(&d.next_steps)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn list_reports(&self, query: &ReportQuery) -> PortResult<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports \
             WHERE ($1::TEXT IS NULL OR contractor_id = $1) \
               AND ($2::TEXT IS NULL OR report_kind = $2) \
             ORDER BY submitted_at DESC \
             LIMIT $3"
        );
        let records = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(query.contractor_id.as_deref())
            .bind(query.kind.map(|k| k.as_str()))
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        records.into_iter().map(ReportRecord::to_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(report_kind: &str, audio_ref: Option<&str>) -> ReportRecord {
        ReportRecord {
            id: Uuid::new_v4(),
            contractor_name: "Juan".to_string(),
            contractor_id: "5215512345678@c.us".to_string(),
            project_label: "Proyecto General".to_string(),
            project_number: "730-0014".to_string(),
            work_permit_number: "PT-123".to_string(),
            submitted_at: Utc::now(),
            report_kind: report_kind.to_string(),
            audio_ref: audio_ref.map(str::to_string),
            source_text: "hoy avanzamos".to_string(),
            progress: "30%".to_string(),
            issues: "Ninguno reportado".to_string(),
            materials: "cemento".to_string(),
            personnel: "8".to_string(),
            weather: "soleado".to_string(),
            safety: "Sin incidentes reportados".to_string(),
            next_steps: "colado".to_string(),
        }
    }

    #[test]
    fn audio_rows_carry_their_reference() {
        let report = record("audio", Some("audios/a.ogg")).to_domain().unwrap();
        assert_eq!(report.kind(), ReportKind::Audio);
        assert_eq!(report.audio_ref(), Some("audios/a.ogg"));
        assert_eq!(report.detail.materials, "cemento");

        let text = record("text", None).to_domain().unwrap();
        assert_eq!(text.origin, ReportOrigin::Text);
    }

    #[test]
    fn inconsistent_rows_are_rejected() {
        assert!(record("audio", None).to_domain().is_err());
        assert!(record("text", Some("audios/a.ogg")).to_domain().is_err());
        assert!(record("video", None).to_domain().is_err());
    }
}
