//! crates/site_report_core/src/contract.rs
//!
//! The extraction contract: the instructions sent to the language model, the
//! raw shape it is asked to answer with, and the normalization of that answer
//! into display-ready fields.

use serde::Deserialize;
use serde_json::Value;

use crate::coercion::optional_display_text;
use crate::domain::ReportDetail;

//=========================================================================================
// Instructions
//=========================================================================================

pub const SYSTEM_INSTRUCTIONS: &str = "Eres un asistente IA experto en procesar reportes de construcción en español. Tu tarea es extraer información específica y estructurarla ESTRICTAMENTE en el formato JSON solicitado, sin añadir nada más.";

const USER_INPUT_TEMPLATE: &str = r#"Analiza el siguiente reporte de construcción **en español**. Extrae la información clave y preséntala **EXCLUSIVAMENTE** en el siguiente formato JSON.

**Reporte Original:**
{report}

**Formato JSON Requerido (campos obligatorios, usa "" si no hay info):**
{
  "numeroProyecto": "Número de proyecto (formato XXX-YYYY, ej: 730-0014, 520-0005). Si no se menciona, pon ''.",
  "numeroPermisoTrabajo": "Número de permiso de trabajo (ej: PT-123, OT-456). Si no se menciona, pon ''.",
  "nombreProyecto": "Nombre o descripción corta del proyecto si se menciona explícitamente, además del número. Si no, pon ''.",
  "reporteDetallado": {
    "avance": "Resumen del progreso y actividades realizadas hoy.",
    "problemas": "Problemas, obstáculos o retrasos encontrados.",
    "materiales": "Materiales usados, recibidos o necesitados.",
    "personal": "Número y/o tipo de personal presente.",
    "clima": "Condiciones climáticas y su impacto, si hubo.",
    "seguridad": "Incidentes, observaciones o medidas de seguridad.",
    "siguientesPasos": "Tareas planeadas para el próximo día o período."
  }
}

**Instrucciones IMPORTANTES:**
1. Devuelve **SOLAMENTE** el objeto JSON, sin texto introductorio ni explicaciones adicionales.
2. Mantén exactamente los nombres de los campos como se muestran.
3. Todos los valores deben ser strings planos, sin objetos ni listas anidadas.
4. Si no encuentras información para un campo, déjalo como un string vacío "".
5. Presta especial atención a extraer 'numeroProyecto' y 'numeroPermisoTrabajo' si están presentes."#;

/// Renders the user message for one report.
pub fn render_instructions(source_text: &str) -> String {
    USER_INPUT_TEMPLATE.replace("{report}", source_text)
}

//=========================================================================================
// Raw provider answer
//=========================================================================================

/// The provider's answer, before any trust is placed in it. Every field may
/// be missing or have the wrong JSON type; coercion sorts that out.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawExtraction {
    #[serde(rename = "numeroProyecto")]
    pub project_number: Option<Value>,
    #[serde(rename = "numeroPermisoTrabajo")]
    pub work_permit_number: Option<Value>,
    #[serde(rename = "nombreProyecto")]
    pub project_label: Option<Value>,
    #[serde(rename = "reporteDetallado")]
    pub detail: Option<RawDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawDetail {
    #[serde(rename = "avance")]
    pub progress: Option<Value>,
    #[serde(rename = "problemas")]
    pub issues: Option<Value>,
    #[serde(rename = "materiales")]
    pub materials: Option<Value>,
    #[serde(rename = "personal")]
    pub personnel: Option<Value>,
    #[serde(rename = "clima")]
    pub weather: Option<Value>,
    #[serde(rename = "seguridad")]
    pub safety: Option<Value>,
    #[serde(rename = "siguientesPasos")]
    pub next_steps: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum MalformedExtraction {
    #[error("extraction response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("extraction response is not a JSON object")]
    NotAnObject,
}

impl RawExtraction {
    /// Parses the provider's message content. Anything that is not a JSON
    /// object of the expected outline is rejected as a whole.
    pub fn parse(content: &str) -> Result<Self, MalformedExtraction> {
        match serde_json::from_str::<Value>(content.trim())? {
            object @ Value::Object(_) => Ok(serde_json::from_value(object)?),
            _ => Err(MalformedExtraction::NotAnObject),
        }
    }
}

//=========================================================================================
// Normalized fields
//=========================================================================================

pub const NOT_SPECIFIED: &str = "No especificado";
pub const NOT_REPORTED: &str = "No reportado";
pub const NONE_REPORTED: &str = "Ninguno reportado";
pub const NO_INCIDENTS_REPORTED: &str = "Sin incidentes reportados";
pub const DEFAULT_PROJECT_LABEL: &str = "Proyecto General";
pub const PROCESSING_ERROR: &str = "Error de procesamiento";
pub const FIELD_ERROR: &str = "Error";

/// Whether a value is one of the placeholders written in place of missing data.
pub fn is_placeholder(value: &str) -> bool {
    matches!(
        value,
        NOT_SPECIFIED | NOT_REPORTED | NONE_REPORTED | NO_INCIDENTS_REPORTED
    )
}

/// Extraction output after coercion; every field is a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub project_number: String,
    pub work_permit_number: String,
    pub project_label: String,
    pub detail: ReportDetail,
}

fn or_placeholder(value: Option<&Value>, placeholder: &str) -> String {
    let text = optional_display_text(value);
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text
    }
}

impl ExtractedFields {
    pub fn from_raw(raw: &RawExtraction) -> Self {
        let detail = raw.detail.clone().unwrap_or_default();
        Self {
            project_number: or_placeholder(raw.project_number.as_ref(), NOT_SPECIFIED),
            work_permit_number: or_placeholder(raw.work_permit_number.as_ref(), NOT_SPECIFIED),
            project_label: or_placeholder(raw.project_label.as_ref(), DEFAULT_PROJECT_LABEL),
            detail: ReportDetail {
                progress: or_placeholder(detail.progress.as_ref(), NOT_REPORTED),
                issues: or_placeholder(detail.issues.as_ref(), NONE_REPORTED),
                materials: or_placeholder(detail.materials.as_ref(), NOT_REPORTED),
                personnel: or_placeholder(detail.personnel.as_ref(), NOT_REPORTED),
                weather: or_placeholder(detail.weather.as_ref(), NOT_REPORTED),
                safety: or_placeholder(detail.safety.as_ref(), NO_INCIDENTS_REPORTED),
                next_steps: or_placeholder(detail.next_steps.as_ref(), NOT_SPECIFIED),
            },
        }
    }

    /// Stand-in used when the provider could not be reached or answered garbage,
    /// so the report and its source text are still kept.
    pub fn failed() -> Self {
        let field = || FIELD_ERROR.to_string();
        Self {
            project_number: PROCESSING_ERROR.to_string(),
            work_permit_number: PROCESSING_ERROR.to_string(),
            project_label: PROCESSING_ERROR.to_string(),
            detail: ReportDetail {
                progress: field(),
                issues: field(),
                materials: field(),
                personnel: field(),
                weather: field(),
                safety: field(),
                next_steps: field(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_embed_the_report() {
        let rendered = render_instructions("Proyecto 730-0014, avance 30%");
        assert!(rendered.contains("Proyecto 730-0014, avance 30%"));
        assert!(rendered.contains("\"reporteDetallado\""));
        assert!(!rendered.contains("{report}"));
    }

    #[test]
    fn well_formed_answer_is_normalized() {
        let raw = RawExtraction::parse(
            r#"{"numeroProyecto":"730-0014","numeroPermisoTrabajo":"PT-123","reporteDetallado":{"avance":"30%","problemas":"","materiales":"","personal":"","clima":"","seguridad":"","siguientesPasos":""}}"#,
        )
        .unwrap();
        let fields = ExtractedFields::from_raw(&raw);

        assert_eq!(fields.project_number, "730-0014");
        assert_eq!(fields.work_permit_number, "PT-123");
        assert_eq!(fields.project_label, DEFAULT_PROJECT_LABEL);
        assert_eq!(fields.detail.progress, "30%");
        assert_eq!(fields.detail.issues, NONE_REPORTED);
        assert_eq!(fields.detail.materials, NOT_REPORTED);
        assert_eq!(fields.detail.personnel, NOT_REPORTED);
        assert_eq!(fields.detail.weather, NOT_REPORTED);
        assert_eq!(fields.detail.safety, NO_INCIDENTS_REPORTED);
        assert_eq!(fields.detail.next_steps, NOT_SPECIFIED);
    }

    #[test]
    fn contract_violations_are_coerced() {
        let raw = RawExtraction::parse(
            r#"{"numeroProyecto":730,"reporteDetallado":{"personal":{"albaniles":5,"ayudantes":2},"materiales":["cemento","varilla"]}}"#,
        )
        .unwrap();
        let fields = ExtractedFields::from_raw(&raw);

        assert_eq!(fields.project_number, "730");
        assert_eq!(fields.work_permit_number, NOT_SPECIFIED);
        assert_eq!(fields.detail.personnel, "5, 2");
        assert_eq!(fields.detail.materials, "cemento, varilla");
        assert_eq!(fields.detail.progress, NOT_REPORTED);
    }

    #[test]
    fn empty_object_yields_all_placeholders() {
        let fields = ExtractedFields::from_raw(&RawExtraction::parse("{}").unwrap());
        assert_eq!(fields.project_number, NOT_SPECIFIED);
        assert!(is_placeholder(&fields.detail.safety));
    }

    #[test]
    fn non_object_answers_are_rejected() {
        assert!(RawExtraction::parse("Claro, aquí está el reporte").is_err());
        assert!(RawExtraction::parse("[1, 2]").is_err());
        assert!(RawExtraction::parse(r#"{"reporteDetallado":"todo bien"}"#).is_err());
    }

    #[test]
    fn failed_fields_mark_every_value() {
        let fields = ExtractedFields::failed();
        assert_eq!(fields.project_number, PROCESSING_ERROR);
        assert_eq!(fields.detail.progress, FIELD_ERROR);
        assert_eq!(fields.detail.next_steps, FIELD_ERROR);
    }
}
