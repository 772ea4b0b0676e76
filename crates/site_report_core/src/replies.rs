//! User-visible texts sent back to the chat.

use crate::domain::{Report, ReportKind};

/// Longest preview of a free-text field in the summary reply, in characters.
pub const PREVIEW_CHARS: usize = 300;

pub const HELP: &str = "*Instrucciones para enviar tu reporte diario:*

*IMPORTANTE:* Menciona siempre el *Número de Proyecto* (ej: 730-0014) y el *Número de Permiso de Trabajo* (si aplica) al inicio de tu reporte.

📢 *OPCIÓN 1: Reporte por Audio* 🎧
1️⃣ Graba un mensaje de audio *en español* con tu reporte.
2️⃣ Comienza diciendo el Número de Proyecto y Permiso.
3️⃣ Luego, incluye información sobre:
    - Avance del día
    - Problemas encontrados
    - Materiales utilizados o faltantes
    - Personal trabajando
    - Clima (si afecta el trabajo)
    - Incidentes de seguridad
    - Plan para mañana
4️⃣ Envía el audio y espera la confirmación.

✍️ *OPCIÓN 2: Reporte por Texto* 📄
1️⃣ Escribe `!reporte` seguido de tu informe completo *en español*.
2️⃣ Ejemplo: `!reporte Proyecto 730-0014, Permiso PT-123. Hoy avanzamos un 30% en la cimentación. Tuvimos 8 trabajadores...`
3️⃣ Incluye toda la información solicitada.
4️⃣ Envía el mensaje y espera la confirmación.";

pub const TEXT_TOO_SHORT: &str = "El reporte de texto parece muy corto. Por favor, incluye detalles sobre: Número de proyecto, Permiso de trabajo (si aplica), Avance, Problemas, Materiales, Personal, Clima, Seguridad y Siguientes pasos.";

pub const GROUP_ID_OUTSIDE_GROUP: &str =
    "Este comando solo funciona en grupos. Por favor, úsalo dentro del grupo que quieres configurar.";

pub fn group_id(chat_id: &str) -> String {
    format!("ID de este grupo: {chat_id}\n\nCópialo y configúralo como TARGET_CHAT_ID.")
}

pub fn audio_received(name: &str) -> String {
    format!("Recibimos tu audio, {name}. Estamos procesando tu reporte... 🎧")
}

pub fn text_received(name: &str) -> String {
    format!("Recibimos tu reporte en texto, {name}. Procesando... ✍️")
}

pub fn transcription_failed(name: &str) -> String {
    format!("❌ Lo siento, {name}. No pudimos transcribir tu audio. Por favor intenta grabarlo de nuevo o envía tu reporte por texto con `!reporte`.")
}

pub fn generic_failure(name: &str) -> String {
    format!("❌ Lo siento, {name}. Hubo un error procesando tu reporte. Por favor verifica la información e intenta de nuevo. Si el problema persiste, contacta al administrador.")
}

fn kind_label(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Audio => "audio",
        ReportKind::Text => "texto",
    }
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

/// The confirmation sent once a report is stored.
pub fn summary(report: &Report) -> String {
    let d = &report.detail;
    let p = |s: &str| preview(s, PREVIEW_CHARS);
    format!(
        "✅ *Reporte ({kind}) procesado exitosamente:*

🆔 *Proyecto:* {project}
📄 *Permiso:* {permit}
---
📊 *Avance*: {progress}
🚧 *Problemas*: {issues}
🧰 *Materiales*: {materials}
👷 *Personal*: {personnel}
🌦️ *Clima*: {weather}
🦺 *Seguridad*: {safety}
📋 *Siguientes pasos*: {next_steps}",
        kind = kind_label(report.kind()),
        project = report.project_number,
        permit = report.work_permit_number,
        progress = p(&d.progress),
        issues = p(&d.issues),
        materials = p(&d.materials),
        personnel = p(&d.personnel),
        weather = p(&d.weather),
        safety = p(&d.safety),
        next_steps = p(&d.next_steps),
    )
}
