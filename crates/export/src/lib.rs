//! Markdown rendering of a single daily log entry.
//!
//! The writer is a pure function over anything implementing [`LogRecord`],
//! so the desktop client can export straight from API structs while tests
//! and ad-hoc tooling can feed plain JSON values.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Uniform read access to one log entry. Every getter is optional so the
/// renderer can skip absent fields instead of failing on them.
pub trait LogRecord {
    fn nombre_tarea(&self) -> Option<&str>;
    fn descripcion(&self) -> Option<&str>;
    fn horas(&self) -> Option<f64>;
    fn tecnologias_utilizadas(&self) -> Option<&str>;
    fn fecha_creacion(&self) -> Option<DateTime<Utc>>;
    /// Renderable reference for image slot 1..=3, absolute URL preferred.
    fn imagen(&self, index: usize) -> Option<&str>;
    fn link_publicacion_linkedin(&self) -> Option<&str>;
    fn link_ia_principal(&self) -> Option<&str>;
    fn link_ia_secundaria(&self) -> Option<&str>;
    fn link_ia_terciaria(&self) -> Option<&str>;
    fn link_respositorio(&self) -> Option<&str>;
    fn commit_principal(&self) -> Option<&str>;
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

impl LogRecord for protocol::DailyLog {
    fn nombre_tarea(&self) -> Option<&str> {
        non_empty(Some(&self.nombre_tarea))
    }

    fn descripcion(&self) -> Option<&str> {
        non_empty(self.descripcion.as_deref())
    }

    fn horas(&self) -> Option<f64> {
        Some(self.horas)
    }

    fn tecnologias_utilizadas(&self) -> Option<&str> {
        non_empty(Some(&self.tecnologias_utilizadas))
    }

    fn fecha_creacion(&self) -> Option<DateTime<Utc>> {
        Some(self.fecha_creacion)
    }

    fn imagen(&self, index: usize) -> Option<&str> {
        let path = match index {
            1 => self.imagen_1.as_deref(),
            2 => self.imagen_2.as_deref(),
            3 => self.imagen_3.as_deref(),
            _ => None,
        };
        non_empty(self.imagen_url(index).or(path))
    }

    fn link_publicacion_linkedin(&self) -> Option<&str> {
        non_empty(self.link_publicacion_linkedin.as_deref())
    }

    fn link_ia_principal(&self) -> Option<&str> {
        non_empty(self.link_ia_principal.as_deref())
    }

    fn link_ia_secundaria(&self) -> Option<&str> {
        non_empty(self.link_ia_secundaria.as_deref())
    }

    fn link_ia_terciaria(&self) -> Option<&str> {
        non_empty(self.link_ia_terciaria.as_deref())
    }

    fn link_respositorio(&self) -> Option<&str> {
        non_empty(self.link_respositorio.as_deref())
    }

    fn commit_principal(&self) -> Option<&str> {
        non_empty(self.commit_principal.as_deref())
    }
}

/// JSON adapter so raw API payloads export without an intermediate struct.
impl LogRecord for serde_json::Value {
    fn nombre_tarea(&self) -> Option<&str> {
        non_empty(self["nombre_tarea"].as_str())
    }

    fn descripcion(&self) -> Option<&str> {
        non_empty(self["descripcion"].as_str())
    }

    fn horas(&self) -> Option<f64> {
        self["horas"].as_f64()
    }

    fn tecnologias_utilizadas(&self) -> Option<&str> {
        non_empty(self["tecnologias_utilizadas"].as_str())
    }

    fn fecha_creacion(&self) -> Option<DateTime<Utc>> {
        self["fecha_creacion"]
            .as_str()
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
    }

    fn imagen(&self, index: usize) -> Option<&str> {
        if !(1..=3).contains(&index) {
            return None;
        }
        non_empty(self[format!("imagen_{index}_url")].as_str())
            .or_else(|| non_empty(self[format!("imagen_{index}")].as_str()))
    }

    fn link_publicacion_linkedin(&self) -> Option<&str> {
        non_empty(self["link_publicacion_linkedin"].as_str())
    }

    fn link_ia_principal(&self) -> Option<&str> {
        non_empty(self["link_ia_principal"].as_str())
    }

    fn link_ia_secundaria(&self) -> Option<&str> {
        non_empty(self["link_ia_secundaria"].as_str())
    }

    fn link_ia_terciaria(&self) -> Option<&str> {
        non_empty(self["link_ia_terciaria"].as_str())
    }

    fn link_respositorio(&self) -> Option<&str> {
        non_empty(self["link_respositorio"].as_str())
    }

    fn commit_principal(&self) -> Option<&str> {
        non_empty(self["commit_principal"].as_str())
    }
}

const UNTITLED: &str = "Tarea sin nombre";

fn sanitize_for_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

/// Renders the record to Markdown and writes it into `dest_dir`, creating
/// the directory if needed. The filename is `<yyyy-mm-dd>_<task>.md`.
/// Empty optional fields produce no output at all, not placeholder lines.
pub fn export_markdown<R: LogRecord>(record: &R, dest_dir: &Path) -> Result<PathBuf, ExportError> {
    let fecha = record.fecha_creacion().unwrap_or_else(Utc::now);
    let fecha_texto = fecha.format("%Y-%m-%d").to_string();
    let nombre = record.nombre_tarea().unwrap_or(UNTITLED);

    let filename = format!("{fecha_texto}_{}.md", sanitize_for_filename(nombre));
    std::fs::create_dir_all(dest_dir).map_err(|source| ExportError::CreateDir {
        path: dest_dir.to_path_buf(),
        source,
    })?;
    let full_path = dest_dir.join(filename);

    let mut contenido = format!("# {nombre}\n\n");
    let _ = writeln!(contenido, "**Fecha:** {fecha_texto}  ");
    if let Some(horas) = record.horas() {
        let _ = writeln!(contenido, "**Horas trabajadas:** {}  ", protocol::format_horas(horas));
    }
    if let Some(tecnologias) = record.tecnologias_utilizadas() {
        let _ = writeln!(contenido, "**Tecnologías utilizadas:** {tecnologias}");
    }

    if let Some(descripcion) = record.descripcion() {
        contenido.push_str("\n---\n\n## Descripción\n\n");
        contenido.push_str(descripcion);
        contenido.push('\n');
    }

    let links: Vec<String> = [
        ("Publicación en LinkedIn", record.link_publicacion_linkedin()),
        ("IA principal", record.link_ia_principal()),
        ("IA secundaria", record.link_ia_secundaria()),
        ("IA terciaria", record.link_ia_terciaria()),
        ("Repositorio", record.link_respositorio()),
    ]
    .into_iter()
    .filter_map(|(label, url)| url.map(|url| format!("- [{label}]({url})")))
    .chain(
        record
            .commit_principal()
            .map(|commit| format!("- Commit: `{commit}`")),
    )
    .collect();
    if !links.is_empty() {
        contenido.push_str("\n---\n\n## Links técnicos\n\n");
        for line in &links {
            contenido.push_str(line);
            contenido.push('\n');
        }
    }

    let imagenes: Vec<String> = (1..=3)
        .filter_map(|i| record.imagen(i).map(|url| format!("![Imagen {i}]({url})")))
        .collect();
    if !imagenes.is_empty() {
        contenido.push_str("\n---\n\n## Imágenes\n\n");
        for line in &imagenes {
            contenido.push_str(line);
            contenido.push('\n');
        }
    }

    std::fs::write(&full_path, contenido).map_err(|source| ExportError::WriteFile {
        path: full_path.clone(),
        source,
    })?;
    tracing::debug!("exported daily log to {}", full_path.display());
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn minimal_log(nombre: &str, horas: f64, descripcion: Option<&str>) -> protocol::DailyLog {
        protocol::DailyLog {
            id: 1,
            project_name: "bitacora".to_string(),
            project_type: protocol::ProjectType::Backend,
            nombre_tarea: nombre.to_string(),
            descripcion: descripcion.map(str::to_string),
            horas,
            tecnologias_utilizadas: String::new(),
            fecha_creacion: Utc.with_ymd_and_hms(2026, 8, 23, 15, 30, 0).unwrap(),
            imagen_1: None,
            imagen_2: None,
            imagen_3: None,
            imagen_1_url: None,
            imagen_2_url: None,
            imagen_3_url: None,
            link_publicacion_linkedin: None,
            link_ia_principal: None,
            link_ia_secundaria: None,
            link_ia_terciaria: None,
            link_respositorio: None,
            commit_principal: None,
        }
    }

    #[test]
    fn minimal_record_exports_heading_and_hours_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = minimal_log("Fix login bug", 2.5, Some("Patched token refresh"));

        let path = export_markdown(&log, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2026-08-23_Fix_login_bug.md"
        );

        let contenido = std::fs::read_to_string(&path).unwrap();
        assert!(contenido.starts_with("# Fix login bug\n"));
        assert!(contenido.contains("**Horas trabajadas:** 2.5"));
        assert!(contenido.contains("## Descripción"));
        assert!(contenido.contains("Patched token refresh"));
        assert!(!contenido.contains("Imágenes"));
        assert!(!contenido.contains("Links técnicos"));
        assert!(!contenido.contains("Tecnologías"));
    }

    #[test]
    fn links_and_images_render_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = minimal_log("Deploy", 1.0, None);
        log.tecnologias_utilizadas = "Rust, axum".to_string();
        log.link_respositorio = Some("https://github.com/x/y".to_string());
        log.commit_principal = Some("abc123".to_string());
        log.imagen_1_url = Some("http://localhost:8000/media/dailylog/a.png".to_string());

        let contenido =
            std::fs::read_to_string(export_markdown(&log, dir.path()).unwrap()).unwrap();
        assert!(contenido.contains("**Tecnologías utilizadas:** Rust, axum"));
        assert!(contenido.contains("- [Repositorio](https://github.com/x/y)"));
        assert!(contenido.contains("- Commit: `abc123`"));
        assert!(contenido.contains("![Imagen 1](http://localhost:8000/media/dailylog/a.png)"));
        assert!(!contenido.contains("[Publicación en LinkedIn]"));
        assert!(!contenido.contains("## Descripción"));
    }

    #[test]
    fn missing_task_name_uses_default_label() {
        let dir = tempfile::tempdir().unwrap();
        let log = minimal_log("  ", 0.5, None);
        let path = export_markdown(&log, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2026-08-23_Tarea_sin_nombre.md"
        );
        let contenido = std::fs::read_to_string(&path).unwrap();
        assert!(contenido.starts_with("# Tarea sin nombre\n"));
    }

    #[test]
    fn filename_strips_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        let log = minimal_log("fix: a/b regression", 1.0, None);
        let path = export_markdown(&log, dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2026-08-23_fix__a_b_regression.md"
        );
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn creates_destination_directory_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("exportaciones_markdown");
        let log = minimal_log("tarea", 1.0, None);
        let path = export_markdown(&log, &nested).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn json_value_records_export_like_structs() {
        let dir = tempfile::tempdir().unwrap();
        let value = json!({
            "nombre_tarea": "Desde JSON",
            "horas": 3.0,
            "fecha_creacion": "2026-08-23T10:00:00Z",
            "descripcion": "",
            "imagen_1": "dailylog/local.png",
            "imagen_1_url": "http://localhost:8000/media/dailylog/local.png",
            "link_ia_principal": "https://claude.ai/chat/1"
        });
        let contenido =
            std::fs::read_to_string(export_markdown(&value, dir.path()).unwrap()).unwrap();
        assert!(contenido.starts_with("# Desde JSON\n"));
        assert!(contenido.contains("**Horas trabajadas:** 3"));
        assert!(contenido.contains("- [IA principal](https://claude.ai/chat/1)"));
        assert!(contenido.contains("![Imagen 1](http://localhost:8000/media/dailylog/local.png)"));
        assert!(!contenido.contains("## Descripción"));
    }
}
