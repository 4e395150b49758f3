//! Wire types shared by the REST backend and the desktop client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Frontend,
    Backend,
    Fullstack,
}

/// One logged day of work, as served by the API. Image fields carry the
/// media-relative storage path; the `_url` variants are absolute and are
/// resolved against the request host by the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DailyLog {
    pub id: i64,
    pub project_name: String,
    pub project_type: ProjectType,
    pub nombre_tarea: String,
    pub descripcion: Option<String>,
    pub horas: f64,
    pub tecnologias_utilizadas: String,
    #[ts(type = "Date")]
    pub fecha_creacion: DateTime<Utc>,
    pub imagen_1: Option<String>,
    pub imagen_2: Option<String>,
    pub imagen_3: Option<String>,
    pub imagen_1_url: Option<String>,
    pub imagen_2_url: Option<String>,
    pub imagen_3_url: Option<String>,
    pub link_publicacion_linkedin: Option<String>,
    pub link_ia_principal: Option<String>,
    pub link_ia_secundaria: Option<String>,
    pub link_ia_terciaria: Option<String>,
    pub link_respositorio: Option<String>,
    pub commit_principal: Option<String>,
}

impl DailyLog {
    pub fn imagen_url(&self, index: usize) -> Option<&str> {
        match index {
            1 => self.imagen_1_url.as_deref(),
            2 => self.imagen_2_url.as_deref(),
            3 => self.imagen_3_url.as_deref(),
            _ => None,
        }
    }
}

/// Text fields of a creation request. Image files travel as separate
/// multipart parts named `imagen_1`..`imagen_3`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct CreateDailyLog {
    pub project_name: String,
    #[serde(default)]
    pub project_type: ProjectType,
    pub nombre_tarea: String,
    pub descripcion: Option<String>,
    pub horas: f64,
    pub tecnologias_utilizadas: String,
    pub link_publicacion_linkedin: Option<String>,
    pub link_ia_principal: Option<String>,
    pub link_ia_secundaria: Option<String>,
    pub link_ia_terciaria: Option<String>,
    pub link_respositorio: Option<String>,
    pub commit_principal: Option<String>,
}

/// Partial update: only present fields are applied (PATCH). PUT uses the
/// same shape but revalidates that the required fields are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateDailyLog {
    pub project_name: Option<String>,
    pub project_type: Option<ProjectType>,
    pub nombre_tarea: Option<String>,
    pub descripcion: Option<String>,
    pub horas: Option<f64>,
    pub tecnologias_utilizadas: Option<String>,
    pub link_publicacion_linkedin: Option<String>,
    pub link_ia_principal: Option<String>,
    pub link_ia_secundaria: Option<String>,
    pub link_ia_terciaria: Option<String>,
    pub link_respositorio: Option<String>,
    pub commit_principal: Option<String>,
}

/// Paginated list payload. `next`/`previous` are absolute URLs for the
/// adjacent pages, absent at the collection edges.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AccessToken {
    pub access: String,
}

/// Minimal decimal rendering for hours: `2.5` rather than `2.50`, whole
/// values without a trailing `.0`.
pub fn format_horas(horas: f64) -> String {
    if horas.fract() == 0.0 {
        format!("{}", horas as i64)
    } else {
        let rounded = (horas * 100.0).round() / 100.0;
        let mut text = format!("{rounded}");
        if text.contains('.') {
            while text.ends_with('0') {
                text.pop();
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_type_parses_lowercase_tokens() {
        assert_eq!("backend".parse::<ProjectType>().unwrap(), ProjectType::Backend);
        assert_eq!(ProjectType::Fullstack.to_string(), "fullstack");
        assert!("desktop".parse::<ProjectType>().is_err());
    }

    #[test]
    fn format_horas_trims_trailing_zeros() {
        assert_eq!(format_horas(2.5), "2.5");
        assert_eq!(format_horas(2.0), "2");
        assert_eq!(format_horas(0.25), "0.25");
        assert_eq!(format_horas(8.10), "8.1");
    }

    #[test]
    fn daily_log_serializes_spanish_field_names() {
        let log = DailyLog {
            id: 1,
            project_name: "bitacora".to_string(),
            project_type: ProjectType::Backend,
            nombre_tarea: "Fix login bug".to_string(),
            descripcion: None,
            horas: 2.5,
            tecnologias_utilizadas: "Rust, axum".to_string(),
            fecha_creacion: Utc::now(),
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
        };
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["nombre_tarea"], "Fix login bug");
        assert_eq!(value["project_type"], "backend");
        assert_eq!(value["horas"], 2.5);
    }
}
