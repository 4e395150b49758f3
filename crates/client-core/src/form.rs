use std::path::PathBuf;

use protocol::{CreateDailyLog, ProjectType};

use crate::api::NewDailyLog;

/// Raw form contents as entered in the submission view. Everything is a
/// string until validation, matching what the inputs hold.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub project_name: String,
    pub project_type: ProjectType,
    pub nombre_tarea: String,
    pub descripcion: String,
    pub horas: String,
    pub tecnologias_utilizadas: String,
    pub link_publicacion_linkedin: String,
    pub link_ia_principal: String,
    pub link_ia_secundaria: String,
    pub link_ia_terciaria: String,
    pub link_respositorio: String,
    pub commit_principal: String,
    pub image_paths: Vec<PathBuf>,
}

/// One message per offending field, shown next to the input before any
/// network call happens.
pub type FormErrors = Vec<(String, String)>;

const MAX_IMAGES: usize = 3;

impl TaskForm {
    /// Local validation: required fields present, hours in range, at most
    /// three images. Returns the payload ready for submission.
    pub fn validate(&self) -> Result<NewDailyLog, FormErrors> {
        let mut errors = FormErrors::new();

        if self.project_name.trim().is_empty() {
            errors.push(("project_name".to_string(), "Project is required".to_string()));
        }
        if self.nombre_tarea.trim().is_empty() {
            errors.push(("nombre_tarea".to_string(), "Task name is required".to_string()));
        }
        if self.descripcion.trim().is_empty() {
            errors.push(("descripcion".to_string(), "Description is required".to_string()));
        }

        let horas = match self.horas.trim().parse::<f64>() {
            Ok(horas) if horas > 0.0 && horas <= 24.0 => Some(horas),
            Ok(_) => {
                errors.push((
                    "horas".to_string(),
                    "Hours must be greater than 0 and at most 24".to_string(),
                ));
                None
            }
            Err(_) => {
                errors.push(("horas".to_string(), "Hours must be a number".to_string()));
                None
            }
        };

        if self.image_paths.len() > MAX_IMAGES {
            errors.push((
                "imagenes".to_string(),
                format!("At most {MAX_IMAGES} images can be attached"),
            ));
        }
        for path in &self.image_paths {
            if !path.is_file() {
                errors.push((
                    "imagenes".to_string(),
                    format!("File not found: {}", path.display()),
                ));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewDailyLog {
            data: CreateDailyLog {
                project_name: self.project_name.trim().to_string(),
                project_type: self.project_type,
                nombre_tarea: self.nombre_tarea.trim().to_string(),
                descripcion: Some(self.descripcion.trim().to_string()),
                horas: horas.unwrap_or_default(),
                tecnologias_utilizadas: self.tecnologias_utilizadas.trim().to_string(),
                link_publicacion_linkedin: optional(&self.link_publicacion_linkedin),
                link_ia_principal: optional(&self.link_ia_principal),
                link_ia_secundaria: optional(&self.link_ia_secundaria),
                link_ia_terciaria: optional(&self.link_ia_terciaria),
                link_respositorio: optional(&self.link_respositorio),
                commit_principal: optional(&self.commit_principal),
            },
            image_paths: self.image_paths.clone(),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
