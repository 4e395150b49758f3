use std::{collections::BTreeMap, path::Path as FsPath};

use axum::{
    Extension, Router,
    extract::{Multipart, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::daily_log::{DailyLogStore, ImageUpdate},
    types::{ListParams, Ordering},
};
use protocol::{CreateDailyLog, DailyLog, Page, ProjectType, UpdateDailyLog};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, FieldErrors},
    middleware::load_daily_log_middleware,
};

const REQUIRED_MESSAGE: &str = "This field is required.";
const HORAS_RANGE_MESSAGE: &str = "Hours must be greater than 0 and at most 24.";
const HORAS_NUMBER_MESSAGE: &str = "Not a valid number.";
const PROJECT_TYPE_MESSAGE: &str = "Invalid project type.";
const IMAGE_FILE_MESSAGE: &str = "Expected an image file upload.";

pub fn router(state: &AppState) -> Router<AppState> {
    let detail = Router::new()
        .route(
            "/dailylog/{id}/",
            get(get_daily_log)
                .put(replace_daily_log)
                .patch(patch_daily_log)
                .delete(delete_daily_log),
        )
        .layer(from_fn_with_state(
            state.clone(),
            load_daily_log_middleware,
        ));

    Router::new()
        .route("/dailylog/", get(list_daily_logs).post(create_daily_log))
        .merge(detail)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub project_type: Option<String>,
    pub ordering: Option<String>,
}

impl ListQuery {
    fn to_params(&self) -> Result<ListParams, ApiError> {
        let project_type = match self.project_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<ProjectType>().map_err(|_| {
                ApiError::BadRequest(format!("Unknown project_type: {raw}"))
            })?),
        };
        let mut params = ListParams {
            search: self.search.clone(),
            project_type,
            ..ListParams::default()
        };
        if let Some(page) = self.page {
            params.page = page;
        }
        if let Some(page_size) = self.page_size {
            params.page_size = page_size;
        }
        if let Some(ordering) = self.ordering.as_deref() {
            params.ordering = Ordering::parse(ordering);
        }
        Ok(params.normalized())
    }
}

pub async fn list_daily_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<DailyLog>>>, ApiError> {
    let params = query.to_params()?;
    let (results, count) = DailyLogStore::list(&state.db().conn, &params).await?;

    let base = request_base(&headers);
    let results: Vec<DailyLog> = results
        .into_iter()
        .map(|log| with_image_urls(log, &base))
        .collect();

    let next = (params.page * params.page_size < count)
        .then(|| page_url(&base, &query, params.page + 1));
    let previous = (params.page > 1).then(|| page_url(&base, &query, params.page - 1));

    Ok(ResponseJson(ApiResponse::success(Page {
        count,
        next,
        previous,
        results,
    })))
}

pub async fn get_daily_log(
    Extension(log): Extension<DailyLog>,
    headers: HeaderMap,
) -> ResponseJson<ApiResponse<DailyLog>> {
    let base = request_base(&headers);
    ResponseJson(ApiResponse::success(with_image_urls(log, &base)))
}

pub async fn create_daily_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<ApiResponse<DailyLog>>), ApiError> {
    let form = LogForm::read(multipart, &state.config().media_root).await?;
    let data = match form.build_create() {
        Ok(data) => data,
        Err(errors) => {
            form.discard_saved(&state.config().media_root).await;
            return Err(ApiError::Validation(errors));
        }
    };

    let images = form.created_images();
    let created = DailyLogStore::create(&state.db().conn, &data, images).await?;
    tracing::debug!(id = created.id, "Created daily log '{}'", created.nombre_tarea);

    let base = request_base(&headers);
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(with_image_urls(created, &base))),
    ))
}

pub async fn replace_daily_log(
    Extension(existing): Extension<DailyLog>,
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<DailyLog>>, ApiError> {
    let form = LogForm::read(multipart, &state.config().media_root).await?;
    let data = match form.build_create() {
        Ok(data) => data,
        Err(errors) => {
            form.discard_saved(&state.config().media_root).await;
            return Err(ApiError::Validation(errors));
        }
    };

    let updated =
        DailyLogStore::replace(&state.db().conn, existing.id, &data, form.images.clone()).await?;
    remove_superseded_images(&state, &existing, &updated).await;

    let base = request_base(&headers);
    Ok(ResponseJson(ApiResponse::success(with_image_urls(
        updated, &base,
    ))))
}

pub async fn patch_daily_log(
    Extension(existing): Extension<DailyLog>,
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<DailyLog>>, ApiError> {
    let form = LogForm::read(multipart, &state.config().media_root).await?;
    let data = match form.build_update() {
        Ok(data) => data,
        Err(errors) => {
            form.discard_saved(&state.config().media_root).await;
            return Err(ApiError::Validation(errors));
        }
    };

    let updated =
        DailyLogStore::patch(&state.db().conn, existing.id, &data, form.images.clone()).await?;
    remove_superseded_images(&state, &existing, &updated).await;

    let base = request_base(&headers);
    Ok(ResponseJson(ApiResponse::success(with_image_urls(
        updated, &base,
    ))))
}

pub async fn delete_daily_log(
    Extension(existing): Extension<DailyLog>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    DailyLogStore::delete(&state.db().conn, existing.id).await?;
    for relative in [&existing.imagen_1, &existing.imagen_2, &existing.imagen_3]
        .into_iter()
        .flatten()
    {
        remove_media_file(&state.config().media_root, relative).await;
    }
    tracing::debug!(id = existing.id, "Deleted daily log");
    Ok(StatusCode::NO_CONTENT)
}

/// Parsed multipart payload: text fields by name plus the per-slot image
/// instructions, with upload errors collected for the validation response.
#[derive(Debug, Default)]
struct LogForm {
    text: BTreeMap<String, String>,
    images: [ImageUpdate; 3],
    image_errors: FieldErrors,
}

impl LogForm {
    async fn read(mut multipart: Multipart, media_root: &FsPath) -> Result<LogForm, ApiError> {
        let mut form = LogForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match image_slot(&name) {
                Some(slot) => {
                    let filename = field
                        .file_name()
                        .map(str::to_string)
                        .filter(|f| !f.is_empty());
                    match filename {
                        Some(filename) => {
                            let is_image = field
                                .content_type()
                                .is_none_or(|mime| mime.starts_with("image/"));
                            if !is_image {
                                form.push_image_error(&name);
                                continue;
                            }
                            let bytes = field.bytes().await?;
                            let relative = save_image(media_root, &filename, &bytes).await?;
                            form.images[slot] = Some(Some(relative));
                        }
                        None => {
                            // A text part for an image field clears the slot;
                            // non-empty text is not a valid file upload.
                            let value = field.text().await?;
                            if value.trim().is_empty() {
                                form.images[slot] = Some(None);
                            } else {
                                form.push_image_error(&name);
                            }
                        }
                    }
                }
                None => {
                    let value = field.text().await?;
                    form.text.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    fn push_image_error(&mut self, field: &str) {
        self.image_errors
            .entry(field.to_string())
            .or_default()
            .push(IMAGE_FILE_MESSAGE.to_string());
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }

    /// Full validation for POST and PUT.
    fn build_create(&self) -> Result<CreateDailyLog, FieldErrors> {
        let mut errors = self.image_errors.clone();

        let project_name = self.require("project_name", &mut errors);
        let nombre_tarea = self.require("nombre_tarea", &mut errors);
        let tecnologias = self.require("tecnologias_utilizadas", &mut errors);
        let horas = self.parse_horas_required(&mut errors);
        let project_type = self.parse_project_type(&mut errors).unwrap_or_default();

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CreateDailyLog {
            project_name: project_name.unwrap_or_default(),
            project_type,
            nombre_tarea: nombre_tarea.unwrap_or_default(),
            descripcion: self.optional("descripcion"),
            horas: horas.unwrap_or_default(),
            tecnologias_utilizadas: tecnologias.unwrap_or_default(),
            link_publicacion_linkedin: self.optional("link_publicacion_linkedin"),
            link_ia_principal: self.optional("link_ia_principal"),
            link_ia_secundaria: self.optional("link_ia_secundaria"),
            link_ia_terciaria: self.optional("link_ia_terciaria"),
            link_respositorio: self.optional("link_respositorio"),
            commit_principal: self.optional("commit_principal"),
        })
    }

    /// Partial validation for PATCH: only present fields are checked.
    fn build_update(&self) -> Result<UpdateDailyLog, FieldErrors> {
        let mut errors = self.image_errors.clone();

        let horas = match self.get("horas") {
            Some(raw) => parse_horas(raw).map_err(|message| {
                insert_error(&mut errors, "horas", message);
            }),
            None => Ok(None),
        };
        let project_type = self.parse_project_type(&mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(UpdateDailyLog {
            project_name: self.optional("project_name"),
            project_type,
            nombre_tarea: self.optional("nombre_tarea"),
            descripcion: self.optional("descripcion"),
            horas: horas.unwrap_or(None),
            tecnologias_utilizadas: self.optional("tecnologias_utilizadas"),
            link_publicacion_linkedin: self.optional("link_publicacion_linkedin"),
            link_ia_principal: self.optional("link_ia_principal"),
            link_ia_secundaria: self.optional("link_ia_secundaria"),
            link_ia_terciaria: self.optional("link_ia_terciaria"),
            link_respositorio: self.optional("link_respositorio"),
            commit_principal: self.optional("commit_principal"),
        })
    }

    fn require(&self, name: &str, errors: &mut FieldErrors) -> Option<String> {
        match self.get(name).map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => Some(value.to_string()),
            None => {
                insert_error(errors, name, REQUIRED_MESSAGE);
                None
            }
        }
    }

    fn parse_horas_required(&self, errors: &mut FieldErrors) -> Option<f64> {
        let Some(raw) = self.get("horas") else {
            insert_error(errors, "horas", REQUIRED_MESSAGE);
            return None;
        };
        match parse_horas(raw) {
            Ok(horas) => horas,
            Err(message) => {
                insert_error(errors, "horas", message);
                None
            }
        }
    }

    fn parse_project_type(&self, errors: &mut FieldErrors) -> Option<ProjectType> {
        let raw = self.get("project_type").map(str::trim)?;
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<ProjectType>() {
            Ok(project_type) => Some(project_type),
            Err(_) => {
                insert_error(errors, "project_type", PROJECT_TYPE_MESSAGE);
                None
            }
        }
    }

    /// Image list for creation, where there is no previous value to keep.
    fn created_images(&self) -> [Option<String>; 3] {
        self.images
            .clone()
            .map(|update| update.flatten())
    }

    async fn discard_saved(&self, media_root: &FsPath) {
        for relative in self.images.iter().flatten().flatten() {
            remove_media_file(media_root, relative).await;
        }
    }
}

fn insert_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn parse_horas(raw: &str) -> Result<Option<f64>, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(REQUIRED_MESSAGE);
    }
    match trimmed.parse::<f64>() {
        Ok(horas) if horas > 0.0 && horas <= 24.0 => Ok(Some(horas)),
        Ok(_) => Err(HORAS_RANGE_MESSAGE),
        Err(_) => Err(HORAS_NUMBER_MESSAGE),
    }
}

fn image_slot(field_name: &str) -> Option<usize> {
    match field_name {
        "imagen_1" => Some(0),
        "imagen_2" => Some(1),
        "imagen_3" => Some(2),
        _ => None,
    }
}

fn sanitize_filename(filename: &str) -> String {
    let base = FsPath::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("imagen");
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

async fn save_image(
    media_root: &FsPath,
    filename: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let relative = format!("dailylog/{}_{}", Uuid::new_v4(), sanitize_filename(filename));
    let full_path = media_root.join(&relative);
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full_path, bytes).await?;
    Ok(relative)
}

async fn remove_media_file(media_root: &FsPath, relative: &str) {
    let full_path = media_root.join(relative);
    if let Err(err) = tokio::fs::remove_file(&full_path).await
        && err.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("Failed to remove media file {}: {err}", full_path.display());
    }
}

/// Drops stored files that an update replaced or cleared.
async fn remove_superseded_images(state: &AppState, before: &DailyLog, after: &DailyLog) {
    let pairs = [
        (&before.imagen_1, &after.imagen_1),
        (&before.imagen_2, &after.imagen_2),
        (&before.imagen_3, &after.imagen_3),
    ];
    for (old, new) in pairs {
        if let Some(old) = old
            && new.as_deref() != Some(old.as_str())
        {
            remove_media_file(&state.config().media_root, old).await;
        }
    }
}

fn request_base(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost:8000");
    format!("http://{host}")
}

fn media_url(base: &str, relative: &str) -> String {
    format!("{base}/media/{relative}")
}

fn with_image_urls(mut log: DailyLog, base: &str) -> DailyLog {
    log.imagen_1_url = log.imagen_1.as_deref().map(|p| media_url(base, p));
    log.imagen_2_url = log.imagen_2.as_deref().map(|p| media_url(base, p));
    log.imagen_3_url = log.imagen_3.as_deref().map(|p| media_url(base, p));
    log
}

fn page_url(base: &str, query: &ListQuery, page: u64) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("page", &page.to_string());
    if let Some(page_size) = query.page_size {
        serializer.append_pair("page_size", &page_size.to_string());
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        serializer.append_pair("search", search);
    }
    if let Some(project_type) = query.project_type.as_deref().filter(|s| !s.is_empty()) {
        serializer.append_pair("project_type", project_type);
    }
    if let Some(ordering) = query.ordering.as_deref().filter(|s| !s.is_empty()) {
        serializer.append_pair("ordering", ordering);
    }
    format!("{base}/api/dailylog/?{}", serializer.finish())
}
