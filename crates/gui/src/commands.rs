use std::path::PathBuf;

use base64::Engine as _;
use client_core::api::ListRequest;
use client_core::exports::{list_exports, read_export};
use client_core::form::TaskForm;
use client_core::history::{HistoryState, PublishStatus};
use client_core::stats;
use client_core::time::display_timestamp;
use protocol::{DailyLog, Page, ProjectType};
use serde::{Deserialize, Serialize};
use tauri::State;
use tauri_plugin_clipboard_manager::ClipboardExt;
use tauri_plugin_shell::ShellExt;

use crate::state::AppState;

const HISTORY_PAGE_SIZE: u64 = 10;
const STATS_PAGE_SIZE: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct TaskFormDto {
    pub project_name: String,
    #[serde(default)]
    pub project_type: String,
    pub nombre_tarea: String,
    pub descripcion: String,
    pub horas: String,
    #[serde(default)]
    pub tecnologias_utilizadas: String,
    #[serde(default)]
    pub link_publicacion_linkedin: String,
    #[serde(default)]
    pub link_ia_principal: String,
    #[serde(default)]
    pub link_ia_secundaria: String,
    #[serde(default)]
    pub link_ia_terciaria: String,
    #[serde(default)]
    pub link_respositorio: String,
    #[serde(default)]
    pub commit_principal: String,
    #[serde(default)]
    pub image_paths: Vec<String>,
}

#[derive(Clone, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub fecha: String,
    pub nombre_tarea: String,
    pub horas: f64,
    pub tecnologias_utilizadas: String,
    pub descripcion: Option<String>,
    pub estado: &'static str,
    pub imagen_urls: Vec<String>,
    pub link_ia_principal: Option<String>,
    pub link_publicacion_linkedin: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct HistoryPage {
    pub page: u64,
    pub count: u64,
    pub rows: Vec<HistoryRow>,
}

#[derive(Serialize)]
pub struct DayHoursDto {
    pub date: String,
    pub hours: f64,
}

#[derive(Serialize)]
pub struct FranjaHoursDto {
    pub date: String,
    pub franja: &'static str,
    pub hours: f64,
}

#[derive(Serialize)]
pub struct HeatmapCellDto {
    pub date: String,
    pub hour: u32,
    pub hours: f64,
}

#[derive(Serialize)]
pub struct TechCountDto {
    pub name: String,
    pub count: usize,
}

#[derive(Serialize)]
pub struct StatsDto {
    pub total: u64,
    pub hours_by_day: Vec<DayHoursDto>,
    pub franjas: Vec<FranjaHoursDto>,
    pub heatmap: Vec<HeatmapCellDto>,
    pub technologies: Vec<TechCountDto>,
}

fn row_from_log(log: &DailyLog) -> HistoryRow {
    HistoryRow {
        id: log.id,
        fecha: display_timestamp(log.fecha_creacion),
        nombre_tarea: log.nombre_tarea.clone(),
        horas: log.horas,
        tecnologias_utilizadas: log.tecnologias_utilizadas.clone(),
        descripcion: log.descripcion.clone(),
        estado: PublishStatus::of(log).label(),
        imagen_urls: (1..=3)
            .filter_map(|i| log.imagen_url(i).map(str::to_string))
            .collect(),
        link_ia_principal: log.link_ia_principal.clone(),
        link_publicacion_linkedin: log.link_publicacion_linkedin.clone(),
    }
}

#[tauri::command]
pub async fn login(
    username: String,
    password: String,
    state: State<'_, AppState>,
) -> Result<(), String> {
    state
        .client
        .login(&username, &password)
        .await
        .map_err(|e| e.to_string())
}

/// Validates the form locally, then uploads it. Validation failures come
/// back as one message per offending field without touching the network.
#[tauri::command]
pub async fn submit_task(
    form: TaskFormDto,
    state: State<'_, AppState>,
) -> Result<DailyLog, String> {
    let task_form = TaskForm {
        project_name: form.project_name,
        project_type: form
            .project_type
            .trim()
            .parse::<ProjectType>()
            .unwrap_or_default(),
        nombre_tarea: form.nombre_tarea,
        descripcion: form.descripcion,
        horas: form.horas,
        tecnologias_utilizadas: form.tecnologias_utilizadas,
        link_publicacion_linkedin: form.link_publicacion_linkedin,
        link_ia_principal: form.link_ia_principal,
        link_ia_secundaria: form.link_ia_secundaria,
        link_ia_terciaria: form.link_ia_terciaria,
        link_respositorio: form.link_respositorio,
        commit_principal: form.commit_principal,
        image_paths: form.image_paths.into_iter().map(PathBuf::from).collect(),
    };

    let submission = task_form.validate().map_err(|errors| {
        errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("\n")
    })?;

    state
        .client
        .create_log(&submission)
        .await
        .map_err(|e| e.to_string())
}

/// Fetches the current history page. Returns `None` when a newer fetch
/// was started while this one was in flight; the caller drops the result.
#[tauri::command]
pub async fn fetch_history(state: State<'_, AppState>) -> Result<Option<HistoryPage>, String> {
    let (ticket, request) = {
        let history = state.history.lock().unwrap();
        (history.begin_request(), history.to_request(HISTORY_PAGE_SIZE))
    };

    let page = state
        .client
        .list_logs(&request)
        .await
        .map_err(|e| e.to_string())?;

    let mut history = state.history.lock().unwrap();
    if !history.is_current(ticket) {
        return Ok(None);
    }
    Ok(Some(assemble_history_page(
        &mut history,
        page,
        HISTORY_PAGE_SIZE,
    )))
}

/// The reported page number is read back after clamping, so a fetch that
/// landed past the end shows the page the rows actually belong to.
fn assemble_history_page(
    history: &mut HistoryState,
    page: Page<DailyLog>,
    page_size: u64,
) -> HistoryPage {
    history.clamp_to_last_page(page.count, page_size);
    HistoryPage {
        page: history.page(),
        count: page.count,
        rows: page.results.iter().map(row_from_log).collect(),
    }
}

#[tauri::command]
pub fn history_next_page(state: State<'_, AppState>) {
    state.history.lock().unwrap().next_page();
}

#[tauri::command]
pub fn history_previous_page(state: State<'_, AppState>) {
    state.history.lock().unwrap().previous_page();
}

#[tauri::command]
pub fn history_search(query: String, state: State<'_, AppState>) {
    state.history.lock().unwrap().set_search(&query);
}

/// Thumbnail bytes as base64 so the webview can render them inline.
#[tauri::command]
pub async fn fetch_thumbnail(url: String, state: State<'_, AppState>) -> Result<String, String> {
    let bytes = state
        .client
        .fetch_image_bytes(&url)
        .await
        .map_err(|e| e.to_string())?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Walks every page of the ordered list and aggregates the charts' inputs.
#[tauri::command]
pub async fn load_stats(state: State<'_, AppState>) -> Result<StatsDto, String> {
    let mut logs: Vec<DailyLog> = Vec::new();
    let mut total = 0;
    let mut page = 1;
    loop {
        let request = ListRequest {
            page,
            page_size: Some(STATS_PAGE_SIZE),
            ordering: Some("-fecha_creacion".to_string()),
            ..ListRequest::default()
        };
        let response = state
            .client
            .list_logs(&request)
            .await
            .map_err(|e| e.to_string())?;
        total = response.count;
        let has_next = response.next.is_some();
        logs.extend(response.results);
        if !has_next {
            break;
        }
        page += 1;
    }

    let hours_by_day = stats::hours_by_day(&logs)
        .into_iter()
        .map(|(date, hours)| DayHoursDto {
            date: date.to_string(),
            hours,
        })
        .collect();
    let franjas = stats::hours_by_day_and_franja(&logs)
        .into_iter()
        .map(|((date, franja), hours)| FranjaHoursDto {
            date: date.to_string(),
            franja: franja.label(),
            hours,
        })
        .collect();
    let heatmap = stats::heatmap(&logs)
        .into_iter()
        .map(|((date, hour), hours)| HeatmapCellDto {
            date: date.to_string(),
            hour,
            hours,
        })
        .collect();
    let technologies = stats::technology_frequency(&logs)
        .into_iter()
        .map(|(name, count)| TechCountDto { name, count })
        .collect();

    Ok(StatsDto {
        total,
        hours_by_day,
        franjas,
        heatmap,
        technologies,
    })
}

/// Writes one entry to a Markdown file in the export directory and
/// returns the path written.
#[tauri::command]
pub async fn export_log(id: i64, state: State<'_, AppState>) -> Result<String, String> {
    let log = state.client.get_log(id).await.map_err(|e| e.to_string())?;
    let path = export::export_markdown(&log, &state.config.export_dir).map_err(|e| e.to_string())?;
    Ok(path.to_string_lossy().into_owned())
}

/// Attaches the LinkedIn publication link, flipping the row to published.
#[tauri::command]
pub async fn publish_link(
    id: i64,
    link: String,
    state: State<'_, AppState>,
) -> Result<HistoryRow, String> {
    let updated = state
        .client
        .set_linkedin_link(id, link.trim())
        .await
        .map_err(|e| e.to_string())?;
    Ok(row_from_log(&updated))
}

#[tauri::command]
pub async fn delete_log(id: i64, state: State<'_, AppState>) -> Result<(), String> {
    state.client.delete_log(id).await.map_err(|e| e.to_string())
}

/// Opens a URL or file with the system's default handler.
#[tauri::command]
pub async fn open_link(url: String, app: tauri::AppHandle) -> Result<(), String> {
    app.shell().open(url, None).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn list_export_files(state: State<'_, AppState>) -> Result<Vec<String>, String> {
    let files = list_exports(&state.config.export_dir).map_err(|e| e.to_string())?;
    Ok(files
        .into_iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect())
}

#[tauri::command]
pub fn read_export_file(path: String) -> Result<String, String> {
    read_export(std::path::Path::new(&path)).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn copy_to_clipboard(text: String, app: tauri::AppHandle) -> Result<(), String> {
    app.clipboard().write_text(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_page_number_reflects_the_clamp() {
        let mut history = HistoryState::new();
        for _ in 0..9 {
            history.next_page();
        }
        let page = Page {
            count: 25,
            next: None,
            previous: None,
            results: Vec::new(),
        };
        let assembled = assemble_history_page(&mut history, page, 10);
        assert_eq!(assembled.page, 3);
        assert_eq!(history.page(), 3);
    }
}
