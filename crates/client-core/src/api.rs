use std::path::{Path, PathBuf};

use config::ClientConfig;
use protocol::{
    AccessToken, CreateDailyLog, DailyLog, Page, RefreshRequest, TokenPair, TokenRequest,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::RwLock;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("Connection error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Malformed API response: {0}")]
    Decode(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Failed to read {path}: {source}")]
    ImageRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Text fields plus up to three local image paths for a new entry.
#[derive(Debug, Clone, Default)]
pub struct NewDailyLog {
    pub data: CreateDailyLog,
    pub image_paths: Vec<PathBuf>,
}

/// Filters for a history fetch, mirroring the list endpoint's query string.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub page: u64,
    pub page_size: Option<u64>,
    pub search: Option<String>,
    pub project_type: Option<String>,
    pub ordering: Option<String>,
}

/// REST client for the backend. Tokens obtained at login are held
/// internally; every mutating call attaches the access token.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: RwLock<Option<TokenPair>>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(ApiClient {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Exchanges credentials for a token pair and stores it for later calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiClientError> {
        let response = self
            .http
            .post(self.url("/api/token/"))
            .json(&TokenRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let pair: TokenPair = parse_envelope(response).await?;
        *self.tokens.write().await = Some(pair);
        Ok(())
    }

    /// Trades the stored refresh token for a fresh access token. Callers
    /// decide when to invoke this; no automatic retry loop exists.
    pub async fn refresh_access(&self) -> Result<(), ApiClientError> {
        let refresh = {
            let tokens = self.tokens.read().await;
            tokens
                .as_ref()
                .map(|pair| pair.refresh.clone())
                .ok_or(ApiClientError::NotAuthenticated)?
        };
        let response = self
            .http
            .post(self.url("/api/token/refresh/"))
            .json(&RefreshRequest { refresh })
            .send()
            .await?;
        let token: AccessToken = parse_envelope(response).await?;
        let mut tokens = self.tokens.write().await;
        if let Some(pair) = tokens.as_mut() {
            pair.access = token.access;
        }
        Ok(())
    }

    async fn bearer(&self) -> Result<String, ApiClientError> {
        let tokens = self.tokens.read().await;
        tokens
            .as_ref()
            .map(|pair| format!("Bearer {}", pair.access))
            .ok_or(ApiClientError::NotAuthenticated)
    }

    pub async fn list_logs(&self, request: &ListRequest) -> Result<Page<DailyLog>, ApiClientError> {
        let mut query: Vec<(&str, String)> = vec![("page", request.page.max(1).to_string())];
        if let Some(page_size) = request.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        if let Some(search) = request.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(project_type) = request.project_type.as_deref() {
            query.push(("project_type", project_type.to_string()));
        }
        if let Some(ordering) = request.ordering.as_deref() {
            query.push(("ordering", ordering.to_string()));
        }

        let response = self
            .http
            .get(self.url("/api/dailylog/"))
            .query(&query)
            .send()
            .await?;
        parse_envelope(response).await
    }

    pub async fn get_log(&self, id: i64) -> Result<DailyLog, ApiClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/dailylog/{id}/")))
            .send()
            .await?;
        parse_envelope(response).await
    }

    /// Multipart POST of the form contents plus the chosen image files.
    pub async fn create_log(&self, submission: &NewDailyLog) -> Result<DailyLog, ApiClientError> {
        let mut form = text_fields(&submission.data);
        for (index, path) in submission.image_paths.iter().take(3).enumerate() {
            let part = image_part(path).await?;
            form = form.part(format!("imagen_{}", index + 1), part);
        }

        let response = self
            .http
            .post(self.url("/api/dailylog/"))
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .multipart(form)
            .send()
            .await?;
        let created: DailyLog = parse_envelope(response).await?;
        tracing::debug!(id = created.id, "Submitted daily log");
        Ok(created)
    }

    /// Attaches or replaces the LinkedIn publication link on one entry.
    pub async fn set_linkedin_link(
        &self,
        id: i64,
        link: &str,
    ) -> Result<DailyLog, ApiClientError> {
        let form =
            reqwest::multipart::Form::new().text("link_publicacion_linkedin", link.to_string());
        let response = self
            .http
            .patch(self.url(&format!("/api/dailylog/{id}/")))
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .multipart(form)
            .send()
            .await?;
        parse_envelope(response).await
    }

    pub async fn delete_log(&self, id: i64) -> Result<(), ApiClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/dailylog/{id}/")))
            .header(reqwest::header::AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(response).await)
    }

    /// Raw bytes of a media URL, used for thumbnails. Media is public so no
    /// token is attached.
    pub async fn fetch_image_bytes(&self, url: &str) -> Result<Vec<u8>, ApiClientError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn text_fields(data: &CreateDailyLog) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new()
        .text("project_name", data.project_name.clone())
        .text("project_type", data.project_type.to_string())
        .text("nombre_tarea", data.nombre_tarea.clone())
        .text("horas", protocol::format_horas(data.horas))
        .text(
            "tecnologias_utilizadas",
            data.tecnologias_utilizadas.clone(),
        );
    let optionals = [
        ("descripcion", &data.descripcion),
        ("link_publicacion_linkedin", &data.link_publicacion_linkedin),
        ("link_ia_principal", &data.link_ia_principal),
        ("link_ia_secundaria", &data.link_ia_secundaria),
        ("link_ia_terciaria", &data.link_ia_terciaria),
        ("link_respositorio", &data.link_respositorio),
        ("commit_principal", &data.commit_principal),
    ];
    for (name, value) in optionals {
        if let Some(value) = value {
            form = form.text(name, value.clone());
        }
    }
    form
}

async fn image_part(path: &Path) -> Result<reqwest::multipart::Part, ApiClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ApiClientError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("imagen.png")
        .to_string();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    reqwest::multipart::Part::bytes(bytes)
        .file_name(filename)
        .mime_str(mime.essence_str())
        .map_err(ApiClientError::Http)
}

/// Unwraps the `{success, data, message}` envelope, turning API failures
/// into typed errors with the server's message.
async fn parse_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), &response.bytes().await?));
    }
    let bytes = response.bytes().await?;
    let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)
        .map_err(|err| ApiClientError::Decode(err.to_string()))?;
    envelope
        .data
        .ok_or_else(|| ApiClientError::Decode("response envelope has no data".to_string()))
}

async fn error_from_response(response: reqwest::Response) -> ApiClientError {
    let status = response.status().as_u16();
    match response.bytes().await {
        Ok(bytes) => error_from_body(status, &bytes),
        Err(err) => ApiClientError::Http(err),
    }
}

fn error_from_body(status: u16, bytes: &[u8]) -> ApiClientError {
    let message = serde_json::from_slice::<ApiResponse<serde_json::Value>>(bytes)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| format!("Request failed with status {status}"));
    ApiClientError::Api { status, message }
}
