use std::sync::{Arc, Mutex};

use client_core::api::{ApiClient, ApiClientError};
use client_core::history::HistoryState;
use config::ClientConfig;

/// Application state shared across Tauri commands.
pub struct AppState {
    pub client: Arc<ApiClient>,
    pub config: ClientConfig,
    pub history: Mutex<HistoryState>,
}

impl AppState {
    pub fn new(config: ClientConfig) -> Result<Self, ApiClientError> {
        let client = ApiClient::new(&config)?;
        Ok(Self {
            client: Arc::new(client),
            config,
            history: Mutex::new(HistoryState::new()),
        })
    }
}
