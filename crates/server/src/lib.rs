use std::sync::Arc;

use config::ServerConfig;
use db::DBService;
use utils_jwt::TokenSigner;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    signer: Arc<TokenSigner>,
    config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: DBService, config: ServerConfig) -> Self {
        let signer = TokenSigner::new(
            &config.auth.secret,
            config.auth.access_ttl_secs,
            config.auth.refresh_ttl_secs,
        );
        AppState {
            db,
            signer: Arc::new(signer),
            config: Arc::new(config),
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
