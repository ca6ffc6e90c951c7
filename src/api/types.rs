//! Shared state handed to every request handler.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::config::AppConfig;
use crate::ocr::{ImageOcr, TextPassthroughOcr};

/// Everything a handler or background task needs: the store, resolved
/// configuration, a shared outbound HTTP client, and the image OCR
/// collaborator. Lock scopes on `db` must not span an await point.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub image_ocr: Arc<dyn ImageOcr>,
}

impl ApiContext {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            image_ocr: Arc::new(TextPassthroughOcr),
        }
    }

    /// Store access for request handlers.
    pub fn store(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("store lock poisoned".into()))
    }

    /// Context over an in-memory store with credential-free config, so
    /// no test path reaches the network.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let conn = crate::db::open_memory_database().expect("in-memory database");
        Self::new(conn, AppConfig::for_tests())
    }
}
