use contextor::{CollectionHandle, Contextor};
use tokio::sync::RwLock;

use crate::error_handler::AppError;

/// Server settings read from the environment.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listen address, e.g. "127.0.0.1:8080".
    pub address: String,
    /// Run `ensure_index(false)` before accepting requests.
    pub index_on_start: bool,
}

impl ApiConfig {
    /// Variables: `API_ADDRESS` (default `127.0.0.1:8080`), `INDEX_ON_START`
    /// (default `true`).
    pub fn from_env() -> Result<Self, AppError> {
        let address = std::env::var("API_ADDRESS")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "127.0.0.1:8080".into());

        let index_on_start = match std::env::var("INDEX_ON_START") {
            Ok(v) => parse_bool(&v).ok_or_else(|| {
                AppError::Config(format!("INDEX_ON_START: expected a boolean, got `{v}`"))
            })?,
            Err(_) => true,
        };

        Ok(Self {
            address,
            index_on_start,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Shared state for all HTTP handlers.
///
/// `handle` is the live collection handle: an index run holds the write lock
/// for its whole duration, queries take the read lock.
pub struct AppState {
    pub contextor: Contextor,
    pub handle: RwLock<Option<CollectionHandle>>,
}

impl AppState {
    pub fn new(contextor: Contextor) -> Self {
        Self {
            contextor,
            handle: RwLock::new(None),
        }
    }
}
