// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use common::{Clock, SystemClock};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::AuthSettings;
use crate::config::Config;
use crate::gemini::{GeminiClient, TextGenerator};

/// Everything the handlers share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub auth: Arc<AuthSettings>,
    /// `None` when no provider key is configured.
    pub generator: Option<Arc<dyn TextGenerator>>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        auth: AuthSettings,
        generator: Option<Arc<dyn TextGenerator>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pool,
            auth: Arc::new(auth),
            generator,
            clock,
        }
    }

    /// Production wiring: wall-clock time and the Gemini client when a key is set.
    pub fn from_config(config: &Config, pool: SqlitePool) -> Self {
        let generator: Option<Arc<dyn TextGenerator>> = match &config.gemini_api_key {
            Some(key) => {
                info!("Text generation enabled via {}", config.gemini_api_url);
                Some(Arc::new(GeminiClient::new(config.gemini_api_url.clone(), key.clone())))
            }
            None => {
                warn!("GEMINI_API_KEY is not set; AI endpoints will answer 503.");
                None
            }
        };

        Self::new(
            pool,
            AuthSettings::new(&config.jwt_secret, config.bcrypt_cost),
            generator,
            Arc::new(SystemClock),
        )
    }
}
