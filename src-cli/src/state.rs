//! Application state shared by all subcommands.

use anyhow::Context;
use scoutline_browser::BrowserEngine;
use scoutline_core::AppConfig;
use scoutline_db::Database;
use scoutline_scraper::{HttpClient, ScrapeOrchestrator};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Loaded configuration, the open catalog and the browser session.
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<Database>,

    /// Shared browser engine.
    ///
    /// Lazily launched on first use so catalog-only commands never need
    /// Chromium.
    browser: Mutex<Option<Arc<BrowserEngine>>>,
}

impl AppState {
    /// Load configuration and open the catalog database.
    pub async fn open(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_config(config_path)?;
        let db_path = config.database_path()?;
        tracing::info!("Catalog database: {}", db_path.display());

        let db = Database::new(&db_path)
            .await
            .with_context(|| format!("failed to open catalog at {}", db_path.display()))?;
        db.run_migrations().await?;

        Ok(Self::with_database(config, db))
    }

    #[must_use]
    pub fn with_database(config: AppConfig, db: Database) -> Self {
        Self {
            config,
            db: Arc::new(db),
            browser: Mutex::new(None),
        }
    }

    /// Build an orchestrator over the browser session, launching it if needed.
    pub async fn orchestrator(&self, cancel: CancellationToken) -> anyhow::Result<ScrapeOrchestrator> {
        let browser = {
            let mut slot = self.browser.lock().await;
            match slot.as_ref() {
                Some(engine) => engine.clone(),
                None => {
                    let engine = Arc::new(
                        BrowserEngine::launch(&self.config.browser)
                            .await
                            .context("failed to launch browser")?,
                    );
                    *slot = Some(engine.clone());
                    engine
                }
            }
        };
        let http = Arc::new(HttpClient::new(&self.config.site.base_url, &self.config.scraping)?);

        Ok(ScrapeOrchestrator::new(
            &self.config,
            browser.clone(),
            browser,
            http,
            self.db.clone(),
        )
        .with_cancellation(cancel))
    }

    /// Close the browser session and the database.
    pub async fn shutdown(self) {
        if let Some(engine) = self.browser.into_inner() {
            match Arc::try_unwrap(engine) {
                Ok(engine) => {
                    if let Err(e) = engine.close().await {
                        tracing::warn!("Failed to close browser: {}", e);
                    }
                }
                Err(_) => tracing::warn!("Browser still in use at shutdown"),
            }
        }
        match Arc::try_unwrap(self.db) {
            Ok(db) => db.close().await,
            Err(_) => tracing::debug!("Database still shared at shutdown"),
        }
    }
}

/// Load an explicit config file, or the default one, then apply env overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            AppConfig::load_from(path)?
        }
        None => AppConfig::load()?,
    }
    .with_env_overrides();

    config.validate()?;
    Ok(config)
}
