use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::app::error::{EstuaryError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::ingest::Ingestor;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub ingestor: Ingestor,
    pub config: Mutex<Config>,
    config_path: Option<PathBuf>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let config_path = Config::default_config_path()?;
        let config = Config::load(&config_path)?;

        let db_path = match db_path.or_else(|| config.db_path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new());

        Ok(Self {
            store,
            fetcher,
            ingestor: Ingestor::new(),
            config: Mutex::new(config),
            config_path: Some(config_path),
        })
    }

    pub fn in_memory(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);

        Ok(Self {
            store,
            fetcher,
            ingestor: Ingestor::new(),
            config: Mutex::new(Config::default()),
            config_path: None,
        })
    }

    /// Persist `name` as the current user in the loaded config file.
    pub fn set_current_user(&self, name: &str) -> Result<()> {
        let mut config = self
            .config
            .lock()
            .map_err(|e| EstuaryError::Config(e.to_string()))?;
        config.current_user = Some(name.to_string());

        if let Some(path) = &self.config_path {
            config.save(path)?;
        }
        Ok(())
    }

    pub fn current_user_name(&self) -> Result<Option<String>> {
        let config = self
            .config
            .lock()
            .map_err(|e| EstuaryError::Config(e.to_string()))?;
        Ok(config.current_user.clone())
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| EstuaryError::Config("Could not find data directory".into()))?;
        let estuary_dir = data_dir.join("estuary");
        std::fs::create_dir_all(&estuary_dir)?;
        Ok(estuary_dir.join("estuary.db"))
    }
}
