//! Wiring shared by every command: config, storage, backend and session

use anyhow::{Context, Result};
use ncuacg_chat_backend::HttpChatBackend;
use ncuacg_chat_core::config::{Config, ConfigLoader};
use ncuacg_chat_core::persona::PersonaCatalog;
use ncuacg_chat_core::storage::open_store;
use ncuacg_chat_core::utils::expand_tilde;
use ncuacg_chat_session::{ChatSession, SessionOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub struct App {
    pub loader: ConfigLoader,
    pub config: Config,
    pub catalog: PersonaCatalog,
    pub backend: Arc<HttpChatBackend>,
    pub session: ChatSession,
}

impl App {
    pub fn load(config_dir: Option<PathBuf>) -> Result<Self> {
        let loader = match config_dir {
            Some(dir) => ConfigLoader::with_dir(dir),
            None => ConfigLoader::new(),
        };
        let config = loader.load().context("failed to load configuration")?;
        Self::from_config(loader, config)
    }

    pub fn from_config(loader: ConfigLoader, config: Config) -> Result<Self> {
        let catalog = load_catalog(&config)?;
        let backend = Arc::new(
            HttpChatBackend::from_config(&config.assistant)
                .context("failed to create assistant client")?,
        );
        debug!("Chat endpoint: {}", backend.chat_url());

        let store = open_store(&config.storage);
        let session = ChatSession::new(
            backend.clone(),
            store,
            SessionOptions::from(&config.assistant),
        );

        Ok(Self {
            loader,
            config,
            catalog,
            backend,
            session,
        })
    }

    /// `"Display Name (id)"`, or a note that the server picks
    pub fn persona_label(&self, id: &str) -> String {
        if id.is_empty() {
            return "server default".to_string();
        }
        let name = self.catalog.display_name(id);
        if name == id {
            id.to_string()
        } else {
            format!("{} ({})", name, id)
        }
    }
}

fn load_catalog(config: &Config) -> Result<PersonaCatalog> {
    match config.assistant.catalog_path.as_deref() {
        Some(path) => {
            let path = expand_tilde(path);
            PersonaCatalog::load(&path)
                .with_context(|| format!("failed to load persona catalog {}", path.display()))
        }
        None => Ok(PersonaCatalog::builtin()),
    }
}
