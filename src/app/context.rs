use crate::config::Config;
use crate::domain::SessionId;
use crate::paths;
use crate::restore::DetachedSpawner;
use crate::store::{FileSessionStore, SessionStore};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Everything a command needs: resolved home, loaded config and the store.
pub struct AppContext {
    pub home: PathBuf,
    pub config: Config,
    pub store: FileSessionStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let home = paths::ensure_home_dir()?;
        let config = Config::load(&paths::config_path(&home))?;
        let store = FileSessionStore::new(&home);
        Ok(Self {
            home,
            config,
            store,
        })
    }

    /// The session treated as current by one-shot commands: the live browser
    /// session, if one is running.
    pub fn current_session(&self) -> Option<SessionId> {
        match self.store.get_active_session() {
            Ok(session) => session.map(|s| s.id),
            Err(e) => {
                tracing::warn!(error = %e, "could not determine the active session");
                None
            }
        }
    }

    /// Spawner for resumed sessions: the configured browser command when
    /// set, otherwise this executable.
    pub fn spawner(&self) -> Result<DetachedSpawner> {
        let executable = match &self.config.session.browser_command {
            Some(command) => which::which(command)
                .with_context(|| format!("Browser command not found: {}", command))?,
            None => std::env::current_exe()
                .or_else(|_| which::which("paneweave"))
                .context("Failed to locate the paneweave executable")?,
        };
        let spawner = DetachedSpawner::new(executable);
        tracing::debug!(executable = %spawner.executable().display(), "resume spawner configured");
        Ok(spawner)
    }
}
