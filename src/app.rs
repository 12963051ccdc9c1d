//! Process-wide wiring: config, local store, remote client, session and
//! engine, built once per invocation.

use tracing::{debug, info};

use crate::cli::Cli;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::Result;
use crate::model::UserId;
use crate::remote::HttpRemoteStore;
use crate::session::SessionHandle;
use crate::storage::SqliteStore;
use crate::sync::SyncEngine;

pub type AppEngine = SyncEngine<SqliteStore, HttpRemoteStore, SessionHandle, SystemClock>;

pub struct AppContext {
    pub robot_mode: bool,
    pub config: Config,
    pub session: SessionHandle,
    pub engine: AppEngine,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = Config::load(cli.config.as_deref())?;
        Self::build(config, cli.robot, cli.offline)
    }

    pub fn build(config: Config, robot_mode: bool, offline: bool) -> Result<Self> {
        let local = SqliteStore::open(config.db_path())?;
        debug!(path = %config.db_path().display(), "local store opened");

        let remote = if offline || !config.remote.enabled {
            None
        } else {
            let env = |key: &str| std::env::var(key).ok();
            let base_url = config.remote.base_url.clone().unwrap_or_default();
            Some(
                HttpRemoteStore::new(base_url, config.remote.api_key(&env))?
                    .with_project(config.remote.project.clone()),
            )
        };

        let session = config
            .session
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(SessionHandle::anonymous, |id| {
                SessionHandle::signed_in(UserId::new(id))
            });

        info!(
            remote = remote.is_some(),
            signed_in = config.session.user_id.is_some(),
            "context ready"
        );

        let engine = SyncEngine::new(
            local,
            remote,
            session.clone(),
            SystemClock,
            config.sync_options(),
        );

        Ok(Self {
            robot_mode,
            config,
            session,
            engine,
        })
    }
}
