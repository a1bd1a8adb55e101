use std::sync::Arc;

use crate::{
    config::{Config, DianMode},
    db::connection::DbPool,
    services::dian::{DianClient, HttpDianClient, SimulatedDianClient},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub dian_client: Arc<dyn DianClient>,
}

impl AppState {
    /// Builds the state with the DIAN client selected by `DIAN_MODE`.
    pub fn new(pool: DbPool, config: Config) -> anyhow::Result<Self> {
        let dian_client: Arc<dyn DianClient> = match config.dian.mode {
            DianMode::Simulated => Arc::new(SimulatedDianClient),
            DianMode::Http => Arc::new(HttpDianClient::from_settings(&config.dian)?),
        };
        Ok(Self::with_dian_client(pool, config, dian_client))
    }

    pub fn with_dian_client(
        pool: DbPool,
        config: Config,
        dian_client: Arc<dyn DianClient>,
    ) -> Self {
        Self {
            pool,
            config,
            dian_client,
        }
    }
}
