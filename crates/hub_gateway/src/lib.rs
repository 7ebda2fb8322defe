//! # Hub Gateway
//!
//! Persistence gateways for classified road records.
//!
//! - `SqliteHubGateway`: `agent_data` table, upsert by id
//! - `LogHubGateway`: tracing only
//! - `HubStore`: either of the above, chosen from `StorageConfig`

mod error;
mod stores;

use contracts::{ClassifiedRecord, PersistenceGateway, StorageBackend, StorageConfig};
use tracing::{info, instrument};

pub use error::{HubError, Result};
pub use stores::{LogHubGateway, SqliteHubGateway};

/// Store selected by configuration
pub enum HubStore {
    Sqlite(SqliteHubGateway),
    Log(LogHubGateway),
}

impl HubStore {
    /// Build the configured store
    #[instrument(name = "hub_store_from_config", skip(config), fields(backend = ?config.backend))]
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let store = match config.backend {
            StorageBackend::Sqlite => Self::Sqlite(SqliteHubGateway::open(&config.path)?),
            StorageBackend::Log => Self::Log(LogHubGateway::default()),
        };
        info!(store = %store.name(), "hub store ready");
        Ok(store)
    }

    /// SQLite handle, when that backend is in use
    pub fn as_sqlite(&self) -> Option<&SqliteHubGateway> {
        match self {
            Self::Sqlite(store) => Some(store),
            Self::Log(_) => None,
        }
    }
}

impl PersistenceGateway for HubStore {
    fn name(&self) -> &str {
        match self {
            Self::Sqlite(store) => store.name(),
            Self::Log(store) => store.name(),
        }
    }

    async fn save(&mut self, record: &ClassifiedRecord) -> bool {
        match self {
            Self::Sqlite(store) => store.save(record).await,
            Self::Log(store) => store.save(record).await,
        }
    }

    async fn close(&mut self) {
        match self {
            Self::Sqlite(store) => store.close().await,
            Self::Log(store) => store.close().await,
        }
    }
}
