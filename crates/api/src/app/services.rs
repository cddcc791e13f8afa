use std::sync::Arc;

use partyhub_infra::{InMemoryPartyStore, PartyService, PartyStore, PostgresPartyStore, StoreError};

use crate::config::AppConfig;

/// Shared store handle: Postgres in production, in-memory for dev/test.
pub type SharedPartyStore = Arc<dyn PartyStore>;

/// Services shared by every handler (injected via `Extension<Arc<AppServices>>`).
#[derive(Clone)]
pub struct AppServices {
    pub parties: PartyService<SharedPartyStore>,
}

impl AppServices {
    pub fn new(store: SharedPartyStore) -> Self {
        Self {
            parties: PartyService::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryPartyStore::arc())
    }
}

/// Wire services for the configured backend.
///
/// With `DATABASE_URL` set the pool is opened and the schema applied before serving.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store =
                PostgresPartyStore::connect(url, config.database_max_connections).await?;
            store.migrate().await?;
            tracing::info!(
                max_connections = config.database_max_connections,
                "using postgres party store"
            );
            Ok(AppServices::new(Arc::new(store)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory party store");
            Ok(AppServices::in_memory())
        }
    }
}
