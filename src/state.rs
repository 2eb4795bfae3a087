use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::predictor::ModelSet;

/// Process-lifetime resources: the pooled store and the loaded model set.
/// Models are deserialized exactly once, here, so initialization order is
/// explicit and failures abort startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub models: Arc<ModelSet>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let models = Arc::new(ModelSet::load(&config.models)?);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            models,
        })
    }
}
