use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::weatherbit::WeatherbitClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::WeatherService;

/// Build a shared HTTP client with reasonable defaults for provider calls.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Skycast/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub weatherbit: Arc<WeatherbitClient>,

    pub weather: Arc<WeatherService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client =
            build_shared_http_client(config.provider.request_timeout_seconds.into())?;
        let weatherbit = Arc::new(WeatherbitClient::with_shared_client(
            http_client,
            &config.provider,
        ));

        let weather = Arc::new(WeatherService::new(
            store.clone(),
            weatherbit.clone(),
            config.cache.freshness_minutes,
            config.provider.forecast_days,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            weatherbit,
            weather,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
