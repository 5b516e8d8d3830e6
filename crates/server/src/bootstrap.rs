use std::sync::Arc;

use clusterpilot_agent::{enricher_from_config, AgentError, MessageEnricher};
use clusterpilot_core::config::{AppConfig, ConfigError, LoadOptions};
use clusterpilot_warehouse::{
    connect_with_config, migrations, ClusterSource, SqlClusterSource, WarehouseError,
    WarehousePool,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub pool: WarehousePool,
    pub source: Arc<dyn ClusterSource>,
    pub enricher: Option<Arc<MessageEnricher>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("warehouse connection failed: {0}")]
    WarehouseConnect(#[source] sqlx::Error),
    #[error("warehouse migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    #[error("llm enrichment setup failed: {0}")]
    Agent(#[from] AgentError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let pool =
        connect_with_config(&config.warehouse).await.map_err(BootstrapError::WarehouseConnect)?;
    info!(
        event_name = "system.bootstrap.warehouse_connected",
        correlation_id = "bootstrap",
        warehouse_table = %config.warehouse.table,
        "warehouse connection established"
    );

    migrations::run_pending(&pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "warehouse migrations applied"
    );

    let source = SqlClusterSource::new(pool.clone(), config.warehouse.table.clone())?;
    let enricher = enricher_from_config(&config.llm)?.map(Arc::new);
    info!(
        event_name = "system.bootstrap.enrichment_mode",
        correlation_id = "bootstrap",
        enrichment = if enricher.is_some() { "llm" } else { "disabled" },
        "message enrichment mode resolved"
    );

    Ok(Application { config, pool, source: Arc::new(source), enricher })
}

#[cfg(test)]
mod tests {
    use clusterpilot_core::config::{ConfigOverrides, LlmProvider, LoadOptions};
    use clusterpilot_warehouse::{load_segments, DemoClusters};

    use crate::bootstrap::bootstrap;

    fn overrides(warehouse_url: &str) -> ConfigOverrides {
        ConfigOverrides {
            warehouse_url: Some(warehouse_url.to_string()),
            ..ConfigOverrides::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_an_invalid_table_name() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                warehouse_table: Some("clusters; DROP TABLE x".to_string()),
                ..overrides("sqlite::memory:")
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("warehouse.table"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_rejects_gemini_without_an_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Gemini),
                ..overrides("sqlite::memory:")
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("llm.api_key"), "unexpected error: {message}");
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_seeded_clusters() {
        let app = bootstrap(LoadOptions {
            overrides: overrides("sqlite::memory:"),
            ..LoadOptions::default()
        })
        .await
        .expect("bootstrap should succeed with an in-memory warehouse");
        assert!(app.enricher.is_none());

        DemoClusters::load(&app.pool).await.expect("seed");
        let loaded = load_segments(app.source.as_ref(), chrono::Utc::now()).await.expect("load");
        assert_eq!(loaded.records.len(), DemoClusters::valid_cluster_ids().len());

        app.pool.close().await;
    }
}
