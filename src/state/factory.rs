use crate::config::{DatabaseConfig, StoreBackend};
use crate::error::Result;
use crate::state::{InMemoryStore, PgUnitOfWorkFactory, UnitOfWorkFactory};
use std::sync::Arc;

/// Create a unit-of-work factory based on configuration
pub async fn create_unit_of_work_factory(
    config: &DatabaseConfig,
) -> Result<Arc<dyn UnitOfWorkFactory>> {
    match config.backend {
        StoreBackend::Postgres => {
            tracing::info!(
                host = %config.host,
                port = config.port,
                database = %config.name,
                "Initializing PostgreSQL storage backend"
            );

            let factory = PgUnitOfWorkFactory::connect(config).await?;
            if config.run_migrations {
                factory.run_migrations().await?;
            } else {
                tracing::info!("Skipping database migrations");
            }

            Ok(Arc::new(factory))
        }

        StoreBackend::InMemory => Ok(create_in_memory_factory()),
    }
}

/// Create an in-memory factory (for testing and development)
pub fn create_in_memory_factory() -> Arc<dyn UnitOfWorkFactory> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_create_in_memory_factory() {
        let factory = create_in_memory_factory();
        assert_eq!(factory.backend(), "in_memory");

        let mut uow = factory.begin().await.unwrap();
        // Should be able to use the repository
        assert!(uow.incidents().list_all().await.unwrap().is_empty());
        uow.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_config_selects_in_memory_backend() {
        let mut config = Config::default().database;
        config.backend = StoreBackend::InMemory;

        let factory = create_unit_of_work_factory(&config).await.unwrap();
        assert_eq!(factory.backend(), "in_memory");
    }

    #[tokio::test]
    async fn test_postgres_rejects_malformed_url() {
        let mut config = Config::default().database;
        config.backend = StoreBackend::Postgres;
        config.url = Some("not a url".to_string());

        let result = create_unit_of_work_factory(&config).await;
        assert!(matches!(
            result,
            Err(crate::error::AppError::Configuration(_))
        ));
    }
}
