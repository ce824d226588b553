use crate::config::{DatabaseConfig, IsolationLevel};
use crate::error::{AppError, Result};
use crate::models::{FieldChanges, Incident, IncidentSource, IncidentStatus};
use crate::state::{IncidentRepository, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

const INCIDENT_COLUMNS: &str = "id, description, status, source, created_at";

/// Opens one PostgreSQL transaction per unit of work
#[derive(Clone)]
pub struct PgUnitOfWorkFactory {
    pool: PgPool,
    isolation_level: IsolationLevel,
}

impl PgUnitOfWorkFactory {
    pub fn new(pool: PgPool, isolation_level: IsolationLevel) -> Self {
        Self {
            pool,
            isolation_level,
        }
    }

    /// Build the connection pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options: PgConnectOptions = config
            .url()
            .parse()
            .map_err(|e| AppError::Configuration(format!("Invalid database URL: {}", e)))?;

        if config.schema != "public" {
            options = options.options([("search_path", config.schema.as_str())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        tracing::info!(
            host = %config.host,
            database = %config.name,
            schema = %config.schema,
            max_connections = config.max_connections,
            isolation_level = ?config.isolation_level,
            "Connected to PostgreSQL"
        );

        Ok(Self::new(pool, config.isolation_level))
    }

    /// Apply the embedded migrations
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations completed successfully");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    /// Start a transaction at the configured isolation level
    pub async fn begin_transaction(&self) -> Result<PgUnitOfWork> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(self.isolation_level.as_sql())
            .execute(&mut *tx)
            .await?;

        Ok(PgUnitOfWork { tx })
    }
}

#[async_trait]
impl UnitOfWorkFactory for PgUnitOfWorkFactory {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(self.begin_transaction().await?))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Unit of work backed by a single PostgreSQL transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    /// The underlying transaction, for statements outside the repository
    pub fn transaction(&mut self) -> &mut Transaction<'static, Postgres> {
        &mut self.tx
    }
}

#[derive(Debug, FromRow)]
struct IncidentRow {
    id: Uuid,
    description: String,
    status: String,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IncidentRow> for Incident {
    type Error = AppError;

    fn try_from(row: IncidentRow) -> Result<Self> {
        let status: IncidentStatus = row.status.parse().map_err(|_| {
            AppError::Store(format!(
                "unknown status '{}' stored for incident {}",
                row.status, row.id
            ))
        })?;
        let source: IncidentSource = row.source.parse().map_err(|_| {
            AppError::Store(format!(
                "unknown source '{}' stored for incident {}",
                row.source, row.id
            ))
        })?;

        Ok(Incident {
            id: row.id,
            description: row.description,
            status,
            source,
            created_at: row.created_at,
        })
    }
}

fn into_incidents(rows: Vec<IncidentRow>) -> Result<Vec<Incident>> {
    rows.into_iter().map(Incident::try_from).collect()
}

#[async_trait]
impl IncidentRepository for PgUnitOfWork {
    async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Incident>> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {} FROM incidents WHERE id = $1",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Incident::try_from).transpose()
    }

    async fn list_all(&mut self) -> Result<Vec<Incident>> {
        let rows = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {} FROM incidents ORDER BY created_at DESC, id",
            INCIDENT_COLUMNS
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        into_incidents(rows)
    }

    async fn list_by_status(&mut self, status: IncidentStatus) -> Result<Vec<Incident>> {
        let rows = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {} FROM incidents WHERE status = $1 ORDER BY created_at DESC, id",
            INCIDENT_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&mut *self.tx)
        .await?;

        into_incidents(rows)
    }

    async fn create(
        &mut self,
        description: String,
        status: IncidentStatus,
        source: IncidentSource,
    ) -> Result<Incident> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "INSERT INTO incidents (id, description, status, source) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(description)
        .bind(status.as_str())
        .bind(source.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        let incident = Incident::try_from(row)?;
        tracing::debug!(incident_id = %incident.id, "Incident inserted");
        Ok(incident)
    }

    async fn update(&mut self, id: Uuid, changes: FieldChanges) -> Result<Option<Incident>> {
        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "SELECT {} FROM incidents WHERE id = $1 FOR UPDATE",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut incident = Incident::try_from(row)?;
        incident.apply_changes(&changes)?;

        let row = sqlx::query_as::<_, IncidentRow>(&format!(
            "UPDATE incidents SET description = $2, status = $3, source = $4, created_at = $5 \
             WHERE id = $1 RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .bind(&incident.description)
        .bind(incident.status.as_str())
        .bind(incident.source.as_str())
        .bind(incident.created_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        tracing::debug!(incident_id = %id, "Incident updated");
        row.map(Incident::try_from).transpose()
    }

    async fn delete(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM incidents WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        tracing::debug!(incident_id = %id, rows = result.rows_affected(), "Incident deleted");
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn incidents(&mut self) -> &mut dyn IncidentRepository {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
