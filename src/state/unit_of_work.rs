use crate::error::Result;
use crate::metrics::UNIT_OF_WORK_TOTAL;
use crate::state::IncidentRepository;
use async_trait::async_trait;
use futures::future::BoxFuture;

/// One transactional session exposing the incident repository.
///
/// `commit` and `rollback` consume the unit of work, so a session can only be
/// finished once and never reused for a second operation.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Repository bound to this session
    fn incidents(&mut self) -> &mut dyn IncidentRepository;

    /// Make every change of this session durable
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every change of this session
    async fn rollback(self: Box<Self>) -> Result<()>;

    /// Backend label used in logs and metrics
    fn backend(&self) -> &'static str;
}

/// Opens a fresh unit of work per request
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    fn backend(&self) -> &'static str;
}

/// Run `work` inside `uow`, committing on `Ok` and rolling back on `Err`.
///
/// The error returned by `work` is handed back untouched after the rollback. A
/// failing commit or rollback is returned as-is; when a rollback fails after
/// `work` already failed, the rollback error wins and the original is logged.
///
/// ```ignore
/// let incident = scoped(uow, move |repo| {
///     Box::pin(async move { repo.get_by_id(id).await })
/// })
/// .await?;
/// ```
pub async fn scoped<T, F>(mut uow: Box<dyn UnitOfWork>, work: F) -> Result<T>
where
    T: Send,
    F: for<'r> FnOnce(&'r mut dyn IncidentRepository) -> BoxFuture<'r, Result<T>> + Send,
{
    let backend = uow.backend();
    let outcome = work(uow.incidents()).await;

    match outcome {
        Ok(value) => match uow.commit().await {
            Ok(()) => {
                record(backend, "commit");
                tracing::debug!(backend, "Unit of work committed");
                Ok(value)
            }
            Err(commit_err) => {
                record(backend, "commit_failed");
                tracing::error!(backend, error = %commit_err, "Unit of work commit failed");
                Err(commit_err)
            }
        },
        Err(err) => match uow.rollback().await {
            Ok(()) => {
                record(backend, "rollback");
                tracing::debug!(backend, error = %err, "Unit of work rolled back");
                Err(err)
            }
            Err(rollback_err) => {
                record(backend, "rollback_failed");
                tracing::error!(
                    backend,
                    error = %err,
                    rollback_error = %rollback_err,
                    "Unit of work rollback failed"
                );
                Err(rollback_err)
            }
        },
    }
}

fn record(backend: &str, outcome: &str) {
    UNIT_OF_WORK_TOTAL
        .with_label_values(&[backend, outcome])
        .inc();
}
