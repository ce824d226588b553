pub mod store;
pub mod postgres;
pub mod unit_of_work;
pub mod factory;

pub use store::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PgUnitOfWork, PgUnitOfWorkFactory};
pub use unit_of_work::{scoped, UnitOfWork, UnitOfWorkFactory};
pub use factory::{create_unit_of_work_factory, create_in_memory_factory};

use crate::error::Result;
use crate::models::{FieldChanges, Incident, IncidentSource, IncidentStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Data access for incidents inside one transactional session.
///
/// Every method runs against the session owned by the unit of work that handed
/// out the repository, so nothing is visible to other sessions until commit.
#[async_trait]
pub trait IncidentRepository: Send {
    /// Get an incident by ID
    async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Incident>>;

    /// All incidents, newest first
    async fn list_all(&mut self) -> Result<Vec<Incident>>;

    /// Incidents in the given status, newest first
    async fn list_by_status(&mut self, status: IncidentStatus) -> Result<Vec<Incident>>;

    /// Insert a new incident
    async fn create(
        &mut self,
        description: String,
        status: IncidentStatus,
        source: IncidentSource,
    ) -> Result<Incident>;

    /// Apply a partial update. Returns `None` if the incident does not exist.
    async fn update(&mut self, id: Uuid, changes: FieldChanges) -> Result<Option<Incident>>;

    /// Delete an incident. Returns `false` if it did not exist.
    async fn delete(&mut self, id: Uuid) -> Result<bool>;

    /// Overwrite only the status
    async fn update_status(
        &mut self,
        id: Uuid,
        status: IncidentStatus,
    ) -> Result<Option<Incident>> {
        let changes = crate::models::field_change("status", status)?;
        self.update(id, changes).await
    }
}

/// Newest first; ties broken by id so listings are stable
pub(crate) fn sort_newest_first(incidents: &mut [Incident]) {
    incidents.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
