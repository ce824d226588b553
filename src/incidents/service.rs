use crate::error::{AppError, Result};
use crate::metrics::{INCIDENTS_CREATED_TOTAL, STATUS_TRANSITIONS_TOTAL};
use crate::models::{
    field_change, CreateIncident, DescriptionUpdate, Incident, IncidentStatus,
};
use crate::state::{scoped, UnitOfWork};
use uuid::Uuid;
use validator::Validate;

/// Business rules of the incident lifecycle.
///
/// A service wraps exactly one unit of work and every operation consumes it,
/// so each request builds a fresh service from a freshly begun unit of work.
/// Every operation commits once on success and rolls back once on failure.
pub struct IncidentService {
    uow: Box<dyn UnitOfWork>,
}

impl IncidentService {
    pub fn new(uow: Box<dyn UnitOfWork>) -> Self {
        Self { uow }
    }

    /// Create a new incident. The status always starts as `Open`.
    pub async fn create(self, input: CreateIncident) -> Result<Incident> {
        let incident = scoped(self.uow, move |repo| {
            Box::pin(async move {
                input.validate()?;
                repo.create(input.description, IncidentStatus::Open, input.source)
                    .await
            })
        })
        .await?;

        INCIDENTS_CREATED_TOTAL
            .with_label_values(&[incident.source.as_str()])
            .inc();
        tracing::info!(
            incident_id = %incident.id,
            source = %incident.source,
            "Incident created"
        );

        Ok(incident)
    }

    /// Get an incident by ID
    pub async fn get_by_id(self, id: Uuid) -> Result<Incident> {
        tracing::debug!(incident_id = %id, "Fetching incident");

        scoped(self.uow, move |repo| {
            Box::pin(async move {
                repo.get_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))
            })
        })
        .await
    }

    /// All incidents, newest first
    pub async fn list_all(self) -> Result<Vec<Incident>> {
        let incidents = scoped(self.uow, |repo| Box::pin(async move { repo.list_all().await })).await?;

        tracing::debug!(count = incidents.len(), "Listed incidents");
        Ok(incidents)
    }

    /// Incidents in `status`, newest first
    pub async fn list_by_status(self, status: IncidentStatus) -> Result<Vec<Incident>> {
        let incidents = scoped(self.uow, move |repo| {
            Box::pin(async move { repo.list_by_status(status).await })
        })
        .await?;

        tracing::debug!(status = %status, count = incidents.len(), "Listed incidents by status");
        Ok(incidents)
    }

    /// Move an incident along one edge of the lifecycle
    pub async fn update_status(self, id: Uuid, new_status: IncidentStatus) -> Result<Incident> {
        let (previous, updated) = scoped(self.uow, move |repo| {
            Box::pin(async move {
                let current = repo
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))?;

                if !current.status.can_transition_to(new_status) {
                    record_transition(current.status, new_status, "rejected");
                    tracing::warn!(
                        incident_id = %id,
                        from = %current.status,
                        to = %new_status,
                        "Status transition rejected"
                    );
                    return Err(AppError::InvalidTransition {
                        from: current.status,
                        to: new_status,
                    });
                }

                let updated = repo
                    .update_status(id, new_status)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))?;

                Ok((current.status, updated))
            })
        })
        .await?;

        record_transition(previous, updated.status, "applied");
        tracing::info!(
            incident_id = %id,
            from = %previous,
            to = %updated.status,
            "Incident status updated"
        );

        Ok(updated)
    }

    /// Rewrite the description of a non-terminal incident
    pub async fn update_description(self, id: Uuid, new_description: String) -> Result<Incident> {
        let updated = scoped(self.uow, move |repo| {
            Box::pin(async move {
                let input = DescriptionUpdate { new_description };
                input.validate()?;

                let current = repo
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))?;

                if !current.is_editable() {
                    tracing::warn!(
                        incident_id = %id,
                        status = %current.status,
                        "Description update rejected"
                    );
                    return Err(AppError::InvalidOperation(format!(
                        "Cannot update description for incident with status {}",
                        current.status
                    )));
                }

                let changes = field_change("description", input.new_description)?;
                repo.update(id, changes)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))
            })
        })
        .await?;

        tracing::info!(incident_id = %id, "Incident description updated");
        Ok(updated)
    }

    /// Delete a resolved or cancelled incident.
    ///
    /// Returns `false` only if the record disappeared between the eligibility
    /// check and the delete.
    pub async fn delete(self, id: Uuid) -> Result<bool> {
        let deleted = scoped(self.uow, move |repo| {
            Box::pin(async move {
                let current = repo
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::incident_not_found(&id))?;

                if !current.is_deletable() {
                    tracing::warn!(
                        incident_id = %id,
                        status = %current.status,
                        "Delete rejected"
                    );
                    return Err(AppError::InvalidOperation(format!(
                        "Cannot delete incident with status {}. Only resolved or cancelled incidents can be deleted.",
                        current.status
                    )));
                }

                repo.delete(id).await
            })
        })
        .await?;

        tracing::info!(incident_id = %id, deleted, "Incident delete finished");
        Ok(deleted)
    }
}

fn record_transition(from: IncidentStatus, to: IncidentStatus, outcome: &str) {
    STATUS_TRANSITIONS_TOTAL
        .with_label_values(&[from.as_str(), to.as_str(), outcome])
        .inc();
}
