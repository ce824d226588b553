use crate::error::Result;
use crate::models::{FieldChanges, Incident, IncidentSource, IncidentStatus};
use crate::state::{sort_newest_first, IncidentRepository, UnitOfWork, UnitOfWorkFactory};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// In-memory incident store (for development and testing)
#[derive(Clone)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<Uuid, Incident>>,
    commits: Arc<AtomicUsize>,
    rollbacks: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            incidents: Arc::new(DashMap::new()),
            commits: Arc::new(AtomicUsize::new(0)),
            rollbacks: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a unit of work over this store
    pub fn unit_of_work(&self) -> InMemoryUnitOfWork {
        InMemoryUnitOfWork {
            store: self.clone(),
            pending: HashMap::new(),
        }
    }

    /// Seed an incident directly, bypassing any unit of work
    pub fn insert(&self, incident: Incident) {
        self.incidents.insert(incident.id, incident);
    }

    /// Committed state of one incident
    pub fn get(&self, id: &Uuid) -> Option<Incident> {
        self.incidents.get(id).map(|entry| entry.clone())
    }

    pub fn clear(&self) {
        self.incidents.clear();
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Number of units of work committed against this store
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of units of work rolled back against this store
    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(self.unit_of_work()))
    }

    fn backend(&self) -> &'static str {
        "in_memory"
    }
}

/// Session over an [`InMemoryStore`].
///
/// Writes are buffered in `pending` (`None` marks a delete) and only published
/// to the shared map on commit. Reads see committed rows overlaid with this
/// session's own writes.
pub struct InMemoryUnitOfWork {
    store: InMemoryStore,
    pending: HashMap<Uuid, Option<Incident>>,
}

impl InMemoryUnitOfWork {
    fn visible(&self) -> Vec<Incident> {
        let mut incidents: Vec<Incident> = self
            .store
            .incidents
            .iter()
            .filter(|entry| !self.pending.contains_key(entry.key()))
            .map(|entry| entry.value().clone())
            .collect();

        incidents.extend(self.pending.values().flatten().cloned());
        incidents
    }

    fn lookup(&self, id: &Uuid) -> Option<Incident> {
        match self.pending.get(id) {
            Some(staged) => staged.clone(),
            None => self.store.get(id),
        }
    }
}

#[async_trait]
impl IncidentRepository for InMemoryUnitOfWork {
    async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Incident>> {
        Ok(self.lookup(&id))
    }

    async fn list_all(&mut self) -> Result<Vec<Incident>> {
        let mut incidents = self.visible();
        sort_newest_first(&mut incidents);
        Ok(incidents)
    }

    async fn list_by_status(&mut self, status: IncidentStatus) -> Result<Vec<Incident>> {
        let mut incidents: Vec<Incident> = self
            .visible()
            .into_iter()
            .filter(|incident| incident.status == status)
            .collect();
        sort_newest_first(&mut incidents);
        Ok(incidents)
    }

    async fn create(
        &mut self,
        description: String,
        status: IncidentStatus,
        source: IncidentSource,
    ) -> Result<Incident> {
        let mut incident = Incident::new(description, source);
        incident.status = status;

        self.pending.insert(incident.id, Some(incident.clone()));
        tracing::debug!(incident_id = %incident.id, "Incident staged for insert");
        Ok(incident)
    }

    async fn update(&mut self, id: Uuid, changes: FieldChanges) -> Result<Option<Incident>> {
        let Some(mut incident) = self.lookup(&id) else {
            return Ok(None);
        };

        incident.apply_changes(&changes)?;
        self.pending.insert(id, Some(incident.clone()));
        tracing::debug!(incident_id = %id, "Incident staged for update");
        Ok(Some(incident))
    }

    async fn delete(&mut self, id: Uuid) -> Result<bool> {
        if self.lookup(&id).is_none() {
            return Ok(false);
        }

        self.pending.insert(id, None);
        tracing::debug!(incident_id = %id, "Incident staged for delete");
        Ok(true)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    fn incidents(&mut self) -> &mut dyn IncidentRepository {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork { store, pending } = *self;
        let changed = pending.len();

        for (id, staged) in pending {
            match staged {
                Some(incident) => {
                    store.incidents.insert(id, incident);
                }
                None => {
                    store.incidents.remove(&id);
                }
            }
        }

        store.commits.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(changed, "In-memory unit of work committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            discarded = self.pending.len(),
            "In-memory unit of work rolled back"
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "in_memory"
    }
}
