use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;
use validator::Validate;

/// Represents an incident in the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: Uuid,

    /// Free-text description
    pub description: String,

    /// Current lifecycle status
    pub status: IncidentStatus,

    /// Who reported the incident
    pub source: IncidentSource,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Create a new incident. New incidents always start out `Open`.
    pub fn new(description: String, source: IncidentSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
            status: IncidentStatus::Open,
            source,
            created_at: Utc::now(),
        }
    }

    /// Whether the description may still be edited
    pub fn is_editable(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Whether the record may be deleted
    pub fn is_deletable(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a partial update keyed by field name.
    ///
    /// Names that are not incident fields are skipped without error. `id` is the
    /// record key and is never rewritten. If any recognized field carries a value
    /// of the wrong shape nothing is applied.
    pub fn apply_changes(&mut self, changes: &FieldChanges) -> Result<()> {
        let mut next = self.clone();

        for (field, value) in changes {
            match field.as_str() {
                "description" => next.description = field_value(field, value)?,
                "status" => next.status = field_value(field, value)?,
                "source" => next.source = field_value(field, value)?,
                "created_at" => next.created_at = field_value(field, value)?,
                _ => {
                    tracing::trace!(field = %field, "Ignoring unknown incident field");
                }
            }
        }

        *self = next;
        Ok(())
    }
}

fn field_value<T: DeserializeOwned>(field: &str, value: &serde_json::Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Validation(format!("invalid value for field '{}': {}", field, e)))
}

/// Partial update payload: field name to new value
pub type FieldChanges = serde_json::Map<String, serde_json::Value>;

/// Build a single-field change set
pub fn field_change(field: &str, value: impl Serialize) -> Result<FieldChanges> {
    let mut changes = FieldChanges::new();
    changes.insert(field.to_string(), serde_json::to_value(value)?);
    Ok(changes)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    Open,
    InProgress,
    Waiting,
    Resolved,
    Cancelled,
}

impl IncidentStatus {
    /// Statuses reachable from this one in a single step
    pub fn allowed_transitions(self) -> &'static [IncidentStatus] {
        use IncidentStatus::*;
        match self {
            Open => &[InProgress, Cancelled],
            InProgress => &[Waiting, Resolved, Cancelled],
            Waiting => &[InProgress, Resolved, Cancelled],
            Resolved | Cancelled => &[],
        }
    }

    /// Check if a transition from this status to `target` is permitted.
    /// Staying in the same status is never a valid transition.
    pub fn can_transition_to(self, target: IncidentStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Terminal statuses have no outgoing edges
    pub fn is_terminal(self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentSource {
    Operator,
    Monitoring,
    Partner,
}

impl IncidentSource {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Input for creating an incident
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateIncident {
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
    pub source: IncidentSource,
}

/// Input for changing the status of an incident
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusUpdate {
    pub status: IncidentStatus,
}

/// Input for rewriting the description of an incident.
///
/// Edits are capped tighter than creation (500 vs 4000 characters).
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DescriptionUpdate {
    #[validate(length(min = 1, max = 500))]
    pub new_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_incident_creation() {
        let incident = Incident::new("Server down".to_string(), IncidentSource::Monitoring);

        assert_eq!(incident.status, IncidentStatus::Open);
        assert_eq!(incident.source, IncidentSource::Monitoring);
        assert!(incident.is_editable());
        assert!(!incident.is_deletable());
    }

    #[test]
    fn test_transition_table() {
        use IncidentStatus::*;

        let allowed = [
            (Open, InProgress),
            (Open, Cancelled),
            (InProgress, Waiting),
            (InProgress, Resolved),
            (InProgress, Cancelled),
            (Waiting, InProgress),
            (Waiting, Resolved),
            (Waiting, Cancelled),
        ];

        for from in IncidentStatus::iter() {
            for to in IncidentStatus::iter() {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_self_transitions_rejected() {
        for status in IncidentStatus::iter() {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_terminal_states_have_no_edges() {
        for status in IncidentStatus::iter() {
            assert_eq!(status.is_terminal(), status.allowed_transitions().is_empty());
        }
        assert!(IncidentStatus::Resolved.is_terminal());
        assert!(IncidentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(IncidentStatus::InProgress.as_str(), "in_progress");
        assert_eq!(
            "cancelled".parse::<IncidentStatus>().unwrap(),
            IncidentStatus::Cancelled
        );
        assert_eq!(json!(IncidentSource::Partner), json!("partner"));
        assert!("closed".parse::<IncidentStatus>().is_err());
    }

    #[test]
    fn test_apply_changes_ignores_unknown_fields() {
        let mut incident = Incident::new("Disk full".to_string(), IncidentSource::Operator);
        let original_id = incident.id;

        let changes = json!({
            "description": "Disk full on db-1",
            "severity": "p0",
            "id": Uuid::new_v4(),
        });
        incident
            .apply_changes(changes.as_object().unwrap())
            .unwrap();

        assert_eq!(incident.description, "Disk full on db-1");
        assert_eq!(incident.id, original_id);
    }

    #[test]
    fn test_apply_changes_is_all_or_nothing() {
        let mut incident = Incident::new("Disk full".to_string(), IncidentSource::Operator);
        let before = incident.clone();

        let changes = json!({
            "description": "changed",
            "status": "exploded",
        });
        let result = incident.apply_changes(changes.as_object().unwrap());

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(incident, before);
    }

    #[test]
    fn test_description_limits() {
        let create = CreateIncident {
            description: "x".repeat(4000),
            source: IncidentSource::Operator,
        };
        assert!(create.validate().is_ok());

        let too_long = CreateIncident {
            description: "x".repeat(4001),
            source: IncidentSource::Operator,
        };
        assert!(too_long.validate().is_err());

        let empty = CreateIncident {
            description: String::new(),
            source: IncidentSource::Operator,
        };
        assert!(empty.validate().is_err());

        let edit = DescriptionUpdate {
            new_description: "x".repeat(501),
        };
        assert!(edit.validate().is_err());

        let edit = DescriptionUpdate {
            new_description: "é".repeat(500),
        };
        assert!(edit.validate().is_ok());
    }
}
