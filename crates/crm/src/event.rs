use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{ContractId, DomainError, DomainResult, EmployeeId, Entity, EventId, fields};

/// A business event organised for a contract (at most one per contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub contract_id: ContractId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: String,
    pub attendees: Option<u32>,
    pub notes: Option<String>,
    /// Support employee in charge.
    pub contact_support_id: Option<EmployeeId>,
}

impl Event {
    pub fn create(new: NewEvent) -> DomainResult<Self> {
        check_window(new.starts_at, new.ends_at)?;

        Ok(Self {
            id: EventId::new(),
            name: fields::required("name", &new.name)?,
            contract_id: new.contract_id,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            location: fields::required("location", &new.location)?,
            attendees: new.attendees,
            notes: new.notes.as_deref().and_then(fields::optional),
            contact_support_id: new.contact_support_id,
        })
    }

    pub fn apply_patch(&mut self, patch: EventPatch) -> DomainResult<()> {
        if patch.is_empty() {
            return Err(DomainError::validation("nothing to update"));
        }

        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = fields::required("name", &name)?;
        }
        if let Some(starts_at) = patch.starts_at {
            next.starts_at = starts_at;
        }
        if let Some(ends_at) = patch.ends_at {
            next.ends_at = ends_at;
        }
        if let Some(location) = patch.location {
            next.location = fields::required("location", &location)?;
        }
        if let Some(attendees) = patch.attendees {
            next.attendees = Some(attendees);
        }
        if let Some(notes) = patch.notes {
            next.notes = fields::optional(&notes);
        }
        if let Some(contact) = patch.contact_support_id {
            next.contact_support_id = contact;
        }
        check_window(next.starts_at, next.ends_at)?;

        *self = next;
        Ok(())
    }
}

fn check_window(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> DomainResult<()> {
    if ends_at < starts_at {
        return Err(DomainError::validation("event ends before it starts"));
    }
    Ok(())
}

impl Entity for Event {
    type Id = EventId;

    const KIND: &'static str = "event";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub contract_id: ContractId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: String,
    pub attendees: Option<u32>,
    pub notes: Option<String>,
    pub contact_support_id: Option<EmployeeId>,
}

/// Allow-listed event update. The contract link cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Option<u32>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    /// `Some(None)` unassigns the support contact.
    pub contact_support_id: Option<Option<EmployeeId>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.location.is_none()
            && self.attendees.is_none()
            && self.notes.is_none()
            && self.contact_support_id.is_none()
    }

    pub fn reassigns_support(&self, current: Option<EmployeeId>) -> bool {
        self.contact_support_id.is_some_and(|next| next != current)
    }
}
