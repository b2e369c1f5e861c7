use epicevents_auth::authorize::{authorize_event_creation, require_event_update};
use epicevents_auth::{Department, EventScope, EventView};
use epicevents_core::{DomainResult, EventId};
use epicevents_crm::{Event, EventPatch, NewEvent};
use epicevents_infra::Database;

use super::ensure_department;
use crate::App;

pub struct EventService<'a, D> {
    app: &'a App<D>,
}

impl<'a, D> EventService<'a, D>
where
    D: Database,
{
    pub(crate) fn new(app: &'a App<D>) -> Self {
        Self { app }
    }

    /// Events visible to the caller. `view` only narrows SUPPORT.
    pub fn list(&self, token: &str, view: EventView) -> DomainResult<Vec<Event>> {
        self.app.read_as("events.list", token, |p, t| {
            let scope = EventScope::resolve(p, view);
            Ok(t.events
                .values()
                .filter(|e| scope.admits(e.contact_support_id.as_ref()))
                .cloned()
                .collect())
        })
    }

    pub fn get(&self, token: &str, id: &EventId) -> DomainResult<Event> {
        self.app
            .read_as("events.get", token, |_, t| t.event(id).cloned())
    }

    pub fn create(&self, token: &str, new: NewEvent) -> DomainResult<Event> {
        self.app.write_as("events.create", token, |p, t| {
            let support = authorize_event_creation(p, new.contact_support_id)?;
            if let Some(support) = &support {
                ensure_department(t, support, Department::Support, "event support contact")?;
            }
            t.contract(&new.contract_id)?;

            let event = Event::create(NewEvent {
                contact_support_id: support,
                ..new
            })?;
            t.save_event(event.clone())?;
            tracing::info!(event_id = %event.id, contract_id = %event.contract_id, created_by = %p.employee_id, "event created");
            Ok((event, Vec::new()))
        })
    }

    pub fn update(&self, token: &str, id: &EventId, patch: EventPatch) -> DomainResult<Event> {
        self.app.write_as("events.update", token, |p, t| {
            let mut event = t.event(id)?.clone();
            let reassigns = patch.reassigns_support(event.contact_support_id);
            require_event_update(p, event.contact_support_id.as_ref(), reassigns)?;
            if let Some(Some(support)) = &patch.contact_support_id {
                ensure_department(t, support, Department::Support, "event support contact")?;
            }

            event.apply_patch(patch)?;
            t.save_event(event.clone())?;
            tracing::info!(event_id = %event.id, updated_by = %p.employee_id, "event updated");
            Ok((event, Vec::new()))
        })
    }
}
