use chrono::Utc;

use epicevents_auth::authorize::{authorize_client_creation, require_client_update};
use epicevents_auth::{ClientScope, Department};
use epicevents_core::{ClientId, DomainError, DomainResult};
use epicevents_crm::{Client, ClientPatch, NewClient};
use epicevents_infra::Database;

use super::ensure_department;
use crate::App;

pub struct ClientService<'a, D> {
    app: &'a App<D>,
}

impl<'a, D> ClientService<'a, D>
where
    D: Database,
{
    pub(crate) fn new(app: &'a App<D>) -> Self {
        Self { app }
    }

    /// Clients visible to the caller: COMMERCIAL sees their own, everyone else all.
    pub fn list(&self, token: &str) -> DomainResult<Vec<Client>> {
        self.app.read_as("clients.list", token, |p, t| {
            let scope = ClientScope::for_principal(p);
            Ok(t.clients
                .values()
                .filter(|c| scope.admits(c.commercial_id.as_ref()))
                .cloned()
                .collect())
        })
    }

    pub fn get(&self, token: &str, id: &ClientId) -> DomainResult<Client> {
        self.app.read_as("clients.get", token, |p, t| {
            let client = t.client(id)?;
            if !ClientScope::for_principal(p).admits(client.commercial_id.as_ref()) {
                return Err(DomainError::permission_denied("client is outside your portfolio"));
            }
            Ok(client.clone())
        })
    }

    pub fn create(&self, token: &str, new: NewClient) -> DomainResult<Client> {
        self.app.write_as("clients.create", token, |p, t| {
            let owner = authorize_client_creation(p, new.commercial_id)?;
            if let Some(owner) = &owner {
                ensure_department(t, owner, Department::Commercial, "client commercial")?;
            }

            let client = Client::create(NewClient { commercial_id: owner, ..new }, Utc::now())?;
            t.save_client(client.clone())?;
            tracing::info!(client_id = %client.id, created_by = %p.employee_id, "client created");
            Ok((client, Vec::new()))
        })
    }

    pub fn update(&self, token: &str, id: &ClientId, patch: ClientPatch) -> DomainResult<Client> {
        self.app.write_as("clients.update", token, |p, t| {
            let mut client = t.client(id)?.clone();
            let reassigns = patch.reassigns_owner(client.commercial_id);
            require_client_update(p, client.commercial_id.as_ref(), reassigns)?;
            if let Some(Some(owner)) = &patch.commercial_id {
                ensure_department(t, owner, Department::Commercial, "client commercial")?;
            }

            client.apply_patch(patch, Utc::now())?;
            t.save_client(client.clone())?;
            tracing::info!(client_id = %client.id, updated_by = %p.employee_id, "client updated");
            Ok((client, Vec::new()))
        })
    }
}
