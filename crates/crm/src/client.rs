use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{ClientId, DomainError, DomainResult, EmployeeId, Entity, fields};

/// A customer, optionally assigned to a commercial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    /// Commercial in charge; decides who sees and edits the client.
    pub commercial_id: Option<EmployeeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn create(new: NewClient, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: ClientId::new(),
            full_name: fields::required("full name", &new.full_name)?,
            email: fields::email(&new.email)?,
            phone: new.phone.as_deref().and_then(fields::optional),
            company: fields::required("company", &new.company)?,
            commercial_id: new.commercial_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a patch atomically: on error nothing changes.
    pub fn apply_patch(&mut self, patch: ClientPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if patch.is_empty() {
            return Err(DomainError::validation("nothing to update"));
        }

        let mut next = self.clone();
        if let Some(full_name) = patch.full_name {
            next.full_name = fields::required("full name", &full_name)?;
        }
        if let Some(email) = patch.email {
            next.email = fields::email(&email)?;
        }
        if let Some(phone) = patch.phone {
            next.phone = fields::optional(&phone);
        }
        if let Some(company) = patch.company {
            next.company = fields::required("company", &company)?;
        }
        if let Some(commercial_id) = patch.commercial_id {
            next.commercial_id = commercial_id;
        }
        next.updated_at = now;

        *self = next;
        Ok(())
    }
}

impl Entity for Client {
    type Id = ClientId;

    const KIND: &'static str = "client";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    /// Ignored for COMMERCIAL creators, who always own their clients.
    pub commercial_id: Option<EmployeeId>,
}

/// Allow-listed client update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    /// `Some(None)` unassigns the client.
    pub commercial_id: Option<Option<EmployeeId>>,
}

impl ClientPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.commercial_id.is_none()
    }

    /// Whether applying this patch would change the owning commercial.
    pub fn reassigns_owner(&self, current: Option<EmployeeId>) -> bool {
        self.commercial_id.is_some_and(|next| next != current)
    }
}
