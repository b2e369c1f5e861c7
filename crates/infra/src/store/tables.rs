use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use epicevents_auth::{
    ContractFacts, CredentialStore, CredentialStoreMut, Department, Employee, Permission,
    PermissionRecord, PermissionStore,
};
use epicevents_core::{
    ClientId, ContractId, DomainError, DomainResult, EmployeeId, Entity, EventId,
};
use epicevents_crm::{Client, Contract, Event};

/// Every record the application keeps.
///
/// Keys are time-ordered ids, so iteration follows creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub employees: BTreeMap<EmployeeId, Employee>,
    pub permissions: BTreeMap<Permission, PermissionRecord>,
    pub grants: BTreeMap<EmployeeId, BTreeSet<Permission>>,
    pub clients: BTreeMap<ClientId, Client>,
    pub contracts: BTreeMap<ContractId, Contract>,
    pub events: BTreeMap<EventId, Event>,
}

fn not_found<E: Entity>(id: &E::Id) -> DomainError {
    DomainError::not_found(format!("{} {id}", E::KIND))
}

impl Tables {
    pub fn employee(&self, id: &EmployeeId) -> DomainResult<&Employee> {
        self.employees.get(id).ok_or_else(|| not_found::<Employee>(id))
    }

    pub fn client(&self, id: &ClientId) -> DomainResult<&Client> {
        self.clients.get(id).ok_or_else(|| not_found::<Client>(id))
    }

    pub fn contract(&self, id: &ContractId) -> DomainResult<&Contract> {
        self.contracts.get(id).ok_or_else(|| not_found::<Contract>(id))
    }

    pub fn event(&self, id: &EventId) -> DomainResult<&Event> {
        self.events.get(id).ok_or_else(|| not_found::<Event>(id))
    }

    pub fn event_for_contract(&self, contract_id: &ContractId) -> Option<&Event> {
        self.events.values().find(|e| &e.contract_id == contract_id)
    }

    /// `commercial_id` of the contract's client.
    pub fn contract_owner(&self, contract: &Contract) -> Option<EmployeeId> {
        self.clients
            .get(&contract.client_id)
            .and_then(|c| c.commercial_id)
    }

    pub fn contract_facts(&self, contract: &Contract) -> ContractFacts {
        ContractFacts {
            owner: self.contract_owner(contract),
            signed: contract.signed,
            amount_due: contract.amount_due,
            has_support: self
                .event_for_contract(&contract.id)
                .is_some_and(|e| e.contact_support_id.is_some()),
        }
    }

    /// Insert or replace a client. Emails are unique.
    pub fn save_client(&mut self, client: Client) -> DomainResult<()> {
        if self
            .clients
            .values()
            .any(|c| c.id != client.id && c.email == client.email)
        {
            return Err(DomainError::conflict(format!(
                "a client with email '{}' already exists",
                client.email
            )));
        }
        self.clients.insert(client.id, client);
        Ok(())
    }

    /// Insert or replace a contract. Its client must exist.
    pub fn save_contract(&mut self, contract: Contract) -> DomainResult<()> {
        self.client(&contract.client_id)?;
        self.contracts.insert(contract.id, contract);
        Ok(())
    }

    /// Insert or replace an event. At most one event per contract.
    pub fn save_event(&mut self, event: Event) -> DomainResult<()> {
        self.contract(&event.contract_id)?;
        if let Some(existing) = self.event_for_contract(&event.contract_id) {
            if existing.id != event.id {
                return Err(DomainError::conflict(format!(
                    "contract {} already has an event",
                    event.contract_id
                )));
            }
        }
        self.events.insert(event.id, event);
        Ok(())
    }

    /// Unassign the employee from records their department may no longer hold:
    /// clients unless COMMERCIAL, events unless SUPPORT. Returns how many
    /// records changed.
    pub fn release_stale_assignments(&mut self, employee: &Employee) -> usize {
        let mut released = 0;
        if employee.department != Department::Commercial {
            released += self.release_clients(&employee.id);
        }
        if employee.department != Department::Support {
            released += self.release_events(&employee.id);
        }
        released
    }

    fn release_clients(&mut self, id: &EmployeeId) -> usize {
        let mut released = 0;
        for client in self.clients.values_mut() {
            if client.commercial_id == Some(*id) {
                client.commercial_id = None;
                released += 1;
            }
        }
        released
    }

    fn release_events(&mut self, id: &EmployeeId) -> usize {
        let mut released = 0;
        for event in self.events.values_mut() {
            if event.contact_support_id == Some(*id) {
                event.contact_support_id = None;
                released += 1;
            }
        }
        released
    }
}

impl CredentialStore for Tables {
    fn find_employee_by_username(&self, username: &str) -> Option<&Employee> {
        self.employees.values().find(|e| e.username == username)
    }

    fn find_employee_by_id(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.get(id)
    }

    fn grants_of(&self, id: &EmployeeId) -> BTreeSet<Permission> {
        self.grants.get(id).cloned().unwrap_or_default()
    }
}

impl CredentialStoreMut for Tables {
    fn save_employee(&mut self, employee: Employee) -> DomainResult<()> {
        for other in self.employees.values().filter(|e| e.id != employee.id) {
            if other.username == employee.username {
                return Err(DomainError::conflict(format!(
                    "username '{}' is already taken",
                    employee.username
                )));
            }
            if other.email == employee.email {
                return Err(DomainError::conflict(format!(
                    "an employee with email '{}' already exists",
                    employee.email
                )));
            }
        }
        self.employees.insert(employee.id, employee);
        Ok(())
    }

    fn delete_employee(&mut self, id: &EmployeeId) -> DomainResult<Employee> {
        let employee = self
            .employees
            .remove(id)
            .ok_or_else(|| not_found::<Employee>(id))?;
        self.grants.remove(id);

        // Assignments pointing at the employee are released, not cascaded.
        self.release_clients(id);
        self.release_events(id);
        Ok(employee)
    }
}

impl PermissionStore for Tables {
    fn has_permission(&self, code: &Permission) -> bool {
        self.permissions.contains_key(code)
    }

    fn insert_permission(&mut self, record: PermissionRecord) {
        self.permissions.insert(record.code.clone(), record);
    }

    fn clear_grants(&mut self, employee_id: &EmployeeId) {
        self.grants.remove(employee_id);
    }

    fn grant(&mut self, employee_id: &EmployeeId, code: Permission) -> DomainResult<()> {
        if !self.permissions.contains_key(&code) {
            return Err(DomainError::internal(format!("permission '{code}' is not seeded")));
        }
        self.grants.entry(*employee_id).or_default().insert(code);
        Ok(())
    }
}
