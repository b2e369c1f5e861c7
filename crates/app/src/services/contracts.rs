use chrono::Utc;

use epicevents_audit::AuditEvent;
use epicevents_auth::authorize::{require_contract_creation, require_contract_update};
use epicevents_auth::{ContractFilter, ContractScope};
use epicevents_core::{ContractId, DomainError, DomainResult};
use epicevents_crm::{Contract, ContractPatch, NewContract};
use epicevents_infra::{Database, Tables};

use crate::App;

pub struct ContractService<'a, D> {
    app: &'a App<D>,
}

fn signed_event(tables: &Tables, contract: &Contract) -> DomainResult<AuditEvent> {
    let client = tables.client(&contract.client_id)?;
    Ok(AuditEvent::contract_signed(
        contract.id,
        client.full_name.clone(),
        contract.total_amount,
    ))
}

impl<'a, D> ContractService<'a, D>
where
    D: Database,
{
    pub(crate) fn new(app: &'a App<D>) -> Self {
        Self { app }
    }

    /// Contracts visible to the caller, optionally narrowed by `filter`.
    ///
    /// COMMERCIAL sees contracts of their own clients. A filter reserved to
    /// another department is `PermissionDenied`.
    pub fn list(&self, token: &str, filter: Option<ContractFilter>) -> DomainResult<Vec<Contract>> {
        self.app.read_as("contracts.list", token, |p, t| {
            let scope = ContractScope::resolve(p, filter)?;
            Ok(t.contracts
                .values()
                .filter(|c| scope.admits(&t.contract_facts(c)))
                .cloned()
                .collect())
        })
    }

    pub fn get(&self, token: &str, id: &ContractId) -> DomainResult<Contract> {
        self.app.read_as("contracts.get", token, |p, t| {
            let contract = t.contract(id)?;
            let scope = ContractScope::resolve(p, None)?;
            if !scope.admits(&t.contract_facts(contract)) {
                return Err(DomainError::permission_denied("contract is outside your portfolio"));
            }
            Ok(contract.clone())
        })
    }

    /// Create a contract. A contract created already signed counts as signed now.
    pub fn create(&self, token: &str, new: NewContract) -> DomainResult<Contract> {
        self.app.write_as("contracts.create", token, |p, t| {
            require_contract_creation(p)?;
            t.client(&new.client_id)?;

            let contract = Contract::create(new, Utc::now())?;
            t.save_contract(contract.clone())?;
            tracing::info!(contract_id = %contract.id, created_by = %p.employee_id, "contract created");

            let mut events = Vec::new();
            if contract.signed {
                events.push(signed_event(t, &contract)?);
            }
            Ok((contract, events))
        })
    }

    pub fn update(&self, token: &str, id: &ContractId, patch: ContractPatch) -> DomainResult<Contract> {
        self.app.write_as("contracts.update", token, |p, t| {
            let mut contract = t.contract(id)?.clone();
            require_contract_update(p, t.contract_owner(&contract).as_ref())?;

            let newly_signed = contract.apply_patch(patch)?;
            t.save_contract(contract.clone())?;
            tracing::info!(contract_id = %contract.id, updated_by = %p.employee_id, newly_signed, "contract updated");

            let mut events = Vec::new();
            if newly_signed {
                events.push(signed_event(t, &contract)?);
            }
            Ok((contract, events))
        })
    }
}
