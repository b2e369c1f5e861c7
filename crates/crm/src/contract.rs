use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{ClientId, ContractId, DomainError, DomainResult, Entity};

/// A contract with a client.
///
/// Amounts are in the smallest currency unit.
///
/// # Invariants
/// - `amount_due <= total_amount`
/// - once signed, a contract stays signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub client_id: ClientId,
    pub total_amount: u64,
    pub amount_due: u64,
    pub signed: bool,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn create(new: NewContract, now: DateTime<Utc>) -> DomainResult<Self> {
        let amount_due = new.amount_due.unwrap_or(new.total_amount);
        check_amounts(new.total_amount, amount_due)?;

        Ok(Self {
            id: ContractId::new(),
            client_id: new.client_id,
            total_amount: new.total_amount,
            amount_due,
            signed: new.signed,
            created_at: now,
        })
    }

    pub fn is_fully_paid(&self) -> bool {
        self.amount_due == 0
    }

    /// Apply a patch atomically.
    ///
    /// Returns `true` when this patch signed the contract (false to true).
    pub fn apply_patch(&mut self, patch: ContractPatch) -> DomainResult<bool> {
        if patch.is_empty() {
            return Err(DomainError::validation("nothing to update"));
        }

        let total_amount = patch.total_amount.unwrap_or(self.total_amount);
        let amount_due = patch.amount_due.unwrap_or(self.amount_due);
        check_amounts(total_amount, amount_due)?;

        let signed = match patch.signed {
            Some(false) if self.signed => {
                return Err(DomainError::validation("a signed contract cannot be unsigned"));
            }
            Some(signed) => signed,
            None => self.signed,
        };

        let newly_signed = signed && !self.signed;
        self.total_amount = total_amount;
        self.amount_due = amount_due;
        self.signed = signed;
        Ok(newly_signed)
    }
}

fn check_amounts(total_amount: u64, amount_due: u64) -> DomainResult<()> {
    if amount_due > total_amount {
        return Err(DomainError::validation(format!(
            "amount due ({amount_due}) exceeds total amount ({total_amount})"
        )));
    }
    Ok(())
}

impl Entity for Contract {
    type Id = ContractId;

    const KIND: &'static str = "contract";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContract {
    pub client_id: ClientId,
    pub total_amount: u64,
    /// Defaults to the total amount.
    pub amount_due: Option<u64>,
    #[serde(default)]
    pub signed: bool,
}

/// Allow-listed contract update. The client cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractPatch {
    pub total_amount: Option<u64>,
    pub amount_due: Option<u64>,
    pub signed: Option<bool>,
}

impl ContractPatch {
    pub fn is_empty(&self) -> bool {
        self.total_amount.is_none() && self.amount_due.is_none() && self.signed.is_none()
    }
}
