use std::sync::RwLock;

use super::{Database, StoreError, Tables, read_locked, transact};

/// In-memory record store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    state: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            state: RwLock::new(tables),
        }
    }
}

impl Database for InMemoryDatabase {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        read_locked(&self.state, f)
    }

    fn transaction<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        transact(&self.state, f, |_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use epicevents_core::DomainError;
    use epicevents_crm::{Client, NewClient};

    use super::*;

    fn client(email: &str) -> Client {
        Client::create(
            NewClient {
                full_name: "Kevin Casey".to_string(),
                email: email.to_string(),
                phone: None,
                company: "Cool Startup".to_string(),
                commercial_id: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn committed_work_is_visible() {
        let db = InMemoryDatabase::new();
        db.transaction(|t| t.save_client(client("a@b.io"))).unwrap();
        assert_eq!(db.read(|t| t.clients.len()).unwrap(), 1);
    }

    #[test]
    fn failed_unit_of_work_rolls_back_every_change() {
        let db = InMemoryDatabase::new();

        let result: Result<(), DomainError> = db.transaction(|t| {
            t.save_client(client("first@b.io"))?;
            t.save_client(client("second@b.io"))?;
            Err(DomainError::validation("late failure"))
        });

        assert!(result.is_err());
        assert_eq!(db.read(|t| t.clients.len()).unwrap(), 0);
    }
}
