//! Record store with transactional units of work.
//!
//! A unit of work runs against a working copy of the [`Tables`]; the copy
//! replaces the committed state only when the closure returns `Ok`. Writers
//! are serialised by a single write lock.

mod in_memory;
mod json_file;
mod tables;

use std::sync::{Arc, RwLock};

use thiserror::Error;

use epicevents_core::DomainError;

pub use in_memory::InMemoryDatabase;
pub use json_file::JsonFileDatabase;
pub use tables::Tables;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        DomainError::internal(e.to_string())
    }
}

/// Access to the committed record set.
pub trait Database: Send + Sync {
    /// Run `f` against the committed state.
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError>;

    /// Run `f` as one atomic unit of work.
    ///
    /// Nothing `f` did is visible unless it returns `Ok` and the commit
    /// succeeds.
    fn transaction<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>;
}

impl<D> Database for Arc<D>
where
    D: Database,
{
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        (**self).read(f)
    }

    fn transaction<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        (**self).transaction(f)
    }
}

fn read_locked<R>(state: &RwLock<Tables>, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
    let tables = state.read().map_err(|_| StoreError::Poisoned)?;
    Ok(f(&tables))
}

/// Shared unit-of-work driver. `commit` sees the working copy before it is
/// swapped in; if it fails the committed state is left untouched.
fn transact<R, E>(
    state: &RwLock<Tables>,
    f: impl FnOnce(&mut Tables) -> Result<R, E>,
    commit: impl FnOnce(&Tables) -> Result<(), StoreError>,
) -> Result<R, E>
where
    E: From<StoreError>,
{
    let mut committed = state.write().map_err(|_| StoreError::Poisoned)?;
    let mut working = committed.clone();

    let out = f(&mut working)?;
    commit(&working)?;

    *committed = working;
    Ok(out)
}
