use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{Database, StoreError, Tables, read_locked, transact};

/// Record store persisted as a single JSON document.
///
/// Each commit rewrites the whole snapshot through a sibling temp file and
/// an atomic rename, so a crash leaves either the old or the new snapshot.
#[derive(Debug)]
pub struct JsonFileDatabase {
    path: PathBuf,
    state: RwLock<Tables>,
}

impl JsonFileDatabase {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let tables = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), employees = tables.employees.len(), "opened record store");

        Ok(Self {
            path,
            state: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persist(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let bytes = serde_json::to_vec_pretty(tables)?;
    let mut file = fs::File::create(&tmp)?;
    file.write_all(&bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl Database for JsonFileDatabase {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        read_locked(&self.state, f)
    }

    fn transaction<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        transact(&self.state, f, |tables| persist(&self.path, tables))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use epicevents_auth::{
        CredentialStore, CredentialStoreMut, Department, Employee, NewEmployee, ensure_seeded,
        reassign,
    };
    use epicevents_core::DomainError;

    use super::*;

    fn admin() -> Employee {
        Employee::create(
            NewEmployee {
                username: "admin".to_string(),
                password: "admin123".to_string(),
                email: "admin@epicevents.test".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Min".to_string(),
                phone: None,
                employee_number: Some("G-001".to_string()),
                department: Department::Gestion,
            },
            4,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = JsonFileDatabase::open(dir.path().join("data.json")).unwrap();
        assert_eq!(db.read(|t| t.employees.len()).unwrap(), 0);
    }

    #[test]
    fn committed_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let e = admin();

        {
            let db = JsonFileDatabase::open(&path).unwrap();
            db.transaction(|t| -> Result<(), DomainError> {
                ensure_seeded(t);
                t.save_employee(e.clone())?;
                reassign(t, &e)
            })
            .unwrap();
        }

        let db = JsonFileDatabase::open(&path).unwrap();
        let (reloaded, grants) = db
            .read(|t| {
                (
                    t.find_employee_by_username("admin").cloned(),
                    t.grants_of(&e.id).len(),
                )
            })
            .unwrap();

        let reloaded = reloaded.unwrap();
        assert_eq!(reloaded, e);
        assert!(reloaded.check_password("admin123"));
        assert_eq!(grants, 8);
    }

    #[test]
    fn rolled_back_work_never_reaches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let db = JsonFileDatabase::open(&path).unwrap();

        let result: Result<(), DomainError> = db.transaction(|t| {
            t.save_employee(admin())?;
            Err(DomainError::validation("abort"))
        });

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            JsonFileDatabase::open(&path),
            Err(StoreError::Corrupt(_))
        ));
    }
}
