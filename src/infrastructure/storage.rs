use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub const USER_KEY: &str = "dashie-user";
pub const THEME_KEY: &str = "dashie-theme";
pub const SETTINGS_KEY: &str = "dashie-settings";

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// String key/value store with the same contract as the browser's
/// `localStorage`: values are opaque strings, missing keys read as `None`.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError>;
    fn remove_item(&self, key: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteLocalStorage {
    db_path: PathBuf,
}

impl SqliteLocalStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl LocalStorage for SqliteLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryLocalStorage {
    items: Mutex<HashMap<String, String>>,
}

impl InMemoryLocalStorage {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, InfraError> {
        self.items
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("local storage lock poisoned: {error}")))
    }
}

impl LocalStorage for InMemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InfraError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), InfraError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DB: AtomicUsize = AtomicUsize::new(0);

    fn temp_db_path() -> PathBuf {
        let sequence = NEXT_TEMP_DB.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "dashie-storage-tests-{}-{}",
            std::process::id(),
            sequence
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir.join("dashie.sqlite")
    }

    #[test]
    fn sqlite_storage_set_get_overwrite_and_remove() {
        let path = temp_db_path();
        initialize_database(&path).expect("initialize database");
        let storage = SqliteLocalStorage::new(&path);

        assert_eq!(storage.get_item(THEME_KEY).expect("get"), None);
        storage.set_item(THEME_KEY, "\"dark\"").expect("set");
        storage.set_item(THEME_KEY, "\"light\"").expect("overwrite");
        assert_eq!(
            storage.get_item(THEME_KEY).expect("get"),
            Some("\"light\"".to_string())
        );

        storage.remove_item(THEME_KEY).expect("remove");
        assert_eq!(storage.get_item(THEME_KEY).expect("get"), None);
        storage.remove_item(THEME_KEY).expect("removing a missing key is fine");

        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn initialize_database_is_idempotent() {
        let path = temp_db_path();
        initialize_database(&path).expect("first init");
        let storage = SqliteLocalStorage::new(&path);
        storage.set_item(USER_KEY, "{}").expect("set");
        initialize_database(&path).expect("second init");
        assert_eq!(storage.get_item(USER_KEY).expect("get"), Some("{}".to_string()));

        let _ = fs::remove_dir_all(path.parent().expect("parent"));
    }

    #[test]
    fn in_memory_storage_keeps_keys_independent() {
        let storage = InMemoryLocalStorage::default();
        storage.set_item(USER_KEY, "user").expect("set user");
        storage.set_item(SETTINGS_KEY, "settings").expect("set settings");
        storage.remove_item(USER_KEY).expect("remove user");

        assert_eq!(storage.get_item(USER_KEY).expect("get"), None);
        assert_eq!(
            storage.get_item(SETTINGS_KEY).expect("get"),
            Some("settings".to_string())
        );
    }
}
