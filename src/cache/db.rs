// SPDX-License-Identifier: MPL-2.0

use crate::cache::CacheError;
use crate::cache::schema::SCHEMA;
use crate::config::APP_DIR;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle to the local database for one user profile
#[derive(Clone)]
pub struct CacheDb {
    conn: Arc<Mutex<Connection>>,
}

impl CacheDb {
    /// Open or create the database for a profile.
    /// Path: ~/.local/share/questly/{profile}/store.db
    pub fn open(profile: &str) -> Result<Self, CacheError> {
        let path = Self::store_path(profile)?;
        Self::open_at(&path)
    }

    /// Open or create the database at an explicit path
    pub fn open_at(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Path(format!("failed to create store dir: {}", e)))?;
        }

        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Throwaway database that lives as long as the handle
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CacheError> {
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run schema migrations
    fn migrate(conn: &Connection) -> Result<(), CacheError> {
        // All CREATE IF NOT EXISTS
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// XDG data directory for the store
    fn store_path(profile: &str) -> Result<PathBuf, CacheError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| CacheError::Path("could not find data directory".to_string()))?;

        // Keep the profile name a single path component
        let safe_profile: String = profile
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        Ok(data_dir.join(APP_DIR).join(safe_profile).join("store.db"))
    }

    /// Access connection for operations
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current unix timestamp
    pub fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}
