// SPDX-License-Identifier: MPL-2.0

use crate::cache::{CacheDb, CacheError};
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// JSON key/value documents in the local database
pub struct LocalStore<'a> {
    db: &'a CacheDb,
}

impl<'a> LocalStore<'a> {
    pub fn new(db: &'a CacheDb) -> Self {
        Self { db }
    }

    /// Read and decode a document; `None` when the key was never written
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let conn = self.db.conn();

        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(CacheError::from)
    }

    /// Encode and store a document, replacing any previous value
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        let conn = self.db.conn();

        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, json, CacheDb::now()],
        )?;

        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let conn = self.db.conn();
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_overwrite() {
        let db = CacheDb::open_in_memory().unwrap();
        let store = LocalStore::new(&db);

        assert_eq!(store.get_json::<Vec<u32>>("nums").unwrap(), None);

        store.set_json("nums", &vec![1, 2]).unwrap();
        store.set_json("nums", &vec![3]).unwrap();
        assert_eq!(store.get_json::<Vec<u32>>("nums").unwrap(), Some(vec![3]));

        store.remove("nums").unwrap();
        store.remove("nums").unwrap();
        assert_eq!(store.get_json::<Vec<u32>>("nums").unwrap(), None);
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let db = CacheDb::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES ('bad', 'not json', 0)",
                [],
            )
            .unwrap();

        let store = LocalStore::new(&db);
        assert!(matches!(
            store.get_json::<Vec<u32>>("bad"),
            Err(CacheError::Serialization(_))
        ));
    }
}
