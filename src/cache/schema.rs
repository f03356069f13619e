// SPDX-License-Identifier: MPL-2.0

/// SQL schema for the local store
pub const SCHEMA: &str = r#"
-- Database version for migrations
PRAGMA user_version = 1;

-- kv: JSON documents keyed by name, the analogue of browser local storage
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
