//! v001 -- Initial schema creation.
//!
//! Creates the per-user favorites document: `users` and `favorites`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (one row per identity-provider UID)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    uid          TEXT PRIMARY KEY NOT NULL,
    display_name TEXT,
    created_at   TEXT NOT NULL                -- RFC-3339
);

-- ----------------------------------------------------------------
-- Favorites (set of country codes per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS favorites (
    uid      TEXT NOT NULL,                   -- FK -> users(uid)
    code     TEXT NOT NULL,                   -- upper-case cca3
    added_at TEXT NOT NULL,

    PRIMARY KEY (uid, code),
    FOREIGN KEY (uid) REFERENCES users(uid) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
