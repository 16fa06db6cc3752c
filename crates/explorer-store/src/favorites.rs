//! Favorite country codes inside a user document.
//!
//! `add_favorite` / `remove_favorite` have set-union / set-remove semantics:
//! repeating either is harmless.

use chrono::Utc;
use rusqlite::params;

use explorer_shared::{CountryCode, Favorites, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Favorites of `uid` in the order they were added.
    pub fn list_favorites(&self, uid: &UserId) -> Result<Favorites> {
        let mut stmt = self.conn().prepare(
            "SELECT code
             FROM favorites
             WHERE uid = ?1
             ORDER BY added_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![uid.as_str()], |row| row.get::<_, String>(0))?;

        let mut favorites = Favorites::new();
        for row in rows {
            let raw = row?;
            let code = CountryCode::parse(&raw)
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            favorites.insert(code);
        }
        Ok(favorites)
    }

    /// Add `code` to the user's favorites.
    ///
    /// Returns `true` if the code was not already present. Fails with
    /// [`StoreError::NotFound`] when the user document does not exist.
    pub fn add_favorite(&self, uid: &UserId, code: &CountryCode) -> Result<bool> {
        if !self.user_exists(uid)? {
            return Err(StoreError::NotFound);
        }

        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO favorites (uid, code, added_at)
             VALUES (?1, ?2, ?3)",
            params![uid.as_str(), code.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(affected > 0)
    }

    /// Remove `code` from the user's favorites. Returns `true` if a row was
    /// deleted.
    pub fn remove_favorite(&self, uid: &UserId, code: &CountryCode) -> Result<bool> {
        if !self.user_exists(uid)? {
            return Err(StoreError::NotFound);
        }

        let affected = self.conn().execute(
            "DELETE FROM favorites WHERE uid = ?1 AND code = ?2",
            params![uid.as_str(), code.as_str()],
        )?;
        Ok(affected > 0)
    }
}
