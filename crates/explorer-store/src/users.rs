use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use explorer_shared::UserId;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Create the user document if it does not exist yet.
    ///
    /// Returns `true` when a new document was created.
    pub fn ensure_user(&self, uid: &UserId, display_name: Option<&str>) -> Result<bool> {
        let affected = self.conn().execute(
            "INSERT OR IGNORE INTO users (uid, display_name, created_at)
             VALUES (?1, ?2, ?3)",
            params![uid.as_str(), display_name, Utc::now().to_rfc3339()],
        )?;
        if affected > 0 {
            tracing::debug!(uid = uid.short(), "created user document");
        }
        Ok(affected > 0)
    }

    pub fn user_exists(&self, uid: &UserId) -> Result<bool> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM users WHERE uid = ?1",
                params![uid.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ON DELETE CASCADE: the favorites go with it
    pub fn delete_user(&self, uid: &UserId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE uid = ?1", params![uid.as_str()])?;
        Ok(affected > 0)
    }
}
