//! Session document persistence

use sqlx::SqlitePool;

use super::SyncError;
use crate::combat::CombatSession;

/// Combat session documents backed by SQLite
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Create a new session store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new session document
    pub async fn insert(&self, session: &CombatSession) -> Result<(), SyncError> {
        let document = serde_json::to_string(session)?;

        sqlx::query(
            r#"
            INSERT INTO combats (id, dungeon_master, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.dungeon_master)
        .bind(&document)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the stored document of an existing session.
    ///
    /// Only [`SessionStore::insert`] creates rows, so a write to a deleted
    /// session fails with [`SyncError::NotFound`]. The owner column is
    /// fixed at insert and never rewritten.
    pub async fn put(&self, session: &CombatSession) -> Result<(), SyncError> {
        let document = serde_json::to_string(session)?;

        let result = sqlx::query("UPDATE combats SET document = ?, updated_at = ? WHERE id = ?")
            .bind(&document)
            .bind(session.updated_at)
            .bind(&session.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(session.id.clone()));
        }
        Ok(())
    }

    /// Get a session by ID
    pub async fn get(&self, id: &str) -> Result<Option<CombatSession>, SyncError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT document FROM combats WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((document,)) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    /// Delete a session
    pub async fn delete(&self, id: &str) -> Result<bool, SyncError> {
        let result = sqlx::query("DELETE FROM combats WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sessions where the user is dungeon master or a player, newest first
    pub async fn find_for_user(&self, user: &str) -> Result<Vec<CombatSession>, SyncError> {
        // SQLite JSON table-valued function over the players array
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT document FROM combats
            WHERE dungeon_master = ?
               OR EXISTS (
                    SELECT 1 FROM json_each(combats.document, '$.players')
                    WHERE json_each.value = ?
               )
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user)
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(document,)| serde_json::from_str(&document).map_err(SyncError::from))
            .collect()
    }
}
