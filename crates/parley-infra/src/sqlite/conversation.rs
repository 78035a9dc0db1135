//! SQLite conversation repository implementation.
//!
//! Implements `ConversationRepository` from `parley-core`. The message
//! counter is only ever changed by a single `UPDATE ... SET message_count =
//! MAX(message_count + ?, 0)` statement, so concurrent turns on the same
//! conversation cannot lose increments.

use chrono::Utc;
use parley_core::repository::conversation::ConversationRepository;
use parley_types::conversation::{Conversation, DEFAULT_TITLE};
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, UserId};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ConversationRepository`.
pub struct SqliteConversationRepository {
    pool: DatabasePool,
}

impl SqliteConversationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Explain why a guarded UPDATE matched no row.
    async fn missing_or_inactive(&self, id: &ConversationId) -> RepositoryError {
        match self.get(id).await {
            Ok(Some(conv)) if !conv.is_active => RepositoryError::Inactive,
            Ok(Some(_)) => RepositoryError::Conflict("conversation changed concurrently".into()),
            Ok(None) => RepositoryError::NotFound,
            Err(e) => e,
        }
    }
}

struct ConversationRow {
    id: String,
    owner_id: String,
    title: String,
    message_count: i64,
    is_active: bool,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            message_count: row.try_get("message_count")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let id: ConversationId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation id: {e}")))?;
        let owner_id: UserId = self
            .owner_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid owner_id: {e}")))?;

        Ok(Conversation {
            id,
            owner_id,
            title: self.title,
            message_count: self.message_count.max(0) as u32,
            is_active: self.is_active,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_conversation()
}

impl ConversationRepository for SqliteConversationRepository {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, owner_id, title, message_count, is_active, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.owner_id.to_string())
        .bind(&conversation.title)
        .bind(i64::from(conversation.message_count))
        .bind(conversation.is_active)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(conversation.clone())
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn list_active_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE owner_id = ? AND is_active = 1 ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn rename(&self, id: &ConversationId, title: &str) -> Result<Conversation, RepositoryError> {
        let row = sqlx::query(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ? AND is_active = 1 RETURNING *",
        )
        .bind(title)
        .bind(format_datetime(&Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => decode(&row),
            None => Err(self.missing_or_inactive(id).await),
        }
    }

    async fn soft_delete(&self, id: &ConversationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE conversations SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn adjust_message_count(
        &self,
        id: &ConversationId,
        delta: i64,
    ) -> Result<Conversation, RepositoryError> {
        let row = sqlx::query(
            r#"UPDATE conversations
               SET message_count = MAX(message_count + ?, 0), updated_at = ?
               WHERE id = ?
               RETURNING *"#,
        )
        .bind(delta)
        .bind(format_datetime(&Utc::now()))
        .bind(id.to_string())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(query_error)?;

        match row {
            Some(row) => decode(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn set_title_if_first_turn(
        &self,
        id: &ConversationId,
        title: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE conversations SET title = ?, updated_at = ?
               WHERE id = ? AND is_active = 1 AND message_count = 2 AND title = ?"#,
        )
        .bind(title)
        .bind(format_datetime(&Utc::now()))
        .bind(id.to_string())
        .bind(DEFAULT_TITLE)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
