//! SQLite message repository implementation.

use parley_core::repository::SortOrder;
use parley_core::repository::message::MessageRepository;
use parley_types::error::RepositoryError;
use parley_types::id::{ConversationId, MessageId};
use parley_types::message::{Message, MessageMetadata, Role};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    tokens_used: i64,
    response_time_ms: i64,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            tokens_used: row.try_get("tokens_used")?,
            response_time_ms: row.try_get("response_time_ms")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id: MessageId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let conversation_id: ConversationId = self
            .conversation_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid conversation_id: {e}")))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id,
            conversation_id,
            role,
            content: self.content,
            metadata: MessageMetadata {
                tokens_used: self.tokens_used.max(0) as u32,
                response_time: self.response_time_ms.max(0) as u64,
            },
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Message, RepositoryError> {
    MessageRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_message()
}

impl MessageRepository for SqliteMessageRepository {
    async fn create(&self, message: &Message) -> Result<Message, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, role, content, tokens_used, response_time_ms, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(i64::from(message.metadata.tokens_used))
        .bind(i64::try_from(message.metadata.response_time).unwrap_or(i64::MAX))
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(message.clone())
    }

    async fn get(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn list_by_conversation(
        &self,
        conversation_id: &ConversationId,
        order: SortOrder,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let sql = match order {
            SortOrder::Asc => {
                "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, id ASC LIMIT ?"
            }
            SortOrder::Desc => {
                "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at DESC, id DESC LIMIT ?"
            }
        };

        let rows = sqlx::query(sql)
            .bind(conversation_id.to_string())
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn delete(&self, id: &MessageId) -> Result<Message, RepositoryError> {
        let row = sqlx::query("DELETE FROM messages WHERE id = ? RETURNING *")
            .bind(id.to_string())
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => decode(&row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn count_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::conversation::SqliteConversationRepository;
    use crate::sqlite::test_support::{seed_user, test_pool};
    use chrono::{Duration, Utc};
    use parley_core::repository::conversation::ConversationRepository;
    use parley_types::conversation::Conversation;
    use parley_types::message::MessageContent;

    async fn setup() -> (SqliteMessageRepository, SqliteConversationRepository, ConversationId) {
        let pool = test_pool().await;
        let owner = seed_user(&pool, "ada").await;
        let conversations = SqliteConversationRepository::new(pool.clone());
        let conv = Conversation::new(owner.id, None);
        conversations.create(&conv).await.unwrap();
        (SqliteMessageRepository::new(pool), conversations, conv.id)
    }

    fn make_message(conversation_id: ConversationId, role: Role, content: &str) -> Message {
        Message::new(
            conversation_id,
            role,
            MessageContent::parse(content).unwrap(),
            MessageMetadata::default(),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_keeps_metadata() {
        let (repo, _, conv_id) = setup().await;
        let mut msg = make_message(conv_id, Role::Ai, "Hello there");
        msg.metadata = MessageMetadata {
            tokens_used: 42,
            response_time: 1234,
        };
        repo.create(&msg).await.unwrap();

        let fetched = repo.get(&msg.id).await.unwrap().unwrap();
        assert_eq!(fetched.role, Role::Ai);
        assert_eq!(fetched.content, "Hello there");
        assert_eq!(fetched.metadata.tokens_used, 42);
        assert_eq!(fetched.metadata.response_time, 1234);
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_then_id() {
        let (repo, _, conv_id) = setup().await;
        let base = Utc::now();

        let mut first = make_message(conv_id, Role::User, "first");
        first.created_at = base;
        let mut second = make_message(conv_id, Role::Ai, "second");
        second.created_at = base + Duration::milliseconds(5);
        let mut third = make_message(conv_id, Role::User, "third");
        third.created_at = base + Duration::milliseconds(10);

        // Insert out of order
        for m in [&third, &first, &second] {
            repo.create(m).await.unwrap();
        }

        let asc = repo
            .list_by_conversation(&conv_id, SortOrder::Asc, 10)
            .await
            .unwrap();
        let contents: Vec<&str> = asc.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);

        let desc = repo
            .list_by_conversation(&conv_id, SortOrder::Desc, 2)
            .await
            .unwrap();
        let contents: Vec<&str> = desc.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second"]);
    }

    #[tokio::test]
    async fn test_identical_timestamps_break_ties_by_id() {
        let (repo, _, conv_id) = setup().await;
        let at = Utc::now();
        let mut a = make_message(conv_id, Role::User, "a");
        let mut b = make_message(conv_id, Role::Ai, "b");
        a.created_at = at;
        b.created_at = at;
        repo.create(&b).await.unwrap();
        repo.create(&a).await.unwrap();

        let list = repo
            .list_by_conversation(&conv_id, SortOrder::Asc, 10)
            .await
            .unwrap();
        let mut expected = vec![a.id, b.id];
        expected.sort();
        assert_eq!(list.iter().map(|m| m.id).collect::<Vec<_>>(), expected);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_row() {
        let (repo, _, conv_id) = setup().await;
        let msg = make_message(conv_id, Role::User, "bye");
        repo.create(&msg).await.unwrap();

        let removed = repo.delete(&msg.id).await.unwrap();
        assert_eq!(removed.id, msg.id);
        assert!(repo.get(&msg.id).await.unwrap().is_none());

        let err = repo.delete(&msg.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_count_for_conversation() {
        let (repo, _, conv_id) = setup().await;
        assert_eq!(repo.count_for_conversation(&conv_id).await.unwrap(), 0);

        repo.create(&make_message(conv_id, Role::User, "one")).await.unwrap();
        repo.create(&make_message(conv_id, Role::Ai, "two")).await.unwrap();
        assert_eq!(repo.count_for_conversation(&conv_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_message_requires_existing_conversation() {
        let (repo, _, _) = setup().await;
        let orphan = make_message(ConversationId::new(), Role::User, "orphan");
        assert!(repo.create(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_soft_deleted_conversation_keeps_messages() {
        let (repo, conversations, conv_id) = setup().await;
        repo.create(&make_message(conv_id, Role::User, "kept")).await.unwrap();
        conversations.soft_delete(&conv_id).await.unwrap();

        assert_eq!(repo.count_for_conversation(&conv_id).await.unwrap(), 1);
    }
}
