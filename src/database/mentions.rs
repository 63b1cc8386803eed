use sqlx::PgPool;
use uuid::Uuid;

use super::models::Mention;

/// Typed accessor for the mentions join table.
pub struct MentionRepo {
    pool: PgPool,
}

impl MentionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One insert for the whole batch; duplicates were already removed during
    /// handle resolution.
    pub async fn insert_many(
        &self,
        comment_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            INSERT INTO mentions (comment_id, user_id)
            SELECT $1, user_id FROM UNNEST($2::uuid[]) AS t(user_id)
            "#,
        )
        .bind(comment_id)
        .bind(user_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_comments(
        &self,
        comment_ids: &[Uuid],
    ) -> Result<Vec<Mention>, sqlx::Error> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }
        sqlx::query_as::<_, Mention>("SELECT * FROM mentions WHERE comment_id = ANY($1)")
            .bind(comment_ids)
            .fetch_all(&self.pool)
            .await
    }
}
