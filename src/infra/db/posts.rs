use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{PostsRepo, PostsWriteRepo, RenameAuthorParams, RepoError};
use crate::domain::posts::{PostDraft, PostRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    author: String,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author: row.author,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let rows = query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, author, created_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let row = query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, author, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, draft: PostDraft) -> Result<PostRecord, RepoError> {
        let row = query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, title, content, author)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, author, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.title)
        .bind(draft.content)
        .bind(draft.author)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn rename_author(&self, params: RenameAuthorParams) -> Result<u64, RepoError> {
        // A single statement, so the relabel is all-or-nothing.
        let result = sqlx::query("UPDATE posts SET author = $1 WHERE author = $2")
            .bind(params.new_author)
            .bind(params.old_author)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_all_posts(&self) -> Result<u64, RepoError> {
        let result = sqlx::query("DELETE FROM posts")
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
