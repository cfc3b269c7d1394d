use sqlx::SqlitePool;

use crate::{errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
        SELECT comments.id         AS "id",
               comments.text       AS "text",
               comments.post_id    AS "post_id",
               comments.author_id  AS "author_id",
               users.name          AS "author_name",
               users.email         AS "author_email"
        FROM   comments
            JOIN users
                ON comments.author_id = users.id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    text: &str,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let comment_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO comments (text, author_id, post_id)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(text)
    .bind(author_id)
    .bind(post_id)
    .fetch_one(&mut tx)
    .await?;

    let query = format!("{COMMENT_QUERY} WHERE comments.id = $1");
    let result = sqlx::query_as::<_, Comment>(&query)
        .bind(comment_id)
        .fetch_one(&mut tx)
        .await?;

    tx.commit().await?;
    Ok(result)
}

/// Comments on a post in the order they were written.
pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let query = format!(
        "{COMMENT_QUERY} WHERE comments.post_id = $1 ORDER BY comments.created_at, comments.id"
    );
    let result = sqlx::query_as::<_, Comment>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await?;
    Ok(result)
}
