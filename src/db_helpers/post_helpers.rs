use sqlx::SqlitePool;

use crate::data_formats::request::PostRequest;
use crate::errors::RequestError;
use crate::models::Post;

const POST_QUERY: &str = r#"
            SELECT blog_posts.id         AS "id",
                   blog_posts.title      AS "title",
                   blog_posts.subtitle   AS "subtitle",
                   blog_posts.date       AS "date",
                   blog_posts.body       AS "body",
                   blog_posts.img_url    AS "img_url",
                   blog_posts.author_id  AS "author_id",
                   users.name            AS "author_name"
            FROM   blog_posts
                JOIN users
                    ON blog_posts.author_id = users.id
"#;

/// Every post, newest first.
pub async fn list_posts_in_db(pool: &SqlitePool) -> Result<Vec<Post>, RequestError> {
    let query = format!("{POST_QUERY} ORDER BY blog_posts.created_at DESC, blog_posts.id DESC");
    let result = sqlx::query_as::<_, Post>(&query).fetch_all(pool).await?;
    Ok(result)
}

pub async fn get_post_by_id_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Option<Post>, RequestError> {
    let query = format!("{POST_QUERY} WHERE blog_posts.id = $1");
    let result = sqlx::query_as::<_, Post>(&query)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    date: &str,
    PostRequest {
        title,
        subtitle,
        body,
        img_url,
    }: PostRequest,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;

    let post_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO blog_posts (title, subtitle, date, body, img_url, author_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(subtitle)
    .bind(date)
    .bind(body)
    .bind(img_url)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;

    tx.commit().await?;

    get_post_by_id_in_db(pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)
}

/// Overwrites every editable field and hands the post to `author_id`.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
    author_id: i64,
    PostRequest {
        title,
        subtitle,
        body,
        img_url,
    }: PostRequest,
) -> Result<Post, RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE blog_posts
        SET title = $1, subtitle = $2, body = $3, img_url = $4, author_id = $5
        WHERE id = $6
        "#,
    )
    .bind(title)
    .bind(subtitle)
    .bind(body)
    .bind(img_url)
    .bind(author_id)
    .bind(post_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }

    tx.commit().await?;

    get_post_by_id_in_db(pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)
}

/// Removes the post; its comments go with it through the foreign key cascade.
pub async fn delete_post_in_db(pool: &SqlitePool, post_id: i64) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        DELETE FROM blog_posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .execute(&mut tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RequestError::NotFound);
    }

    tx.commit().await?;
    Ok(())
}
