use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

mod comment_helpers;
mod post_helpers;
mod user_helpers;

pub use comment_helpers::*;
pub use post_helpers::*;
pub use user_helpers::*;

const USER_QUERY: &str = r#"
        SELECT id, email, password, name, is_admin FROM users
"#;

// ----------------- Helper Functions -----------------

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_QUERY} WHERE email = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, RequestError> {
    let query = format!("{USER_QUERY} WHERE id = $1");
    let result = sqlx::query_as::<_, User>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}
