use sqlx::SqlitePool;

use crate::{errors::RequestError, models::User};

pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_admin: bool,
}

pub async fn insert_user(pool: &SqlitePool, user: NewUser<'_>) -> Result<User, RequestError> {
    let mut tx = pool.begin().await?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name, password, is_admin)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, password, name, is_admin
        "#,
    )
    .bind(user.email)
    .bind(user.name)
    .bind(user.password_hash)
    .bind(user.is_admin)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(user)
}
