use crate::data_formats::Flash;
use crate::db_helpers::get_user_by_id;
use crate::errors::RequestError;
use crate::models::User;
use crate::AppContext;
use anyhow::{Context, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const SESSION_EXPIRY_DURATION: time::Duration = time::Duration::days(30);
pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaim {
    id: i64,
    exp: i64,
}

/// The logged in user, if the request carries a valid session cookie.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn get(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppContext> for MaybeUser {
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> std::result::Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(MaybeUser(current_user(ctx, &jar).await?))
    }
}

/// Resolves the session cookie in `jar` to a user.
pub async fn current_user(
    ctx: &AppContext,
    jar: &CookieJar,
) -> std::result::Result<Option<User>, RequestError> {
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) => cookie.value().to_owned(),
        None => return Ok(None),
    };

    // A stale or forged cookie just means an anonymous visitor.
    let id = match verify_session_token(&token, &ctx.config.session_secret) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "ignoring invalid session cookie");
            return Ok(None);
        }
    };

    get_user_by_id(&ctx.pool, id).await
}

/// Guard for the post authoring routes. Runs before the handler and hands it
/// the admin through the request extensions.
pub async fn require_admin<B>(
    MaybeUser(user): MaybeUser,
    mut request: Request<B>,
    next: Next<B>,
) -> std::result::Result<Response, RequestError> {
    let user = match user {
        Some(user) => user,
        None => return Err(RequestError::NotAuthorized("Login required")),
    };
    if !user.is_admin {
        tracing::warn!(user_id = user.id, path = %request.uri().path(), "admin route refused");
        return Err(RequestError::Forbidden);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// ----------------- Session Cookies -----------------

pub fn create_session_token(id: i64, secret: &str) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + SESSION_EXPIRY_DURATION;
    let claim = SessionClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate session token")
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<SessionClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|_| RequestError::NotAuthorized("Invalid session"))?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Session expired"));
    }
    Ok(claim.id)
}

pub fn start_session(jar: CookieJar, token: String) -> CookieJar {
    jar.add(
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(SESSION_EXPIRY_DURATION)
            .finish(),
    )
}

pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE, "").path("/").finish())
}

pub fn set_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    jar.add(
        Cookie::build(FLASH_COOKIE, flash.key())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish(),
    )
}

/// Reads the pending flash message and clears it.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let pending = jar
        .get(FLASH_COOKIE)
        .map(|cookie| Flash::from_key(cookie.value()));
    match pending {
        Some(flash) => (
            jar.remove(Cookie::build(FLASH_COOKIE, "").path("/").finish()),
            flash,
        ),
        None => (jar, None),
    }
}

// ----------------- Passwords -----------------

pub async fn verify_password_argon2(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Stored password hash is malformed"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hash = hash_password_argon2(String::from("hunter2")).await.unwrap();
        assert_ne!(hash, "hunter2");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password_argon2(String::from("hunter2"), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_argon2(String::from("hunter3"), hash)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_different_salts() {
        let first = hash_password_argon2(String::from("pw")).await.unwrap();
        let second = hash_password_argon2(String::from("pw")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        assert!(
            verify_password_argon2(String::from("pw"), String::from("plaintext"))
                .await
                .is_err()
        );
    }

    #[test]
    fn session_token_carries_user_id() {
        let token = create_session_token(42, SECRET).unwrap();
        assert_eq!(verify_session_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn session_token_signed_with_other_secret_is_rejected() {
        let token = create_session_token(42, "another-secret").unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let claim = SessionClaim {
            id: 7,
            exp: OffsetDateTime::now_utc().unix_timestamp() - 3600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claim,
            &jsonwebtoken::EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn flash_is_consumed_once() {
        let jar = set_flash(CookieJar::new(), Flash::LoginToComment);
        let (jar, flash) = take_flash(jar);
        assert_eq!(flash, Some(Flash::LoginToComment));
        let (_, flash) = take_flash(jar);
        assert_eq!(flash, None);
    }
}
