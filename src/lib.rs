mod authentication;
mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod mailer;
mod models;

use std::{net::TcpListener, sync::Arc};

use anyhow::Context;
pub use anyhow::Result;
use axum::{middleware, routing::*, Router};
pub use config::Config;
use handlers::*;
pub use mailer::{MailError, Mailer, OutgoingMail, SmtpMailer, CONTACT_SUBJECT};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tower_http::trace::TraceLayer;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppContext {
    pub async fn new(config: Config) -> Result<Self> {
        let pool = init_db(&config.database_url).await?;
        let mailer = SmtpMailer::new(&config).context("Failed to configure SMTP transport")?;
        Ok(Self::from_parts(pool, config, Arc::new(mailer)))
    }

    pub fn from_parts(pool: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            mailer,
        }
    }
}

pub async fn run_app(ctx: AppContext, listener: TcpListener) -> Result<()> {
    let app = make_router(ctx);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!(db_url, "creating database");
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {db_url}"))?;
    } else {
        tracing::debug!(db_url, "database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("running migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("migrations completed");
    Ok(())
}

pub fn make_router(ctx: AppContext) -> Router {
    let admin_routes = Router::new()
        .route("/new-post", get(new_post_page).post(create_post))
        .route("/edit-post/:post_id", get(edit_post_page).post(update_post))
        .route("/delete/:post_id", get(delete_post))
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            authentication::require_admin,
        ));

    Router::new()
        .route("/check_health", get(alive))
        .route("/", get(get_all_posts))
        .route("/register", get(register_page).post(register_user))
        .route("/login", get(login_page).post(login_user))
        .route("/logout", get(logout))
        .route("/post/:post_id", get(show_post).post(comment_on_post))
        .route("/about", get(about))
        .route("/contact", get(contact_page).post(send_contact))
        .merge(admin_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            ctx.clone(),
            errors::render_error_page,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
