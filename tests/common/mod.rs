#![allow(dead_code)]

use std::{
    net::TcpListener,
    sync::{Arc, Mutex},
};

use blog::{run_app, AppContext, Config, MailError, Mailer, OutgoingMail};
use reqwest::{redirect::Policy, Client, Response};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "correct horse battery staple";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[axum::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_config() -> Config {
    Config {
        database_url: String::from("sqlite::memory:"),
        session_secret: String::from("integration-test-secret"),
        admin_email: Some(ADMIN_EMAIL.to_owned()),
        mail_sender: String::from("blog@example.com"),
        mail_password: String::from("app-password"),
        mail_recipient: String::from("owner@example.com"),
        smtp_host: String::from("localhost"),
        smtp_port: 2525,
        bind_address: String::from("127.0.0.1:0"),
    }
}

pub async fn spawn_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    spawn_app_with_mailer(mailer.clone(), mailer).await
}

pub async fn spawn_app_with_mailer(
    mailer: Arc<dyn Mailer>,
    recorder: Arc<RecordingMailer>,
) -> TestApp {
    // one connection that never expires, so the in-memory database lives as long as the app
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    blog::run_migrations(&pool).await.unwrap();

    let ctx = AppContext::from_parts(pool.clone(), test_config(), mailer);
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(run_app(ctx, listener));

    TestApp {
        address,
        pool,
        mailer: recorder,
    }
}

pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client.post(self.url(path)).form(form).send().await.unwrap()
    }

    pub async fn register(
        &self,
        client: &Client,
        email: &str,
        password: &str,
        confirm_password: &str,
        name: &str,
    ) -> Response {
        self.post_form(
            client,
            "/register",
            &[
                ("email", email),
                ("password", password),
                ("confirm_password", confirm_password),
                ("name", name),
            ],
        )
        .await
    }

    pub async fn login(&self, client: &Client, email: &str, password: &str) -> Response {
        self.post_form(client, "/login", &[("email", email), ("password", password)])
            .await
    }

    /// Registers `email` and returns a client holding its session.
    pub async fn logged_in(&self, email: &str, name: &str) -> Client {
        let client = browser();
        let response = self.register(&client, email, PASSWORD, PASSWORD, name).await;
        assert_eq!(location(&response), "/login?registered_now=true");
        let response = self.login(&client, email, PASSWORD).await;
        assert_eq!(location(&response), "/");
        client
    }

    pub async fn admin(&self) -> Client {
        self.logged_in(ADMIN_EMAIL, "Admin").await
    }

    pub async fn create_post(&self, client: &Client, title: &str) -> Response {
        self.post_form(
            client,
            "/new-post",
            &[
                ("title", title),
                ("subtitle", "A subtitle"),
                ("body", "<p>Some body</p>"),
                ("img_url", "https://example.com/cover.jpg"),
            ],
        )
        .await
    }

    pub async fn post_id_by_title(&self, title: &str) -> i64 {
        sqlx::query_scalar("SELECT id FROM blog_posts WHERE title = $1")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
