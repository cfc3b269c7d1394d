use anyhow::Context;
use serde::Deserialize;

use crate::data_formats::normalize_email;

/// Runtime settings, read from the process environment (and `.env` if present).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(rename = "secret_key")]
    pub session_secret: String,
    /// Registering with this address grants the admin role.
    #[serde(default)]
    pub admin_email: Option<String>,
    #[serde(rename = "my_email", default)]
    pub mail_sender: String,
    #[serde(rename = "my_app_password", default)]
    pub mail_password: String,
    #[serde(rename = "to_email", default)]
    pub mail_recipient: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_database_url() -> String {
    String::from("sqlite://posts.db")
}

fn default_smtp_host() -> String {
    String::from("smtp.gmail.com")
}

fn default_smtp_port() -> u16 {
    587
}

fn default_bind_address() -> String {
    String::from("127.0.0.1:5002")
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().context("Failed to read configuration from environment")
    }

    /// `email` must already be normalised; the configured address is normalised here.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_email
            .as_deref()
            .map(|admin| normalize_email(admin) == email)
            .unwrap_or(false)
    }
}
