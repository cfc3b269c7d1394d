mod common;

use std::sync::Arc;

use blog::{MailError, Mailer, OutgoingMail, CONTACT_SUBJECT};
use common::{browser, spawn_app, spawn_app_with_mailer, RecordingMailer};
use reqwest::StatusCode;

struct BrokenMailer;

#[axum::async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        let error = "not an address"
            .parse::<lettre::Address>()
            .unwrap_err();
        Err(error.into())
    }
}

fn contact_form<'a>(message: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("name", "Visitor"),
        ("email", "visitor@example.com"),
        ("phone", "555-0100"),
        ("message", message),
    ]
}

#[tokio::test]
async fn contact_page_renders() {
    let app = spawn_app().await;
    let response = app.get(&browser(), "/contact").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Contact Me"));
}

#[tokio::test]
async fn contact_message_is_sent_without_non_ascii() {
    let app = spawn_app().await;

    let response = app
        .post_form(&browser(), "/contact", &contact_form("Loved it 🎉 – thanks!"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Successfully sent your message"));

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, CONTACT_SUBJECT);
    assert_eq!(
        sent[0].body,
        "Name: Visitor\nEmail: visitor@example.com\nPhone Number: 555-0100\nMessage: Loved it   thanks!"
    );
    assert!(sent[0].body.is_ascii());
}

#[tokio::test]
async fn mail_failure_is_a_server_error() {
    let recorder = Arc::new(RecordingMailer::default());
    let app = spawn_app_with_mailer(Arc::new(BrokenMailer), recorder).await;

    let response = app
        .post_form(&browser(), "/contact", &contact_form("hello"))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Internal Server Error"));
}
