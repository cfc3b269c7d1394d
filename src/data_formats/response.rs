use askama::Template;
use axum::http::StatusCode;
use sha2::{Digest, Sha256};

use crate::data_formats::request::PostRequest;
use crate::models::{Comment, Post, User};

/// What the navigation bar needs to know about whoever is browsing.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub name: String,
}

impl Viewer {
    pub fn new(user: Option<&User>) -> Self {
        match user {
            Some(user) => Viewer {
                is_authenticated: true,
                is_admin: user.is_admin,
                name: user.name.clone(),
            },
            None => Viewer::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub text: String,
    pub author_name: String,
    pub avatar_url: String,
}

impl CommentView {
    pub fn new(
        Comment {
            text,
            author_name,
            author_email,
            ..
        }: Comment,
    ) -> Self {
        CommentView {
            text,
            author_name,
            avatar_url: gravatar_url(&author_email),
        }
    }
}

/// Gravatar image for an email: size 100, rating g, retro fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=100&d=retro&r=g",
        hex::encode(digest)
    )
}

// ----------------- Pages -----------------

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub viewer: Viewer,
    pub posts: Vec<Post>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostPage {
    pub viewer: Viewer,
    pub post: Post,
    pub comments: Vec<CommentView>,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "make_post.html")]
pub struct MakePostPage {
    pub viewer: Viewer,
    pub is_edit: bool,
    pub action: String,
    pub form: PostRequest,
    pub errors: Vec<String>,
}

impl MakePostPage {
    pub fn create(viewer: Viewer, form: PostRequest, errors: Vec<String>) -> Self {
        MakePostPage {
            viewer,
            is_edit: false,
            action: String::from("/new-post"),
            form,
            errors,
        }
    }

    pub fn edit(viewer: Viewer, post_id: i64, form: PostRequest, errors: Vec<String>) -> Self {
        MakePostPage {
            viewer,
            is_edit: true,
            action: format!("/edit-post/{post_id}"),
            form,
            errors,
        }
    }
}

impl From<Post> for PostRequest {
    fn from(
        Post {
            title,
            subtitle,
            body,
            img_url,
            ..
        }: Post,
    ) -> Self {
        PostRequest {
            title,
            subtitle,
            body,
            img_url,
        }
    }
}

#[derive(Template, Default)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub viewer: Viewer,
    pub email: String,
    pub name: String,
    pub errors: Vec<String>,
    pub is_no_match: bool,
    pub has_to_register: bool,
}

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub viewer: Viewer,
    pub email: String,
    pub errors: Vec<String>,
    pub messages: Vec<String>,
    pub is_already_exist: bool,
    pub registered_now: bool,
    pub password_incorrect: bool,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutPage {
    pub viewer: Viewer,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactPage {
    pub viewer: Viewer,
    pub msg_sent: bool,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub viewer: Viewer,
    pub status: u16,
    pub reason: String,
    pub message: String,
}

impl ErrorPage {
    pub fn new(viewer: Viewer, status: StatusCode, message: String) -> Self {
        ErrorPage {
            viewer,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        }
    }
}
