use askama::Template;
use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    authentication::current_user,
    data_formats::{ErrorPage, Viewer},
    mailer::MailError,
    AppContext,
};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("Forbidden")]
    Forbidden,
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("template error: {0}")]
    TemplateError(#[from] askama::Error),
    #[error("mail error: {0}")]
    MailError(#[from] MailError),
    #[error(transparent)]
    ServerError(#[from] anyhow::Error),
}

impl RequestError {
    /// True when the database rejected a write because of a UNIQUE column.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                e.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::NotFound => StatusCode::NOT_FOUND,
            RequestError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            RequestError::NotFound | RequestError::Forbidden | RequestError::NotAuthorized(_) => {
                self.to_string()
            }
            _ => String::from("Internal Server Error"),
        }
    }
}

/// Left on error responses so `render_error_page` can redraw them for the
/// signed in visitor.
#[derive(Debug, Clone)]
struct ErrorDetails {
    status: StatusCode,
    message: String,
}

fn error_page_response(viewer: Viewer, status: StatusCode, message: String) -> Response {
    let page = ErrorPage::new(viewer, status, message.clone());
    let mut response = match page.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render error page");
            (status, message.clone()).into_response()
        }
    };
    response
        .extensions_mut()
        .insert(ErrorDetails { status, message });
    response
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        error_page_response(Viewer::default(), status_code, self.public_message())
    }
}

/// Error pages are rendered without knowing who asked; this puts the
/// visitor's navigation back on them.
pub async fn render_error_page<B>(
    State(ctx): State<AppContext>,
    request: Request<B>,
    next: Next<B>,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let response = next.run(request).await;
    let details = match response.extensions().get::<ErrorDetails>() {
        Some(details) => details.clone(),
        None => return response,
    };

    match current_user(&ctx, &jar).await {
        Ok(Some(user)) => {
            error_page_response(Viewer::new(Some(&user)), details.status, details.message)
        }
        Ok(None) => response,
        Err(e) => {
            tracing::debug!(error = %e, "could not resolve visitor for error page");
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(RequestError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(RequestError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            RequestError::NotAuthorized("Login required").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RequestError::DatabaseError(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_their_cause() {
        let error = RequestError::ServerError(anyhow::anyhow!("secret detail"));
        assert_eq!(error.public_message(), "Internal Server Error");
        assert!(!RequestError::NotFound.is_unique_violation());
    }
}
