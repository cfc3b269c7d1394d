use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    authentication::{
        create_session_token, end_session, hash_password_argon2, set_flash, start_session,
        take_flash, verify_password_argon2, MaybeUser,
    },
    data_formats::{
        normalize_email, validation_messages, AboutPage, CommentRequest, CommentView,
        ContactPage, ContactRequest, Flash, IndexPage, LoginFlags, LoginPage, LoginRequest,
        MakePostPage, PostPage, PostRequest, RegisterFlags, RegisterPage, RegisterRequest, Viewer,
    },
    db_helpers::{
        add_comment_to_post_in_db, create_post_in_db, delete_post_in_db, get_comments_for_post_in_db,
        get_post_by_id_in_db, get_user_by_email, insert_user, list_posts_in_db, update_post_in_db,
        NewUser,
    },
    errors::RequestError,
    mailer::{OutgoingMail, CONTACT_SUBJECT},
    models::User,
    AppContext,
};

type HtmlResult = Result<Html<String>, RequestError>;

const DUPLICATE_TITLE: &str = "A post with this title already exists";

fn render<T: Template>(page: T) -> HtmlResult {
    Ok(Html(page.render()?))
}

/// Re-renders a form page that failed validation.
fn render_invalid<T: Template>(page: T) -> Result<Response, RequestError> {
    Ok((StatusCode::UNPROCESSABLE_ENTITY, render(page)?).into_response())
}

fn today() -> String {
    chrono::Local::now().format("%B %d, %Y").to_string()
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> RequestError {
    tracing::debug!(%uri, "no route matched");
    RequestError::NotFound
}

// ----------------- User Handlers -----------------
pub async fn register_page(
    maybe_user: MaybeUser,
    Query(flags): Query<RegisterFlags>,
) -> HtmlResult {
    render(RegisterPage {
        viewer: Viewer::new(maybe_user.get()),
        is_no_match: flags.is_no_match,
        has_to_register: flags.has_to_register,
        ..Default::default()
    })
}

pub async fn register_user(
    State(ctx): State<AppContext>,
    maybe_user: MaybeUser,
    Form(mut request): Form<RegisterRequest>,
) -> Result<Response, RequestError> {
    request.email = normalize_email(&request.email);
    if let Err(errors) = request.validate() {
        return render_invalid(RegisterPage {
            viewer: Viewer::new(maybe_user.get()),
            email: request.email,
            name: request.name,
            errors: validation_messages(&errors),
            ..Default::default()
        });
    }

    if get_user_by_email(&ctx.pool, &request.email).await?.is_some() {
        return Ok(Redirect::to("/login?is_already_exist=true").into_response());
    }

    if request.password != request.confirm_password {
        return Ok(Redirect::to("/register?is_no_match=true").into_response());
    }

    let password_hash = hash_password_argon2(request.password).await?;
    let new_user = NewUser {
        email: &request.email,
        name: &request.name,
        password_hash: &password_hash,
        is_admin: ctx.config.is_admin_email(&request.email),
    };

    match insert_user(&ctx.pool, new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, is_admin = user.is_admin, "user registered");
            Ok(Redirect::to("/login?registered_now=true").into_response())
        }
        // Lost a race with a concurrent registration of the same email.
        Err(e) if e.is_unique_violation() => {
            Ok(Redirect::to("/login?is_already_exist=true").into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn login_page(
    maybe_user: MaybeUser,
    Query(flags): Query<LoginFlags>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), RequestError> {
    let (jar, flash) = take_flash(jar);
    let page = render(LoginPage {
        viewer: Viewer::new(maybe_user.get()),
        messages: flash.map(|f| f.message().to_owned()).into_iter().collect(),
        is_already_exist: flags.is_already_exist,
        registered_now: flags.registered_now,
        password_incorrect: flags.password_incorrect,
        ..Default::default()
    })?;
    Ok((jar, page))
}

pub async fn login_user(
    State(ctx): State<AppContext>,
    maybe_user: MaybeUser,
    jar: CookieJar,
    Form(mut request): Form<LoginRequest>,
) -> Result<Response, RequestError> {
    request.email = normalize_email(&request.email);
    if let Err(errors) = request.validate() {
        return render_invalid(LoginPage {
            viewer: Viewer::new(maybe_user.get()),
            email: request.email,
            errors: validation_messages(&errors),
            ..Default::default()
        });
    }

    let user = match get_user_by_email(&ctx.pool, &request.email).await? {
        Some(user) => user,
        None => return Ok(Redirect::to("/register?has_to_register=true").into_response()),
    };

    let is_password_correct = verify_password_argon2(request.password, user.password).await?;
    if !is_password_correct {
        tracing::debug!(user_id = user.id, "incorrect password");
        return Ok(Redirect::to("/login?password_incorrect=true").into_response());
    }

    let token = create_session_token(user.id, &ctx.config.session_secret)?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok((start_session(jar, token), Redirect::to("/")).into_response())
}

pub async fn logout(
    MaybeUser(maybe_user): MaybeUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), RequestError> {
    match maybe_user {
        Some(user) => {
            tracing::info!(user_id = user.id, "user logged out");
            Ok((end_session(jar), Redirect::to("/")))
        }
        None => Err(RequestError::NotAuthorized("Login required")),
    }
}

// ----------------- Post Handlers -----------------
pub async fn get_all_posts(State(ctx): State<AppContext>, maybe_user: MaybeUser) -> HtmlResult {
    let posts = list_posts_in_db(&ctx.pool).await?;
    render(IndexPage {
        viewer: Viewer::new(maybe_user.get()),
        posts,
    })
}

async fn post_page(
    ctx: &AppContext,
    viewer: Viewer,
    post_id: i64,
    errors: Vec<String>,
) -> Result<PostPage, RequestError> {
    let post = get_post_by_id_in_db(&ctx.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    let comments = get_comments_for_post_in_db(&ctx.pool, post_id)
        .await?
        .into_iter()
        .map(CommentView::new)
        .collect();
    Ok(PostPage {
        viewer,
        post,
        comments,
        errors,
    })
}

pub async fn show_post(
    State(ctx): State<AppContext>,
    maybe_user: MaybeUser,
    Path(post_id): Path<i64>,
) -> HtmlResult {
    let page = post_page(&ctx, Viewer::new(maybe_user.get()), post_id, vec![]).await?;
    render(page)
}

pub async fn comment_on_post(
    State(ctx): State<AppContext>,
    MaybeUser(maybe_user): MaybeUser,
    Path(post_id): Path<i64>,
    jar: CookieJar,
    Form(request): Form<CommentRequest>,
) -> Result<Response, RequestError> {
    if get_post_by_id_in_db(&ctx.pool, post_id).await?.is_none() {
        return Err(RequestError::NotFound);
    }

    let user = match maybe_user {
        Some(user) => user,
        None => {
            let jar = set_flash(jar, Flash::LoginToComment);
            return Ok((jar, Redirect::to("/login")).into_response());
        }
    };
    let viewer = Viewer::new(Some(&user));

    if let Err(errors) = request.validate() {
        let page = post_page(&ctx, viewer, post_id, validation_messages(&errors)).await?;
        return render_invalid(page);
    }

    let comment = add_comment_to_post_in_db(&ctx.pool, user.id, post_id, &request.comment).await?;
    tracing::info!(
        comment_id = comment.id,
        post_id = comment.post_id,
        user_id = comment.author_id,
        "comment added"
    );

    let page = post_page(&ctx, viewer, post_id, vec![]).await?;
    Ok(render(page)?.into_response())
}

// ----------------- Admin Handlers -----------------
pub async fn new_post_page(Extension(admin): Extension<User>) -> HtmlResult {
    render(MakePostPage::create(
        Viewer::new(Some(&admin)),
        PostRequest::default(),
        vec![],
    ))
}

pub async fn create_post(
    State(ctx): State<AppContext>,
    Extension(admin): Extension<User>,
    Form(request): Form<PostRequest>,
) -> Result<Response, RequestError> {
    let viewer = Viewer::new(Some(&admin));
    if let Err(errors) = request.validate() {
        return render_invalid(MakePostPage::create(
            viewer,
            request,
            validation_messages(&errors),
        ));
    }

    match create_post_in_db(&ctx.pool, admin.id, &today(), request.clone()).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, author_id = post.author_id, "post created");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_unique_violation() => render_invalid(MakePostPage::create(
            viewer,
            request,
            vec![DUPLICATE_TITLE.to_owned()],
        )),
        Err(e) => Err(e),
    }
}

pub async fn edit_post_page(
    State(ctx): State<AppContext>,
    Extension(admin): Extension<User>,
    Path(post_id): Path<i64>,
) -> HtmlResult {
    let post = get_post_by_id_in_db(&ctx.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound)?;
    render(MakePostPage::edit(
        Viewer::new(Some(&admin)),
        post_id,
        post.into(),
        vec![],
    ))
}

pub async fn update_post(
    State(ctx): State<AppContext>,
    Extension(admin): Extension<User>,
    Path(post_id): Path<i64>,
    Form(request): Form<PostRequest>,
) -> Result<Response, RequestError> {
    let viewer = Viewer::new(Some(&admin));
    if let Err(errors) = request.validate() {
        return render_invalid(MakePostPage::edit(
            viewer,
            post_id,
            request,
            validation_messages(&errors),
        ));
    }

    match update_post_in_db(&ctx.pool, post_id, admin.id, request.clone()).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, author_id = post.author_id, "post updated");
            Ok(Redirect::to(&format!("/post/{}", post.id)).into_response())
        }
        Err(e) if e.is_unique_violation() => render_invalid(MakePostPage::edit(
            viewer,
            post_id,
            request,
            vec![DUPLICATE_TITLE.to_owned()],
        )),
        Err(e) => Err(e),
    }
}

pub async fn delete_post(
    State(ctx): State<AppContext>,
    Extension(admin): Extension<User>,
    Path(post_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    delete_post_in_db(&ctx.pool, post_id).await?;
    tracing::info!(post_id, user_id = admin.id, "post deleted");
    Ok(Redirect::to("/"))
}

// ----------------- Static Pages -----------------
pub async fn about(maybe_user: MaybeUser) -> HtmlResult {
    render(AboutPage {
        viewer: Viewer::new(maybe_user.get()),
    })
}

pub async fn contact_page(maybe_user: MaybeUser) -> HtmlResult {
    render(ContactPage {
        viewer: Viewer::new(maybe_user.get()),
        msg_sent: false,
    })
}

pub async fn send_contact(
    State(ctx): State<AppContext>,
    maybe_user: MaybeUser,
    Form(request): Form<ContactRequest>,
) -> HtmlResult {
    ctx.mailer
        .send(OutgoingMail {
            subject: CONTACT_SUBJECT.to_owned(),
            body: request.to_message(),
        })
        .await?;
    render(ContactPage {
        viewer: Viewer::new(maybe_user.get()),
        msg_sent: true,
    })
}
