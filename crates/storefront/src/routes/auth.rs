//! Authentication route handlers.
//!
//! Sign-up, email verification, login/logout and password reset. Forms are
//! re-rendered with an inline error on bad input; successful steps redirect.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::safe_next;
use crate::middleware::{Flash, PageContext, clear_current_user, set_current_user, with_flash};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-up form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

/// Query carrying the post-login destination.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Shown after sign-up: check your inbox.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup_success.html")]
pub struct SignupSuccessTemplate {
    pub ctx: PageContext,
    pub email: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
    pub email: String,
    pub next: String,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub ctx: PageContext,
    pub error: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub ctx: PageContext,
    pub token: String,
    /// `false` shows the "link expired" message instead of the form.
    pub valid_link: bool,
    pub error: Option<String>,
}

/// Password reset done page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_complete.html")]
pub struct ResetCompleteTemplate {
    pub ctx: PageContext,
}

/// Split an auth failure into a form message or a server error.
fn form_error(err: AuthError) -> Result<String, AppError> {
    match err {
        AuthError::Repository(_) | AuthError::PasswordHash => Err(err.into()),
        other => Ok(other.public_message()),
    }
}

// =============================================================================
// Sign-up and Verification
// =============================================================================

/// Display the sign-up page.
pub async fn signup_page(ctx: PageContext) -> SignupTemplate {
    SignupTemplate {
        ctx,
        error: None,
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

/// Handle sign-up: create an inactive account and email the verification link.
///
/// A failed email is logged; the account exists either way.
#[instrument(skip(state, ctx, form), fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let registration = Registration {
        email: &form.email,
        first_name: &form.first_name,
        last_name: &form.last_name,
        password: &form.password1,
        password_confirm: &form.password2,
    };

    let (user, token) = match state.auth().register(&registration).await {
        Ok(created) => created,
        Err(err) => {
            return Ok(SignupTemplate {
                ctx,
                error: Some(form_error(err)?),
                email: form.email,
                first_name: form.first_name,
                last_name: form.last_name,
            }
            .into_response());
        }
    };

    let link = state.config().absolute_url(&format!("/verify-email/{token}"));
    if let Err(e) = state
        .email()
        .send_verification(user.email.as_str(), &user.first_name, &link)
        .await
    {
        tracing::warn!(user_id = %user.id, error = %e, "Failed to send verification email");
    }

    Ok(SignupSuccessTemplate {
        ctx,
        email: user.email.into_inner(),
    }
    .into_response())
}

/// Follow the emailed verification link: activate and log in.
#[instrument(skip(state, session, token))]
pub async fn verify_email(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Redirect, AppError> {
    match state.auth().verify_email(&token).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            let flash = Flash::Success(format!(
                "Welcome to WENDY WOO, {}! Your email has been verified.",
                user.display_name()
            ));
            Ok(Redirect::to(&with_flash("/", &flash)))
        }
        Err(err) => {
            let flash = Flash::Error(form_error(err)?);
            Ok(Redirect::to(&with_flash("/login", &flash)))
        }
    }
}

// =============================================================================
// Login and Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(ctx: PageContext, Query(query): Query<NextQuery>) -> LoginTemplate {
    LoginTemplate {
        ctx,
        error: None,
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, ctx, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).to_string();

    match state.auth().login(&form.email, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            set_sentry_user(&user.id, Some(user.email.as_str()));
            tracing::info!(user_id = %user.id, "User logged in");
            Ok(Redirect::to(&next).into_response())
        }
        Err(err) => Ok(LoginTemplate {
            ctx,
            error: Some(form_error(err)?),
            email: form.email,
            next,
        }
        .into_response()),
    }
}

/// Log out, keeping nothing but an anonymous session.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    let flash = Flash::Success("You have been logged out.".to_string());
    Ok(Redirect::to(&with_flash("/", &flash)))
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(ctx: PageContext) -> ForgotPasswordTemplate {
    ForgotPasswordTemplate { ctx, error: None }
}

/// Email a reset link to an existing account.
#[instrument(skip(state, ctx, form), fields(email = %form.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ctx: PageContext,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();

    let (user, token) = match state.auth().request_password_reset(email).await {
        Ok(issued) => issued,
        Err(err) => {
            return Ok(ForgotPasswordTemplate {
                ctx,
                error: Some(form_error(err)?),
            }
            .into_response());
        }
    };

    let link = state.config().absolute_url(&format!("/reset/{token}"));
    state
        .email()
        .send_password_reset(user.email.as_str(), user.display_name(), &link)
        .await?;

    let flash = Flash::Success(format!("Password reset email has been sent to {email}"));
    Ok(Redirect::to(&with_flash("/forgot-password", &flash)).into_response())
}

/// Display the new password form for an emailed reset link.
#[instrument(skip(state, ctx, token))]
pub async fn reset_page(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(token): Path<String>,
) -> Result<ResetPasswordTemplate, AppError> {
    let valid_link = state.auth().reset_token_is_valid(&token).await?;
    Ok(ResetPasswordTemplate {
        ctx,
        token,
        valid_link,
        error: None,
    })
}

/// Set the new password and consume the link.
#[instrument(skip(state, ctx, token, form))]
pub async fn reset(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    match state
        .auth()
        .reset_password(&token, &form.new_password1, &form.new_password2)
        .await
    {
        Ok(()) => Ok(Redirect::to("/password-reset-complete").into_response()),
        Err(AuthError::InvalidToken) => Ok(ResetPasswordTemplate {
            ctx,
            token,
            valid_link: false,
            error: None,
        }
        .into_response()),
        Err(err) => Ok(ResetPasswordTemplate {
            ctx,
            token,
            valid_link: true,
            error: Some(form_error(err)?),
        }
        .into_response()),
    }
}

/// Display the reset confirmation page.
pub async fn reset_complete(ctx: PageContext) -> ResetCompleteTemplate {
    ResetCompleteTemplate { ctx }
}
