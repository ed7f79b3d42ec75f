use crate::domain::User;
use crate::error::Result;
use crate::web::session::{CurrentUser, FlashLevel, SessionHandle};
use crate::web::templates::{
    HomeNoLogeadoTemplate, LayoutTemplate, LoginTemplate, RegisterTemplate,
};
use crate::web::AppState;
use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use tracing::info;

/// Landing page for anonymous visitors; logged-in users go straight home.
pub async fn home_no_logeado(Extension(session): Extension<SessionHandle>) -> Result<Response> {
    if session.username().is_some() {
        return Ok(Redirect::to("/home").into_response());
    }
    let template = HomeNoLogeadoTemplate {
        flashes: session.take_flashes(),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn home(
    user: CurrentUser,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let template = LayoutTemplate {
        flashes: session.take_flashes(),
        username: user.username,
    };
    Ok(Html(template.render()?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form(Extension(session): Extension<SessionHandle>) -> Result<Response> {
    let template = LoginTemplate {
        flashes: session.take_flashes(),
    };
    Ok(Html(template.render()?).into_response())
}

/// Byte-for-byte password comparison against the stored document; no
/// hashing, lockout, or rate limiting in this system.
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = state.store.get_user_by_username(&form.username).await?;

    match user {
        Some(user) if user.password == form.password => {
            session.set_username(&user.username);
            session.flash(FlashLevel::Success, "Inicio de sesión exitoso");
            info!("User {} logged in", user.username);
            Ok(Redirect::to("/home").into_response())
        }
        _ => {
            session.flash(
                FlashLevel::Error,
                "Credenciales incorrectas. Por favor, inténtalo de nuevo.",
            );
            let template = LoginTemplate {
                flashes: session.take_flashes(),
            };
            Ok(Html(template.render()?).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

pub async fn register_form(Extension(session): Extension<SessionHandle>) -> Result<Response> {
    let template = RegisterTemplate {
        flashes: session.take_flashes(),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.confirm_password {
        session.flash(
            FlashLevel::Error,
            "Las contraseñas no coinciden. Por favor, inténtalo de nuevo.",
        );
        let template = RegisterTemplate {
            flashes: session.take_flashes(),
        };
        return Ok(Html(template.render()?).into_response());
    }

    if state
        .store
        .get_user_by_username(&form.username)
        .await?
        .is_some()
    {
        session.flash(
            FlashLevel::Error,
            "El nombre de usuario ya está en uso. Por favor, elige otro.",
        );
        let template = RegisterTemplate {
            flashes: session.take_flashes(),
        };
        return Ok(Html(template.render()?).into_response());
    }

    let mut user = User::new(form.username, form.password);
    state.store.create_user(&mut user).await?;
    info!("Registered user {}", user.username);

    session.flash(FlashLevel::Success, "Registro exitoso. Por favor, inicia sesión.");
    Ok(Redirect::to("/login").into_response())
}

pub async fn logout(Extension(session): Extension<SessionHandle>) -> Response {
    session.clear_username();
    session.flash(FlashLevel::Success, "Sesión cerrada correctamente");
    Redirect::to("/").into_response()
}
