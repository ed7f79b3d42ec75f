pub mod handlers;
pub mod session;
pub mod templates;

use crate::storage::CatalogStore;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use session::SessionStore;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub sessions: Arc<SessionStore>,
}

/// One route per CRUD operation and view; mutations answer redirects, views
/// render templates. Everything below `/login`/`/register`/`/` is gated by
/// the `CurrentUser` extractor inside the handlers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::auth::home_no_logeado))
        .route(
            "/login",
            get(handlers::auth::login_form).post(handlers::auth::login),
        )
        .route(
            "/register",
            get(handlers::auth::register_form).post(handlers::auth::register),
        )
        .route("/logout", get(handlers::auth::logout))
        .route("/home", get(handlers::auth::home))
        // Exams
        .route(
            "/crear_examen",
            get(handlers::examenes::crear_examen_form).post(handlers::examenes::crear_examen),
        )
        .route(
            "/editar_examen/:examen_id",
            get(handlers::examenes::editar_examen_form).post(handlers::examenes::editar_examen),
        )
        .route(
            "/eliminar_examen/:examen_id",
            post(handlers::examenes::eliminar_examen),
        )
        .route("/ver_examenes", get(handlers::examenes::ver_examenes))
        .route("/ver_examen/:examen_id", get(handlers::examenes::ver_examen))
        .route("/catalogo", get(handlers::examenes::catalogo))
        // Categories
        .route(
            "/crear_categoria",
            get(handlers::categorias::crear_categoria_form)
                .post(handlers::categorias::crear_categoria),
        )
        .route(
            "/editar_categoria/:categoria_id",
            get(handlers::categorias::editar_categoria_form)
                .post(handlers::categorias::editar_categoria),
        )
        .route(
            "/eliminar_categoria/:categoria_id",
            post(handlers::categorias::eliminar_categoria),
        )
        .route("/ver_categorias", get(handlers::categorias::ver_categorias))
        // Indications
        .route(
            "/crear_indicacion",
            get(handlers::indicaciones::crear_indicacion_form)
                .post(handlers::indicaciones::crear_indicacion),
        )
        .route(
            "/editar_indicacion/:indicacion_id",
            get(handlers::indicaciones::editar_indicacion_form)
                .post(handlers::indicaciones::editar_indicacion),
        )
        .route(
            "/eliminar_indicacion/:indicacion_id",
            post(handlers::indicaciones::eliminar_indicacion),
        )
        .route(
            "/ver_indicaciones",
            get(handlers::indicaciones::ver_indicaciones),
        )
        // Report
        .route("/reporte", get(handlers::reporte::reporte))
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
