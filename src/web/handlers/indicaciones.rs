use crate::domain::Indication;
use crate::error::Result;
use crate::web::session::{CurrentUser, FlashLevel, SessionHandle};
use crate::web::templates::{
    indicaciones_view, CrearIndicacionTemplate, EditarIndicacionTemplate, IndicacionView,
    VerIndicacionesTemplate,
};
use crate::web::AppState;
use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct IndicacionForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
}

pub async fn crear_indicacion_form(
    _user: CurrentUser,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let template = CrearIndicacionTemplate {
        flashes: session.take_flashes(),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn crear_indicacion(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<IndicacionForm>,
) -> Result<Response> {
    let mut indicacion = Indication::new(form.nombre, form.descripcion);
    state.store.create_indication(&mut indicacion).await?;
    info!("Created indication {}", indicacion.nombre);

    session.flash(FlashLevel::Success, "Indicación creada correctamente");
    Ok(Redirect::to("/ver_indicaciones").into_response())
}

pub async fn editar_indicacion_form(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(indicacion_id): Path<Uuid>,
) -> Result<Response> {
    let Some(indicacion) = state.store.get_indication_by_id(indicacion_id).await? else {
        session.flash(FlashLevel::Error, "Indicación no encontrada");
        return Ok(Redirect::to("/ver_indicaciones").into_response());
    };

    let template = EditarIndicacionTemplate {
        flashes: session.take_flashes(),
        indicacion: IndicacionView::from(indicacion),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn editar_indicacion(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(indicacion_id): Path<Uuid>,
    Form(form): Form<IndicacionForm>,
) -> Result<Response> {
    let Some(existing) = state.store.get_indication_by_id(indicacion_id).await? else {
        session.flash(FlashLevel::Error, "Indicación no encontrada");
        return Ok(Redirect::to("/ver_indicaciones").into_response());
    };

    let indicacion = Indication {
        id: Some(indicacion_id),
        nombre: form.nombre,
        descripcion: form.descripcion,
        created_at: existing.created_at,
    };
    state.store.update_indication(&indicacion).await?;
    info!("Updated indication {}", indicacion_id);

    session.flash(FlashLevel::Success, "Indicación actualizada correctamente");
    Ok(Redirect::to("/ver_indicaciones").into_response())
}

pub async fn eliminar_indicacion(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(indicacion_id): Path<Uuid>,
) -> Result<Response> {
    state.store.delete_indication(indicacion_id).await?;
    info!("Deleted indication {}", indicacion_id);

    session.flash(FlashLevel::Success, "Indicación eliminada correctamente");
    Ok(Redirect::to("/ver_indicaciones").into_response())
}

pub async fn ver_indicaciones(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let indicaciones = state.store.get_all_indications().await?;

    let template = VerIndicacionesTemplate {
        flashes: session.take_flashes(),
        indicaciones: indicaciones_view(indicaciones),
    };
    Ok(Html(template.render()?).into_response())
}
