use crate::domain::Exam;
use crate::error::Result;
use crate::web::session::{CurrentUser, FlashLevel, SessionHandle};
use crate::web::templates::{
    categorias_view, examenes_view, indicaciones_view, CatalogoTemplate, CrearExamenTemplate,
    EditarExamenTemplate, ExamenView, VerExamenTemplate, VerExamenesTemplate,
};
use crate::web::AppState;
use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Exam form fields. The multi-select submits `indicaciones` as repeated
/// keys, which the urlencoded deserializer cannot collect into a Vec, so the
/// handlers take the raw pairs and fold them here. Missing fields fall back
/// to their empty defaults: an edit is a full overwrite, not a patch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExamenForm {
    pub codigo: String,
    pub categoria: String,
    pub tipo_muestra: String,
    pub precio: String,
    pub indicaciones: Vec<String>,
}

impl ExamenForm {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "codigo" => form.codigo = value,
                "categoria" => form.categoria = value,
                "tipo_muestra" => form.tipo_muestra = value,
                "precio" => form.precio = value,
                "indicaciones" => form.indicaciones.push(value),
                _ => {}
            }
        }
        form
    }
}

pub async fn crear_examen_form(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let categorias = state.store.get_all_categories().await?;
    let indicaciones = state.store.get_all_indications().await?;

    let template = CrearExamenTemplate {
        flashes: session.take_flashes(),
        categorias: categorias_view(categorias),
        indicaciones: indicaciones_view(indicaciones),
    };
    Ok(Html(template.render()?).into_response())
}

/// All fields are stored verbatim from the form; `precio` stays a string.
pub async fn crear_examen(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = ExamenForm::from_pairs(pairs);

    let mut examen = Exam {
        id: None,
        codigo: form.codigo,
        categoria: form.categoria,
        tipo_muestra: form.tipo_muestra,
        precio: form.precio,
        indicaciones: form.indicaciones,
        created_at: Utc::now(),
    };
    state.store.create_exam(&mut examen).await?;
    info!("Created exam {}", examen.codigo);

    session.flash(FlashLevel::Success, "Examen creado correctamente");
    Ok(Redirect::to("/catalogo").into_response())
}

pub async fn editar_examen_form(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(examen_id): Path<Uuid>,
) -> Result<Response> {
    let Some(examen) = state.store.get_exam_by_id(examen_id).await? else {
        session.flash(FlashLevel::Error, "Examen no encontrado");
        return Ok(Redirect::to("/catalogo").into_response());
    };

    let categorias = state.store.get_all_categories().await?;
    let indicaciones = state.store.get_all_indications().await?;

    let template = EditarExamenTemplate {
        flashes: session.take_flashes(),
        examen: ExamenView::from(examen),
        categorias: categorias_view(categorias),
        indicaciones: indicaciones_view(indicaciones),
    };
    Ok(Html(template.render()?).into_response())
}

/// Overwrites all five fields with the submitted values; anything left out
/// of the submission does not survive the edit.
pub async fn editar_examen(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(examen_id): Path<Uuid>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let Some(existing) = state.store.get_exam_by_id(examen_id).await? else {
        session.flash(FlashLevel::Error, "Examen no encontrado");
        return Ok(Redirect::to("/catalogo").into_response());
    };

    let form = ExamenForm::from_pairs(pairs);
    let examen = Exam {
        id: Some(examen_id),
        codigo: form.codigo,
        categoria: form.categoria,
        tipo_muestra: form.tipo_muestra,
        precio: form.precio,
        indicaciones: form.indicaciones,
        created_at: existing.created_at,
    };
    state.store.update_exam(&examen).await?;
    info!("Updated exam {}", examen_id);

    session.flash(FlashLevel::Success, "Examen actualizado correctamente");
    Ok(Redirect::to("/catalogo").into_response())
}

/// Deleting an id that does not exist is a silent no-op.
pub async fn eliminar_examen(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(examen_id): Path<Uuid>,
) -> Result<Response> {
    state.store.delete_exam(examen_id).await?;
    info!("Deleted exam {}", examen_id);

    session.flash(FlashLevel::Success, "Examen eliminado correctamente");
    Ok(Redirect::to("/catalogo").into_response())
}

pub async fn ver_examenes(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let exams = state.store.get_all_exams().await?;

    let template = VerExamenesTemplate {
        flashes: session.take_flashes(),
        exams: examenes_view(exams),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn ver_examen(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(examen_id): Path<Uuid>,
) -> Result<Response> {
    let Some(examen) = state.store.get_exam_by_id(examen_id).await? else {
        session.flash(FlashLevel::Error, "Examen no encontrado");
        return Ok(Redirect::to("/catalogo").into_response());
    };

    let template = VerExamenTemplate {
        flashes: session.take_flashes(),
        examen: ExamenView::from(examen),
    };
    Ok(Html(template.render()?).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogoQuery {
    pub categoria: Option<String>,
    pub tipo_muestra: Option<String>,
}

/// Filters are mutually exclusive: a non-empty `categoria` wins, else a
/// non-empty `tipo_muestra` applies, else everything is returned.
pub async fn catalogo(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Query(filtro): Query<CatalogoQuery>,
) -> Result<Response> {
    let has_non_empty_filter =
        |opt: &Option<String>| opt.as_ref().map_or(false, |s| !s.trim().is_empty());

    let exams = if has_non_empty_filter(&filtro.categoria) {
        state
            .store
            .get_exams_by_categoria(filtro.categoria.as_deref().unwrap_or_default())
            .await?
    } else if has_non_empty_filter(&filtro.tipo_muestra) {
        state
            .store
            .get_exams_by_tipo_muestra(filtro.tipo_muestra.as_deref().unwrap_or_default())
            .await?
    } else {
        state.store.get_all_exams().await?
    };

    let categorias = state.store.get_all_categories().await?;

    let template = CatalogoTemplate {
        flashes: session.take_flashes(),
        exams: examenes_view(exams),
        categorias: categorias_view(categorias),
    };
    Ok(Html(template.render()?).into_response())
}
