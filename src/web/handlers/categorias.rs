use crate::domain::Category;
use crate::error::Result;
use crate::web::session::{CurrentUser, FlashLevel, SessionHandle};
use crate::web::templates::{
    categorias_view, CategoriaView, CrearCategoriaTemplate, EditarCategoriaTemplate,
    VerCategoriasTemplate,
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
pub struct CategoriaForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
}

pub async fn crear_categoria_form(
    _user: CurrentUser,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let template = CrearCategoriaTemplate {
        flashes: session.take_flashes(),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn crear_categoria(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Form(form): Form<CategoriaForm>,
) -> Result<Response> {
    let mut categoria = Category::new(form.nombre, form.descripcion);
    state.store.create_category(&mut categoria).await?;
    info!("Created category {}", categoria.nombre);

    session.flash(FlashLevel::Success, "Categoría creada correctamente");
    Ok(Redirect::to("/ver_categorias").into_response())
}

pub async fn editar_categoria_form(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(categoria_id): Path<Uuid>,
) -> Result<Response> {
    let Some(categoria) = state.store.get_category_by_id(categoria_id).await? else {
        session.flash(FlashLevel::Error, "Categoría no encontrada");
        return Ok(Redirect::to("/ver_categorias").into_response());
    };

    let template = EditarCategoriaTemplate {
        flashes: session.take_flashes(),
        categoria: CategoriaView::from(categoria),
    };
    Ok(Html(template.render()?).into_response())
}

/// Renaming a category does not touch exams holding the old name; those
/// copies silently orphan (see DESIGN.md).
pub async fn editar_categoria(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(categoria_id): Path<Uuid>,
    Form(form): Form<CategoriaForm>,
) -> Result<Response> {
    let Some(existing) = state.store.get_category_by_id(categoria_id).await? else {
        session.flash(FlashLevel::Error, "Categoría no encontrada");
        return Ok(Redirect::to("/ver_categorias").into_response());
    };

    let categoria = Category {
        id: Some(categoria_id),
        nombre: form.nombre,
        descripcion: form.descripcion,
        created_at: existing.created_at,
    };
    state.store.update_category(&categoria).await?;
    info!("Updated category {}", categoria_id);

    session.flash(FlashLevel::Success, "Categoría actualizada correctamente");
    Ok(Redirect::to("/ver_categorias").into_response())
}

/// No cascade: exams referencing the deleted category keep its name.
pub async fn eliminar_categoria(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    Path(categoria_id): Path<Uuid>,
) -> Result<Response> {
    state.store.delete_category(categoria_id).await?;
    info!("Deleted category {}", categoria_id);

    session.flash(FlashLevel::Success, "Categoría eliminada correctamente");
    Ok(Redirect::to("/ver_categorias").into_response())
}

pub async fn ver_categorias(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let categorias = state.store.get_all_categories().await?;

    let template = VerCategoriasTemplate {
        flashes: session.take_flashes(),
        categorias: categorias_view(categorias),
    };
    Ok(Html(template.render()?).into_response())
}
