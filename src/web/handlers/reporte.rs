use crate::error::Result;
use crate::reports;
use crate::web::session::{CurrentUser, SessionHandle};
use crate::web::templates::ReporteTemplate;
use crate::web::AppState;
use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;

/// Three independent aggregates over the exam collection, materialized
/// eagerly; result sets are small.
pub async fn reporte(
    _user: CurrentUser,
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Result<Response> {
    let exams = state.store.get_all_exams().await?;

    let template = ReporteTemplate {
        flashes: session.take_flashes(),
        categorias_count: reports::category_counts(&exams),
        indicacion_comun: reports::most_common_indication(&exams),
        precios: reports::price_histogram(&exams),
    };
    Ok(Html(template.render()?).into_response())
}
