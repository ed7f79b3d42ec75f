use askama::Template;

use crate::domain::{Category, Exam, Indication};
use crate::reports::{CategoryCount, IndicationCount, PriceBucket};
use crate::web::session::FlashMessage;

// Flat view models for the template layer: ids become plain strings.

#[derive(Debug, Clone)]
pub struct ExamenView {
    pub id: String,
    pub codigo: String,
    pub categoria: String,
    pub tipo_muestra: String,
    pub precio: String,
    pub indicaciones: Vec<String>,
}

impl ExamenView {
    pub fn tiene_indicacion(&self, nombre: &str) -> bool {
        self.indicaciones.iter().any(|i| i == nombre)
    }

    pub fn indicaciones_lista(&self) -> String {
        self.indicaciones.join(", ")
    }
}

impl From<Exam> for ExamenView {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id.map(|id| id.to_string()).unwrap_or_default(),
            codigo: exam.codigo,
            categoria: exam.categoria,
            tipo_muestra: exam.tipo_muestra,
            precio: exam.precio,
            indicaciones: exam.indicaciones,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoriaView {
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
}

impl From<Category> for CategoriaView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.map(|id| id.to_string()).unwrap_or_default(),
            nombre: category.nombre,
            descripcion: category.descripcion,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicacionView {
    pub id: String,
    pub nombre: String,
    pub descripcion: String,
}

impl From<Indication> for IndicacionView {
    fn from(indication: Indication) -> Self {
        Self {
            id: indication.id.map(|id| id.to_string()).unwrap_or_default(),
            nombre: indication.nombre,
            descripcion: indication.descripcion,
        }
    }
}

pub fn examenes_view(exams: Vec<Exam>) -> Vec<ExamenView> {
    exams.into_iter().map(ExamenView::from).collect()
}

pub fn categorias_view(categories: Vec<Category>) -> Vec<CategoriaView> {
    categories.into_iter().map(CategoriaView::from).collect()
}

pub fn indicaciones_view(indications: Vec<Indication>) -> Vec<IndicacionView> {
    indications.into_iter().map(IndicacionView::from).collect()
}

#[derive(Template)]
#[template(path = "home_no_logeado.html")]
pub struct HomeNoLogeadoTemplate {
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "layout.html")]
pub struct LayoutTemplate {
    pub flashes: Vec<FlashMessage>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "catalogo.html")]
pub struct CatalogoTemplate {
    pub flashes: Vec<FlashMessage>,
    pub exams: Vec<ExamenView>,
    pub categorias: Vec<CategoriaView>,
}

#[derive(Template)]
#[template(path = "ver_examenes.html")]
pub struct VerExamenesTemplate {
    pub flashes: Vec<FlashMessage>,
    pub exams: Vec<ExamenView>,
}

#[derive(Template)]
#[template(path = "ver_examen.html")]
pub struct VerExamenTemplate {
    pub flashes: Vec<FlashMessage>,
    pub examen: ExamenView,
}

#[derive(Template)]
#[template(path = "crear_examen.html")]
pub struct CrearExamenTemplate {
    pub flashes: Vec<FlashMessage>,
    pub categorias: Vec<CategoriaView>,
    pub indicaciones: Vec<IndicacionView>,
}

#[derive(Template)]
#[template(path = "editar_examen.html")]
pub struct EditarExamenTemplate {
    pub flashes: Vec<FlashMessage>,
    pub examen: ExamenView,
    pub categorias: Vec<CategoriaView>,
    pub indicaciones: Vec<IndicacionView>,
}

#[derive(Template)]
#[template(path = "ver_categorias.html")]
pub struct VerCategoriasTemplate {
    pub flashes: Vec<FlashMessage>,
    pub categorias: Vec<CategoriaView>,
}

#[derive(Template)]
#[template(path = "crear_categoria.html")]
pub struct CrearCategoriaTemplate {
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "editar_categoria.html")]
pub struct EditarCategoriaTemplate {
    pub flashes: Vec<FlashMessage>,
    pub categoria: CategoriaView,
}

#[derive(Template)]
#[template(path = "ver_indicaciones.html")]
pub struct VerIndicacionesTemplate {
    pub flashes: Vec<FlashMessage>,
    pub indicaciones: Vec<IndicacionView>,
}

#[derive(Template)]
#[template(path = "crear_indicacion.html")]
pub struct CrearIndicacionTemplate {
    pub flashes: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "editar_indicacion.html")]
pub struct EditarIndicacionTemplate {
    pub flashes: Vec<FlashMessage>,
    pub indicacion: IndicacionView,
}

#[derive(Template)]
#[template(path = "reporte.html")]
pub struct ReporteTemplate {
    pub flashes: Vec<FlashMessage>,
    pub categorias_count: Vec<CategoryCount>,
    pub indicacion_comun: Option<IndicationCount>,
    pub precios: Vec<PriceBucket>,
}
