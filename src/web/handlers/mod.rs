pub mod auth;
pub mod categorias;
pub mod examenes;
pub mod indicaciones;
pub mod reporte;
