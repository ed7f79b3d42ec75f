use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff account. Passwords are stored as submitted; there is no hashing in
/// this system (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<Uuid>,
    pub nombre: String,
    pub descripcion: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indication {
    pub id: Option<Uuid>,
    pub nombre: String,
    pub descripcion: String,
    pub created_at: DateTime<Utc>,
}

/// A lab test catalog entry. `categoria` and `indicaciones` carry Category
/// and Indication *names*, not ids: renaming either silently orphans the
/// copies held here. `precio` is kept exactly as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: Option<Uuid>,
    pub codigo: String,
    pub categoria: String,
    pub tipo_muestra: String,
    pub precio: String,
    pub indicaciones: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            password: password.into(),
            created_at: Utc::now(),
        }
    }
}

impl Category {
    pub fn new(nombre: impl Into<String>, descripcion: impl Into<String>) -> Self {
        Self {
            id: None,
            nombre: nombre.into(),
            descripcion: descripcion.into(),
            created_at: Utc::now(),
        }
    }
}

impl Indication {
    pub fn new(nombre: impl Into<String>, descripcion: impl Into<String>) -> Self {
        Self {
            id: None,
            nombre: nombre.into(),
            descripcion: descripcion.into(),
            created_at: Utc::now(),
        }
    }
}
