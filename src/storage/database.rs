use super::traits::CatalogStore;
use crate::domain::{Category, Exam, Indication, User};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const USERS: &str = "users";
const EXAMS: &str = "exams";
const CATEGORIES: &str = "categories";
const INDICATIONS: &str = "indications";

/// Thin document layer over Turso/libSQL: one `documents` table holding JSON
/// bodies keyed by id and collection name.
pub struct DocumentDb {
    db: Database,
}

impl DocumentDb {
    /// Create a new document database handle connected to Turso.
    pub async fn new() -> Result<Self> {
        let url = env::var("LIBSQL_URL").map_err(|_| CatalogError::Database {
            message: "LIBSQL_URL environment variable not set".to_string(),
        })?;

        let auth_token = env::var("LIBSQL_AUTH_TOKEN").map_err(|_| CatalogError::Database {
            message: "LIBSQL_AUTH_TOKEN environment variable not set".to_string(),
        })?;

        info!("Connecting to Turso database at {}", url);

        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| CatalogError::Database {
                message: format!("Failed to connect to database: {e}"),
            })?;

        Ok(Self { db })
    }

    async fn get_connection(&self) -> Result<Connection> {
        self.db.connect().map_err(|e| CatalogError::Database {
            message: format!("Failed to get database connection: {e}"),
        })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        let conn = self.get_connection().await?;

        let migration_sql = include_str!("../../migrations/001_create_documents.sql");
        conn.execute_batch(migration_sql)
            .await
            .map_err(|e| CatalogError::Database {
                message: format!("Failed to run base migration: {e}"),
            })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Create or update a document (upsert keyed by id).
    pub async fn upsert_document(&self, id: &str, collection: &str, data: &str) -> Result<()> {
        let conn = self.get_connection().await?;

        conn.execute(
            "INSERT INTO documents (id, collection, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, COALESCE((SELECT created_at FROM documents WHERE id = ?1), datetime('now')), datetime('now'))
             ON CONFLICT(id) DO UPDATE SET
               data = excluded.data,
               updated_at = excluded.updated_at",
            libsql::params![id, collection, data],
        )
        .await
        .map_err(|e| CatalogError::Database {
            message: format!("Failed to upsert document: {e}"),
        })?;

        Ok(())
    }

    /// Get a document by id. Returns (id, collection, data).
    pub async fn get_document(&self, id: &str) -> Result<Option<(String, String, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, collection, data FROM documents WHERE id = ?",
                libsql::params![id],
            )
            .await
            .map_err(|e| CatalogError::Database {
                message: format!("Failed to query document: {e}"),
            })?;

        if let Some(row) = rows.next().await.map_err(|e| CatalogError::Database {
            message: format!("Failed to read row: {e}"),
        })? {
            let id: String = row.get(0).map_err(|e| CatalogError::Database {
                message: format!("Failed to get id: {e}"),
            })?;
            let collection: String = row.get(1).map_err(|e| CatalogError::Database {
                message: format!("Failed to get collection: {e}"),
            })?;
            let data: String = row.get(2).map_err(|e| CatalogError::Database {
                message: format!("Failed to get data: {e}"),
            })?;

            Ok(Some((id, collection, data)))
        } else {
            Ok(None)
        }
    }

    /// Get all documents in a collection.
    pub async fn get_documents_by_collection(
        &self,
        collection: &str,
    ) -> Result<Vec<(String, String)>> {
        let conn = self.get_connection().await?;

        let mut rows = conn
            .query(
                "SELECT id, data FROM documents WHERE collection = ?",
                libsql::params![collection],
            )
            .await
            .map_err(|e| CatalogError::Database {
                message: format!("Failed to query documents: {e}"),
            })?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| CatalogError::Database {
            message: format!("Failed to read row: {e}"),
        })? {
            let id: String = row.get(0).map_err(|e| CatalogError::Database {
                message: format!("Failed to get id: {e}"),
            })?;
            let data: String = row.get(1).map_err(|e| CatalogError::Database {
                message: format!("Failed to get data: {e}"),
            })?;

            results.push((id, data));
        }

        Ok(results)
    }

    /// Delete a document by id. Missing ids delete zero rows.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let conn = self.get_connection().await?;

        conn.execute(
            "DELETE FROM documents WHERE id = ?",
            libsql::params![id],
        )
        .await
        .map_err(|e| CatalogError::Database {
            message: format!("Failed to delete document {}: {}", id, e),
        })?;

        Ok(())
    }
}

/// libSQL-backed implementation of the catalog store. Documents serialize to
/// JSON; the id column is authoritative and re-stamped on load.
pub struct DatabaseStore {
    db: Arc<DocumentDb>,
}

impl DatabaseStore {
    pub async fn new() -> Result<Self> {
        let db = DocumentDb::new().await?;
        db.run_migrations().await?;

        Ok(Self { db: Arc::new(db) })
    }

    fn to_document<T: Serialize>(entity: &T, what: &str) -> Result<String> {
        serde_json::to_string(entity).map_err(|e| CatalogError::Database {
            message: format!("Failed to serialize {what}: {e}"),
        })
    }

    fn from_document<T: DeserializeOwned>(id: &str, data: &str, what: &str) -> Result<(Uuid, T)> {
        let entity: T = serde_json::from_str(data).map_err(|e| CatalogError::Database {
            message: format!("Failed to deserialize {what}: {e}"),
        })?;
        let id = Uuid::parse_str(id).map_err(|e| CatalogError::Database {
            message: format!("Invalid {what} UUID: {e}"),
        })?;
        Ok((id, entity))
    }

    async fn load_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
        stamp: impl Fn(&mut T, Uuid),
    ) -> Result<Vec<T>> {
        let rows = self.db.get_documents_by_collection(collection).await?;
        let mut entities = Vec::with_capacity(rows.len());
        for (id, data) in rows {
            let (id, mut entity) = Self::from_document::<T>(&id, &data, collection)?;
            stamp(&mut entity, id);
            entities.push(entity);
        }
        Ok(entities)
    }
}

#[async_trait]
impl CatalogStore for DatabaseStore {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = user.id.unwrap_or_else(Uuid::new_v4);
        user.id = Some(id);

        let data = Self::to_document(user, "user")?;
        self.db.upsert_document(&id.to_string(), USERS, &data).await?;

        debug!("Created user: {} with id {}", user.username, id);
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users: Vec<User> = self
            .load_collection(USERS, |u: &mut User, id| u.id = Some(id))
            .await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    async fn create_exam(&self, exam: &mut Exam) -> Result<()> {
        let id = exam.id.unwrap_or_else(Uuid::new_v4);
        exam.id = Some(id);

        let data = Self::to_document(exam, "exam")?;
        self.db.upsert_document(&id.to_string(), EXAMS, &data).await?;

        debug!("Created exam: {} with id {}", exam.codigo, id);
        Ok(())
    }

    async fn get_exam_by_id(&self, exam_id: Uuid) -> Result<Option<Exam>> {
        match self.db.get_document(&exam_id.to_string()).await? {
            Some((id, collection, data)) if collection == EXAMS => {
                let (id, mut exam) = Self::from_document::<Exam>(&id, &data, "exam")?;
                exam.id = Some(id);
                Ok(Some(exam))
            }
            _ => Ok(None),
        }
    }

    async fn get_all_exams(&self) -> Result<Vec<Exam>> {
        let mut exams: Vec<Exam> = self
            .load_collection(EXAMS, |e: &mut Exam, id| e.id = Some(id))
            .await?;
        exams.sort_by(|a, b| a.codigo.cmp(&b.codigo));
        Ok(exams)
    }

    async fn get_exams_by_categoria(&self, categoria: &str) -> Result<Vec<Exam>> {
        let mut exams = self.get_all_exams().await?;
        exams.retain(|e| e.categoria == categoria);
        Ok(exams)
    }

    async fn get_exams_by_tipo_muestra(&self, tipo_muestra: &str) -> Result<Vec<Exam>> {
        let mut exams = self.get_all_exams().await?;
        exams.retain(|e| e.tipo_muestra == tipo_muestra);
        Ok(exams)
    }

    async fn update_exam(&self, exam: &Exam) -> Result<()> {
        let exam_id = exam.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update exam without ID".to_string(),
        })?;

        let data = Self::to_document(exam, "exam")?;
        self.db.upsert_document(&exam_id.to_string(), EXAMS, &data).await?;

        debug!("Updated exam: {} with id {}", exam.codigo, exam_id);
        Ok(())
    }

    async fn delete_exam(&self, exam_id: Uuid) -> Result<()> {
        self.db.delete_document(&exam_id.to_string()).await
    }

    async fn create_category(&self, category: &mut Category) -> Result<()> {
        let id = category.id.unwrap_or_else(Uuid::new_v4);
        category.id = Some(id);

        let data = Self::to_document(category, "category")?;
        self.db
            .upsert_document(&id.to_string(), CATEGORIES, &data)
            .await?;

        debug!("Created category: {} with id {}", category.nombre, id);
        Ok(())
    }

    async fn get_category_by_id(&self, category_id: Uuid) -> Result<Option<Category>> {
        match self.db.get_document(&category_id.to_string()).await? {
            Some((id, collection, data)) if collection == CATEGORIES => {
                let (id, mut category) = Self::from_document::<Category>(&id, &data, "category")?;
                category.id = Some(id);
                Ok(Some(category))
            }
            _ => Ok(None),
        }
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self
            .load_collection(CATEGORIES, |c: &mut Category, id| c.id = Some(id))
            .await?;
        categories.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(categories)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let category_id = category.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update category without ID".to_string(),
        })?;

        let data = Self::to_document(category, "category")?;
        self.db
            .upsert_document(&category_id.to_string(), CATEGORIES, &data)
            .await?;

        debug!("Updated category: {} with id {}", category.nombre, category_id);
        Ok(())
    }

    async fn delete_category(&self, category_id: Uuid) -> Result<()> {
        self.db.delete_document(&category_id.to_string()).await
    }

    async fn create_indication(&self, indication: &mut Indication) -> Result<()> {
        let id = indication.id.unwrap_or_else(Uuid::new_v4);
        indication.id = Some(id);

        let data = Self::to_document(indication, "indication")?;
        self.db
            .upsert_document(&id.to_string(), INDICATIONS, &data)
            .await?;

        debug!("Created indication: {} with id {}", indication.nombre, id);
        Ok(())
    }

    async fn get_indication_by_id(&self, indication_id: Uuid) -> Result<Option<Indication>> {
        match self.db.get_document(&indication_id.to_string()).await? {
            Some((id, collection, data)) if collection == INDICATIONS => {
                let (id, mut indication) =
                    Self::from_document::<Indication>(&id, &data, "indication")?;
                indication.id = Some(id);
                Ok(Some(indication))
            }
            _ => Ok(None),
        }
    }

    async fn get_all_indications(&self) -> Result<Vec<Indication>> {
        let mut indications: Vec<Indication> = self
            .load_collection(INDICATIONS, |i: &mut Indication, id| i.id = Some(id))
            .await?;
        indications.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(indications)
    }

    async fn update_indication(&self, indication: &Indication) -> Result<()> {
        let indication_id = indication.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update indication without ID".to_string(),
        })?;

        let data = Self::to_document(indication, "indication")?;
        self.db
            .upsert_document(&indication_id.to_string(), INDICATIONS, &data)
            .await?;

        debug!("Updated indication: {} with id {}", indication.nombre, indication_id);
        Ok(())
    }

    async fn delete_indication(&self, indication_id: Uuid) -> Result<()> {
        self.db.delete_document(&indication_id.to_string()).await
    }
}
