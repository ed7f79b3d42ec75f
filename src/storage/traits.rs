use crate::domain::{Category, Exam, Indication, User};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage port for the four catalog collections (users, exams, categories,
/// indications). Documents are identified by opaque Uuids assigned on insert.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // User operations
    async fn create_user(&self, user: &mut User) -> Result<()>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    // Exam operations
    async fn create_exam(&self, exam: &mut Exam) -> Result<()>;
    async fn get_exam_by_id(&self, exam_id: Uuid) -> Result<Option<Exam>>;
    async fn get_all_exams(&self) -> Result<Vec<Exam>>;
    async fn get_exams_by_categoria(&self, categoria: &str) -> Result<Vec<Exam>>;
    async fn get_exams_by_tipo_muestra(&self, tipo_muestra: &str) -> Result<Vec<Exam>>;
    /// Full-document overwrite; fields absent from `exam` do not survive.
    async fn update_exam(&self, exam: &Exam) -> Result<()>;
    /// Deleting an id that does not exist is a silent no-op.
    async fn delete_exam(&self, exam_id: Uuid) -> Result<()>;

    // Category operations
    async fn create_category(&self, category: &mut Category) -> Result<()>;
    async fn get_category_by_id(&self, category_id: Uuid) -> Result<Option<Category>>;
    async fn get_all_categories(&self) -> Result<Vec<Category>>;
    async fn update_category(&self, category: &Category) -> Result<()>;
    async fn delete_category(&self, category_id: Uuid) -> Result<()>;

    // Indication operations
    async fn create_indication(&self, indication: &mut Indication) -> Result<()>;
    async fn get_indication_by_id(&self, indication_id: Uuid) -> Result<Option<Indication>>;
    async fn get_all_indications(&self) -> Result<Vec<Indication>>;
    async fn update_indication(&self, indication: &Indication) -> Result<()>;
    async fn delete_indication(&self, indication_id: Uuid) -> Result<()>;
}
