use super::traits::CatalogStore;
use crate::domain::{Category, Exam, Indication, User};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// In-memory store used by the default build and by tests. Concurrent edits
/// to the same document follow last-writer-wins.
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    exams: Mutex<HashMap<Uuid, Exam>>,
    categories: Mutex<HashMap<Uuid, Category>>,
    indications: Mutex<HashMap<Uuid, Indication>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            exams: Mutex::new(HashMap::new()),
            categories: Mutex::new(HashMap::new()),
            indications: Mutex::new(HashMap::new()),
        }
    }

    pub fn exam_count(&self) -> usize {
        self.exams.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_user(&self, user: &mut User) -> Result<()> {
        let id = Uuid::new_v4();
        user.id = Some(id);

        let mut users = self.users.lock().unwrap();
        users.insert(id, user.clone());

        debug!("Created user: {} with id {}", user.username, id);
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().unwrap();
        let user = users.values().find(|u| u.username == username).cloned();
        Ok(user)
    }

    async fn create_exam(&self, exam: &mut Exam) -> Result<()> {
        let id = Uuid::new_v4();
        exam.id = Some(id);

        let mut exams = self.exams.lock().unwrap();
        exams.insert(id, exam.clone());

        debug!("Created exam: {} with id {}", exam.codigo, id);
        Ok(())
    }

    async fn get_exam_by_id(&self, exam_id: Uuid) -> Result<Option<Exam>> {
        let exams = self.exams.lock().unwrap();
        Ok(exams.get(&exam_id).cloned())
    }

    async fn get_all_exams(&self) -> Result<Vec<Exam>> {
        let exams = self.exams.lock().unwrap();
        let mut all_exams: Vec<Exam> = exams.values().cloned().collect();
        all_exams.sort_by(|a, b| a.codigo.cmp(&b.codigo));
        Ok(all_exams)
    }

    async fn get_exams_by_categoria(&self, categoria: &str) -> Result<Vec<Exam>> {
        let exams = self.exams.lock().unwrap();
        let mut matching: Vec<Exam> = exams
            .values()
            .filter(|e| e.categoria == categoria)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.codigo.cmp(&b.codigo));
        Ok(matching)
    }

    async fn get_exams_by_tipo_muestra(&self, tipo_muestra: &str) -> Result<Vec<Exam>> {
        let exams = self.exams.lock().unwrap();
        let mut matching: Vec<Exam> = exams
            .values()
            .filter(|e| e.tipo_muestra == tipo_muestra)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.codigo.cmp(&b.codigo));
        Ok(matching)
    }

    async fn update_exam(&self, exam: &Exam) -> Result<()> {
        let exam_id = exam.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update exam without ID".to_string(),
        })?;

        let mut exams = self.exams.lock().unwrap();
        exams.insert(exam_id, exam.clone());

        debug!("Updated exam: {} with id {}", exam.codigo, exam_id);
        Ok(())
    }

    async fn delete_exam(&self, exam_id: Uuid) -> Result<()> {
        let mut exams = self.exams.lock().unwrap();
        if exams.remove(&exam_id).is_some() {
            debug!("Deleted exam with id {}", exam_id);
        }
        Ok(())
    }

    async fn create_category(&self, category: &mut Category) -> Result<()> {
        let id = Uuid::new_v4();
        category.id = Some(id);

        let mut categories = self.categories.lock().unwrap();
        categories.insert(id, category.clone());

        debug!("Created category: {} with id {}", category.nombre, id);
        Ok(())
    }

    async fn get_category_by_id(&self, category_id: Uuid) -> Result<Option<Category>> {
        let categories = self.categories.lock().unwrap();
        Ok(categories.get(&category_id).cloned())
    }

    async fn get_all_categories(&self) -> Result<Vec<Category>> {
        let categories = self.categories.lock().unwrap();
        let mut all_categories: Vec<Category> = categories.values().cloned().collect();
        all_categories.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(all_categories)
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        let category_id = category.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update category without ID".to_string(),
        })?;

        let mut categories = self.categories.lock().unwrap();
        categories.insert(category_id, category.clone());

        debug!("Updated category: {} with id {}", category.nombre, category_id);
        Ok(())
    }

    async fn delete_category(&self, category_id: Uuid) -> Result<()> {
        let mut categories = self.categories.lock().unwrap();
        if categories.remove(&category_id).is_some() {
            debug!("Deleted category with id {}", category_id);
        }
        Ok(())
    }

    async fn create_indication(&self, indication: &mut Indication) -> Result<()> {
        let id = Uuid::new_v4();
        indication.id = Some(id);

        let mut indications = self.indications.lock().unwrap();
        indications.insert(id, indication.clone());

        debug!("Created indication: {} with id {}", indication.nombre, id);
        Ok(())
    }

    async fn get_indication_by_id(&self, indication_id: Uuid) -> Result<Option<Indication>> {
        let indications = self.indications.lock().unwrap();
        Ok(indications.get(&indication_id).cloned())
    }

    async fn get_all_indications(&self) -> Result<Vec<Indication>> {
        let indications = self.indications.lock().unwrap();
        let mut all_indications: Vec<Indication> = indications.values().cloned().collect();
        all_indications.sort_by(|a, b| a.nombre.cmp(&b.nombre));
        Ok(all_indications)
    }

    async fn update_indication(&self, indication: &Indication) -> Result<()> {
        let indication_id = indication.id.ok_or_else(|| CatalogError::Store {
            message: "Cannot update indication without ID".to_string(),
        })?;

        let mut indications = self.indications.lock().unwrap();
        indications.insert(indication_id, indication.clone());

        debug!("Updated indication: {} with id {}", indication.nombre, indication_id);
        Ok(())
    }

    async fn delete_indication(&self, indication_id: Uuid) -> Result<()> {
        let mut indications = self.indications.lock().unwrap();
        if indications.remove(&indication_id).is_some() {
            debug!("Deleted indication with id {}", indication_id);
        }
        Ok(())
    }
}
