use log::info;
use std::sync::Arc;
use uuid::Uuid;

use super::error::{CrmError, CrmResult};
use super::store::CrmStore;
use super::types::required;
use crate::core::shared::models::Category;
use crate::security::identity::Requester;

#[derive(Clone)]
pub struct CategoryService {
    store: Arc<dyn CrmStore>,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, requester: &Requester, name: String) -> CrmResult<Category> {
        let organization_id = requester.require_organizer()?;
        let name = required("name", &name)?;
        let category = self.store.create_category(organization_id, name).await?;
        info!(
            "Category '{}' created in organization {organization_id}",
            category.name
        );
        Ok(category)
    }

    /// Leads in the category become uncategorized.
    pub async fn delete(&self, requester: &Requester, category_id: Uuid) -> CrmResult<()> {
        let organization_id = requester.require_organizer()?;
        if !self
            .store
            .delete_category(organization_id, category_id)
            .await?
        {
            return Err(CrmError::NotFound);
        }
        Ok(())
    }
}
