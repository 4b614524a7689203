use crate::db::DbPool;
use crate::entities::{milk_purchase, supplier};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Create/update payload for a supplier.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub notes: Option<String>,
}

pub struct SupplierService {
    db: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {}", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: SupplierInput) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let created = supplier::ActiveModel {
            name: Set(input.name),
            phone: Set(input.phone),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        info!(supplier_id = created.id, "created supplier");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i64,
        input: SupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        let mut model: supplier::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.phone = Set(input.phone);
        model.notes = Set(input.notes);
        model.updated_at = Set(Utc::now());
        Ok(model.update(self.db.as_ref()).await?)
    }

    /// Deletes a supplier. Refused while milk purchases still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        let references = milk_purchase::Entity::find()
            .filter(milk_purchase::Column::SupplierId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Supplier {} has {} recorded milk purchases",
                id, references
            )));
        }
        supplier::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(supplier_id = id, "deleted supplier");
        Ok(())
    }
}
