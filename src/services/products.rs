use crate::db::DbPool;
use crate::entities::{product, sale};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Create/update payload for a product.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "unit is required"))]
    pub unit: String,
    #[validate(range(min = 0.0, message = "pricePerUnit must not be negative"))]
    pub price_per_unit: f64,
}

pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {}", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: ProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let created = product::ActiveModel {
            name: Set(input.name),
            unit: Set(input.unit),
            price_per_unit: Set(input.price_per_unit),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        info!(product_id = created.id, "created product");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i64,
        input: ProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        let mut model: product::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.unit = Set(input.unit);
        model.price_per_unit = Set(input.price_per_unit);
        model.updated_at = Set(Utc::now());
        Ok(model.update(self.db.as_ref()).await?)
    }

    /// Deletes a product. Refused while sales still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        let references = sale::Entity::find()
            .filter(sale::Column::ProductId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} has {} recorded sales",
                id, references
            )));
        }
        product::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(product_id = id, "deleted product");
        Ok(())
    }
}
