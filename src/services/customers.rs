use crate::db::DbPool;
use crate::entities::{customer, sale};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Create/update payload for a customer. `type` is the free-form
/// customer category (shop, cafe, reseller, ...).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "type is required"))]
    pub kind: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub notes: Option<String>,
}

pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Ok(customer::Entity::find()
            .order_by_asc(customer::Column::Id)
            .all(self.db.as_ref())
            .await?)
    }

    pub async fn get(&self, id: i64) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {}", id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CustomerInput) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let now = Utc::now();
        let created = customer::ActiveModel {
            name: Set(input.name),
            kind: Set(input.kind),
            phone: Set(input.phone),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        info!(customer_id = created.id, "created customer");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i64,
        input: CustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        let mut model: customer::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.kind = Set(input.kind);
        model.phone = Set(input.phone);
        model.notes = Set(input.notes);
        model.updated_at = Set(Utc::now());
        Ok(model.update(self.db.as_ref()).await?)
    }

    /// Deletes a customer. Refused while sales still reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        let references = sale::Entity::find()
            .filter(sale::Column::CustomerId.eq(id))
            .count(self.db.as_ref())
            .await?;
        if references > 0 {
            return Err(ServiceError::Conflict(format!(
                "Customer {} has {} recorded sales",
                id, references
            )));
        }
        customer::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(customer_id = id, "deleted customer");
        Ok(())
    }
}
