use crate::db::DbPool;
use crate::entities::{milk_purchase, supplier};
use crate::errors::ServiceError;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Create/update payload for a milk purchase. Any client-sent `total`
/// is ignored; the stored total is always recomputed server-side.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MilkPurchaseInput {
    pub supplier_id: i64,
    pub date: NaiveDate,
    #[validate(range(min = 0.0, message = "quantityLiters must not be negative"))]
    pub quantity_liters: f64,
    #[validate(range(min = 0.0, message = "pricePerLiter must not be negative"))]
    pub price_per_liter: f64,
}

/// Milk purchase with its supplier joined in, as returned to clients.
#[derive(Debug, Serialize)]
pub struct MilkPurchaseRecord {
    #[serde(flatten)]
    pub purchase: milk_purchase::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<supplier::Model>,
}

pub struct MilkPurchaseService {
    db: Arc<DbPool>,
}

impl MilkPurchaseService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All purchases, newest first, each with its supplier.
    pub async fn list(&self) -> Result<Vec<MilkPurchaseRecord>, ServiceError> {
        let rows = milk_purchase::Entity::find()
            .find_also_related(supplier::Entity)
            .order_by_desc(milk_purchase::Column::Date)
            .order_by_desc(milk_purchase::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(rows
            .into_iter()
            .map(|(purchase, supplier)| MilkPurchaseRecord { purchase, supplier })
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<MilkPurchaseRecord, ServiceError> {
        let (purchase, supplier) = milk_purchase::Entity::find_by_id(id)
            .find_also_related(supplier::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Milk purchase {}", id)))?;
        Ok(MilkPurchaseRecord { purchase, supplier })
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: MilkPurchaseInput,
    ) -> Result<MilkPurchaseRecord, ServiceError> {
        input.validate()?;
        let supplier = self.require_supplier(input.supplier_id).await?;

        let now = Utc::now();
        let created = milk_purchase::ActiveModel {
            supplier_id: Set(input.supplier_id),
            date: Set(input.date),
            quantity_liters: Set(input.quantity_liters),
            price_per_liter: Set(input.price_per_liter),
            total: Set(input.quantity_liters * input.price_per_liter),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(purchase_id = created.id, supplier_id = supplier.id, "recorded milk purchase");
        Ok(MilkPurchaseRecord {
            purchase: created,
            supplier: Some(supplier),
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i64,
        input: MilkPurchaseInput,
    ) -> Result<MilkPurchaseRecord, ServiceError> {
        input.validate()?;
        let supplier = self.require_supplier(input.supplier_id).await?;
        let existing = self.get(id).await?.purchase;

        let mut model: milk_purchase::ActiveModel = existing.into();
        model.supplier_id = Set(input.supplier_id);
        model.date = Set(input.date);
        model.quantity_liters = Set(input.quantity_liters);
        model.price_per_liter = Set(input.price_per_liter);
        model.total = Set(input.quantity_liters * input.price_per_liter);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.db.as_ref()).await?;

        Ok(MilkPurchaseRecord {
            purchase: updated,
            supplier: Some(supplier),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?.purchase;
        milk_purchase::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(purchase_id = id, "deleted milk purchase");
        Ok(())
    }

    async fn require_supplier(&self, id: i64) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InvalidInput(format!("Supplier {} does not exist", id)))
    }
}
