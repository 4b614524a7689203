use crate::db::DbPool;
use crate::entities::{customer, product, sale};
use crate::errors::ServiceError;
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// Create/update payload for a sale. Any client-sent `total` is ignored;
/// the stored total is always recomputed server-side.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    pub customer_id: i64,
    pub product_id: i64,
    pub date: NaiveDate,
    #[validate(range(min = 0.0, message = "quantity must not be negative"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "pricePerUnit must not be negative"))]
    pub price_per_unit: f64,
}

/// Sale with its customer and product joined in, as returned to clients.
#[derive(Debug, Serialize)]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: sale::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<customer::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<product::Model>,
}

pub struct SaleService {
    db: Arc<DbPool>,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// All sales, newest first, each with its customer and product.
    pub async fn list(&self) -> Result<Vec<SaleRecord>, ServiceError> {
        let sales = sale::Entity::find()
            .order_by_desc(sale::Column::Date)
            .order_by_desc(sale::Column::Id)
            .all(self.db.as_ref())
            .await?;
        self.attach_references(sales).await
    }

    pub async fn get(&self, id: i64) -> Result<SaleRecord, ServiceError> {
        let sale = sale::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale {}", id)))?;
        let mut records = self.attach_references(vec![sale]).await?;
        // attach_references preserves input length
        Ok(records.remove(0))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: SaleInput) -> Result<SaleRecord, ServiceError> {
        input.validate()?;
        let customer = self.require_customer(input.customer_id).await?;
        let product = self.require_product(input.product_id).await?;

        let now = Utc::now();
        let created = sale::ActiveModel {
            customer_id: Set(input.customer_id),
            product_id: Set(input.product_id),
            date: Set(input.date),
            quantity: Set(input.quantity),
            price_per_unit: Set(input.price_per_unit),
            total: Set(input.quantity * input.price_per_unit),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(sale_id = created.id, customer_id = customer.id, "recorded sale");
        Ok(SaleRecord {
            sale: created,
            customer: Some(customer),
            product: Some(product),
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i64, input: SaleInput) -> Result<SaleRecord, ServiceError> {
        input.validate()?;
        let customer = self.require_customer(input.customer_id).await?;
        let product = self.require_product(input.product_id).await?;
        let existing = self.get(id).await?.sale;

        let mut model: sale::ActiveModel = existing.into();
        model.customer_id = Set(input.customer_id);
        model.product_id = Set(input.product_id);
        model.date = Set(input.date);
        model.quantity = Set(input.quantity);
        model.price_per_unit = Set(input.price_per_unit);
        model.total = Set(input.quantity * input.price_per_unit);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.db.as_ref()).await?;

        Ok(SaleRecord {
            sale: updated,
            customer: Some(customer),
            product: Some(product),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get(id).await?.sale;
        sale::Entity::delete_by_id(existing.id)
            .exec(self.db.as_ref())
            .await?;
        info!(sale_id = id, "deleted sale");
        Ok(())
    }

    /// Joins customers and products in memory. A sale has two foreign
    /// references, which sea-orm's single `find_also_related` cannot cover.
    async fn attach_references(
        &self,
        sales: Vec<sale::Model>,
    ) -> Result<Vec<SaleRecord>, ServiceError> {
        let customers: HashMap<i64, customer::Model> = customer::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let products: HashMap<i64, product::Model> = product::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(sales
            .into_iter()
            .map(|sale| {
                let customer = customers.get(&sale.customer_id).cloned();
                let product = products.get(&sale.product_id).cloned();
                SaleRecord {
                    sale,
                    customer,
                    product,
                }
            })
            .collect())
    }

    async fn require_customer(&self, id: i64) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InvalidInput(format!("Customer {} does not exist", id)))
    }

    async fn require_product(&self, id: i64) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::InvalidInput(format!("Product {} does not exist", id)))
    }
}
