use crate::db::DbPool;
use crate::entities::{customer, milk_purchase, product, sale, supplier};
use crate::errors::ServiceError;
use crate::services::milk_purchases::MilkPurchaseRecord;
use crate::services::sales::SaleRecord;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::instrument;

const RECENT_LIMIT: u64 = 5;

/// Landing-page snapshot: entity counts, lifetime totals, recent activity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub suppliers: u64,
    pub customers: u64,
    pub products: u64,
    pub milk_purchases: u64,
    pub sales: u64,
    pub total_revenue: f64,
    pub total_milk_purchased: f64,
    pub recent_milk_purchases: Vec<MilkPurchaseRecord>,
    pub recent_sales: Vec<SaleRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

/// Totals for a period. `totalMilkSold` only counts liter-unit products.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub total_milk_purchased: f64,
    pub total_milk_sold: f64,
    pub total_purchase_cost: f64,
    pub total_sales_revenue: f64,
    pub gross_profit: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePoint {
    pub date: String,
    pub total_liters: f64,
}

/// Daily sales volumes bucketed by the sold product's unit.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalePoint {
    pub date: String,
    pub total_liters: f64,
    pub total_kg: f64,
    pub total_units: f64,
    pub total_quantity: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierBreakdown {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub total_liters_supplied: f64,
    pub total_cost: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBreakdown {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_liters_bought: f64,
    pub total_revenue: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBreakdown {
    pub product_id: i64,
    pub product_name: String,
    pub product_unit: String,
    pub units_sold: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub date_range: DateRange,
    pub summary: PeriodSummary,
    pub purchases_over_time: Vec<PurchasePoint>,
    pub sales_over_time: Vec<SalePoint>,
    pub supplier_breakdown: Vec<SupplierBreakdown>,
    pub customer_breakdown: Vec<CustomerBreakdown>,
    pub product_breakdown: Vec<ProductBreakdown>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeSupplierBreakdown {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub total_liters_supplied: f64,
    pub total_cost: f64,
    pub total_transactions: u64,
    pub average_price_per_liter: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeCustomerBreakdown {
    pub customer_id: i64,
    pub customer_name: String,
    pub total_liters_bought: f64,
    pub total_revenue: f64,
    pub total_transactions: u64,
    pub average_price_per_liter: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeProductBreakdown {
    pub product_id: i64,
    pub product_name: String,
    pub product_unit: String,
    pub units_sold: f64,
    pub total_revenue: f64,
    pub total_transactions: u64,
    pub average_price_per_unit: f64,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub purchases: f64,
    pub sales: f64,
    pub purchase_cost: f64,
    pub sales_revenue: f64,
    pub profit: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeData {
    pub summary: PeriodSummary,
    pub supplier_breakdown: Vec<AllTimeSupplierBreakdown>,
    pub customer_breakdown: Vec<AllTimeCustomerBreakdown>,
    pub product_breakdown: Vec<AllTimeProductBreakdown>,
    pub monthly_trends: Vec<MonthlyTrend>,
}

pub struct DashboardService {
    db: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let db = self.db.as_ref();
        let suppliers = supplier::Entity::find().count(db).await?;
        let customers = customer::Entity::find().count(db).await?;
        let products = product::Entity::find().count(db).await?;

        let purchases = milk_purchase::Entity::find().all(db).await?;
        let sales = sale::Entity::find().all(db).await?;
        let total_milk_purchased = purchases.iter().map(|p| p.quantity_liters).sum();
        let total_revenue = sales.iter().map(|s| s.total).sum();
        let milk_purchase_count = purchases.len() as u64;
        let sale_count = sales.len() as u64;

        let recent_milk_purchases = milk_purchase::Entity::find()
            .find_also_related(supplier::Entity)
            .order_by_desc(milk_purchase::Column::Date)
            .order_by_desc(milk_purchase::Column::Id)
            .limit(RECENT_LIMIT)
            .all(db)
            .await?
            .into_iter()
            .map(|(purchase, supplier)| MilkPurchaseRecord { purchase, supplier })
            .collect();

        let (customers_by_id, products_by_id) = self.master_maps().await?;
        let recent_sales = sale::Entity::find()
            .order_by_desc(sale::Column::Date)
            .order_by_desc(sale::Column::Id)
            .limit(RECENT_LIMIT)
            .all(db)
            .await?
            .into_iter()
            .map(|sale| SaleRecord {
                customer: customers_by_id.get(&sale.customer_id).cloned(),
                product: products_by_id.get(&sale.product_id).cloned(),
                sale,
            })
            .collect();

        Ok(DashboardSummary {
            suppliers,
            customers,
            products,
            milk_purchases: milk_purchase_count,
            sales: sale_count,
            total_revenue,
            total_milk_purchased,
            recent_milk_purchases,
            recent_sales,
        })
    }

    /// Aggregates over the inclusive date range `[from, to]`.
    #[instrument(skip(self))]
    pub async fn range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DashboardData, ServiceError> {
        if from > to {
            return Err(ServiceError::BadRequest(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        let db = self.db.as_ref();

        let purchases = milk_purchase::Entity::find()
            .filter(milk_purchase::Column::Date.between(from, to))
            .all(db)
            .await?;
        let sales = sale::Entity::find()
            .filter(sale::Column::Date.between(from, to))
            .all(db)
            .await?;

        let suppliers_by_id: HashMap<i64, supplier::Model> = supplier::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let (customers_by_id, products_by_id) = self.master_maps().await?;

        Ok(DashboardData {
            date_range: DateRange {
                from: format_date(from),
                to: format_date(to),
            },
            summary: period_summary(&purchases, &sales, &products_by_id),
            purchases_over_time: purchases_over_time(&purchases),
            sales_over_time: sales_over_time(&sales, &products_by_id),
            supplier_breakdown: supplier_breakdown(&purchases, &suppliers_by_id),
            customer_breakdown: customer_breakdown(&sales, &customers_by_id, &products_by_id),
            product_breakdown: product_breakdown(&sales, &products_by_id),
        })
    }

    #[instrument(skip(self))]
    pub async fn all_time(&self) -> Result<AllTimeData, ServiceError> {
        let db = self.db.as_ref();
        let purchases = milk_purchase::Entity::find().all(db).await?;
        let sales = sale::Entity::find().all(db).await?;

        let suppliers_by_id: HashMap<i64, supplier::Model> = supplier::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let (customers_by_id, products_by_id) = self.master_maps().await?;

        Ok(AllTimeData {
            summary: period_summary(&purchases, &sales, &products_by_id),
            supplier_breakdown: all_time_supplier_breakdown(&purchases, &suppliers_by_id),
            customer_breakdown: all_time_customer_breakdown(
                &sales,
                &customers_by_id,
                &products_by_id,
            ),
            product_breakdown: all_time_product_breakdown(&sales, &products_by_id),
            monthly_trends: monthly_trends(&purchases, &sales),
        })
    }

    async fn master_maps(
        &self,
    ) -> Result<(HashMap<i64, customer::Model>, HashMap<i64, product::Model>), ServiceError> {
        let db = self.db.as_ref();
        let customers = customer::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let products = product::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        Ok((customers, products))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn is_liter_sale(sale: &sale::Model, products: &HashMap<i64, product::Model>) -> bool {
    products
        .get(&sale.product_id)
        .map(|p| p.is_liter_unit())
        .unwrap_or(false)
}

// The aggregation below is pure over already-fetched rows.

fn period_summary(
    purchases: &[milk_purchase::Model],
    sales: &[sale::Model],
    products: &HashMap<i64, product::Model>,
) -> PeriodSummary {
    let total_milk_purchased = purchases.iter().map(|p| p.quantity_liters).sum();
    let total_purchase_cost: f64 = purchases.iter().map(|p| p.total).sum();
    let total_sales_revenue: f64 = sales.iter().map(|s| s.total).sum();
    let total_milk_sold = sales
        .iter()
        .filter(|s| is_liter_sale(s, products))
        .map(|s| s.quantity)
        .sum();

    PeriodSummary {
        total_milk_purchased,
        total_milk_sold,
        total_purchase_cost,
        total_sales_revenue,
        gross_profit: total_sales_revenue - total_purchase_cost,
    }
}

fn purchases_over_time(purchases: &[milk_purchase::Model]) -> Vec<PurchasePoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for p in purchases {
        *by_date.entry(p.date).or_default() += p.quantity_liters;
    }
    by_date
        .into_iter()
        .map(|(date, total_liters)| PurchasePoint {
            date: format_date(date),
            total_liters,
        })
        .collect()
}

fn sales_over_time(
    sales: &[sale::Model],
    products: &HashMap<i64, product::Model>,
) -> Vec<SalePoint> {
    #[derive(Default)]
    struct Buckets {
        liters: f64,
        kg: f64,
        units: f64,
        quantity: f64,
    }

    let mut by_date: BTreeMap<NaiveDate, Buckets> = BTreeMap::new();
    for s in sales {
        let buckets = by_date.entry(s.date).or_default();
        buckets.quantity += s.quantity;
        match products.get(&s.product_id) {
            Some(p) if p.is_liter_unit() => buckets.liters += s.quantity,
            Some(p) if p.is_kg_unit() => buckets.kg += s.quantity,
            _ => buckets.units += s.quantity,
        }
    }
    by_date
        .into_iter()
        .map(|(date, b)| SalePoint {
            date: format_date(date),
            total_liters: b.liters,
            total_kg: b.kg,
            total_units: b.units,
            total_quantity: b.quantity,
        })
        .collect()
}

fn supplier_breakdown(
    purchases: &[milk_purchase::Model],
    suppliers: &HashMap<i64, supplier::Model>,
) -> Vec<SupplierBreakdown> {
    let mut by_supplier: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for p in purchases {
        let entry = by_supplier.entry(p.supplier_id).or_default();
        entry.0 += p.quantity_liters;
        entry.1 += p.total;
    }
    let mut breakdown: Vec<SupplierBreakdown> = by_supplier
        .into_iter()
        .map(|(id, (liters, cost))| SupplierBreakdown {
            supplier_id: id,
            supplier_name: supplier_name(suppliers, id),
            total_liters_supplied: liters,
            total_cost: cost,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    breakdown
}

fn customer_breakdown(
    sales: &[sale::Model],
    customers: &HashMap<i64, customer::Model>,
    products: &HashMap<i64, product::Model>,
) -> Vec<CustomerBreakdown> {
    let mut by_customer: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for s in sales {
        let entry = by_customer.entry(s.customer_id).or_default();
        if is_liter_sale(s, products) {
            entry.0 += s.quantity;
        }
        entry.1 += s.total;
    }
    let mut breakdown: Vec<CustomerBreakdown> = by_customer
        .into_iter()
        .map(|(id, (liters, revenue))| CustomerBreakdown {
            customer_id: id,
            customer_name: customer_name(customers, id),
            total_liters_bought: liters,
            total_revenue: revenue,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    breakdown
}

fn product_breakdown(
    sales: &[sale::Model],
    products: &HashMap<i64, product::Model>,
) -> Vec<ProductBreakdown> {
    let mut by_product: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for s in sales {
        let entry = by_product.entry(s.product_id).or_default();
        entry.0 += s.quantity;
        entry.1 += s.total;
    }
    let mut breakdown: Vec<ProductBreakdown> = by_product
        .into_iter()
        .map(|(id, (quantity, revenue))| ProductBreakdown {
            product_id: id,
            product_name: product_name(products, id),
            product_unit: product_unit(products, id),
            units_sold: quantity,
            total_revenue: revenue,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    breakdown
}

fn all_time_supplier_breakdown(
    purchases: &[milk_purchase::Model],
    suppliers: &HashMap<i64, supplier::Model>,
) -> Vec<AllTimeSupplierBreakdown> {
    let mut by_supplier: BTreeMap<i64, (f64, f64, u64)> = BTreeMap::new();
    for p in purchases {
        let entry = by_supplier.entry(p.supplier_id).or_default();
        entry.0 += p.quantity_liters;
        entry.1 += p.total;
        entry.2 += 1;
    }
    let mut breakdown: Vec<AllTimeSupplierBreakdown> = by_supplier
        .into_iter()
        .map(|(id, (liters, cost, count))| AllTimeSupplierBreakdown {
            supplier_id: id,
            supplier_name: supplier_name(suppliers, id),
            total_liters_supplied: liters,
            total_cost: cost,
            total_transactions: count,
            average_price_per_liter: ratio(cost, liters),
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    breakdown
}

fn all_time_customer_breakdown(
    sales: &[sale::Model],
    customers: &HashMap<i64, customer::Model>,
    products: &HashMap<i64, product::Model>,
) -> Vec<AllTimeCustomerBreakdown> {
    // liter revenue tracked separately so the per-liter average is not
    // polluted by non-liter products
    let mut by_customer: BTreeMap<i64, (f64, f64, f64, u64)> = BTreeMap::new();
    for s in sales {
        let entry = by_customer.entry(s.customer_id).or_default();
        if is_liter_sale(s, products) {
            entry.0 += s.quantity;
            entry.2 += s.total;
        }
        entry.1 += s.total;
        entry.3 += 1;
    }
    let mut breakdown: Vec<AllTimeCustomerBreakdown> = by_customer
        .into_iter()
        .map(
            |(id, (liters, revenue, liter_revenue, count))| AllTimeCustomerBreakdown {
                customer_id: id,
                customer_name: customer_name(customers, id),
                total_liters_bought: liters,
                total_revenue: revenue,
                total_transactions: count,
                average_price_per_liter: ratio(liter_revenue, liters),
            },
        )
        .collect();
    breakdown.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    breakdown
}

fn all_time_product_breakdown(
    sales: &[sale::Model],
    products: &HashMap<i64, product::Model>,
) -> Vec<AllTimeProductBreakdown> {
    let mut by_product: BTreeMap<i64, (f64, f64, u64)> = BTreeMap::new();
    for s in sales {
        let entry = by_product.entry(s.product_id).or_default();
        entry.0 += s.quantity;
        entry.1 += s.total;
        entry.2 += 1;
    }
    let mut breakdown: Vec<AllTimeProductBreakdown> = by_product
        .into_iter()
        .map(|(id, (quantity, revenue, count))| AllTimeProductBreakdown {
            product_id: id,
            product_name: product_name(products, id),
            product_unit: product_unit(products, id),
            units_sold: quantity,
            total_revenue: revenue,
            total_transactions: count,
            average_price_per_unit: ratio(revenue, quantity),
        })
        .collect();
    breakdown.sort_by(|a, b| b.total_revenue.total_cmp(&a.total_revenue));
    breakdown
}

fn monthly_trends(purchases: &[milk_purchase::Model], sales: &[sale::Model]) -> Vec<MonthlyTrend> {
    #[derive(Default)]
    struct Month {
        purchases: f64,
        sales: f64,
        purchase_cost: f64,
        sales_revenue: f64,
    }

    let mut by_month: BTreeMap<String, Month> = BTreeMap::new();
    for p in purchases {
        let entry = by_month.entry(p.date.format("%Y-%m").to_string()).or_default();
        entry.purchases += p.quantity_liters;
        entry.purchase_cost += p.total;
    }
    for s in sales {
        let entry = by_month.entry(s.date.format("%Y-%m").to_string()).or_default();
        entry.sales += s.quantity;
        entry.sales_revenue += s.total;
    }
    by_month
        .into_iter()
        .map(|(month, m)| MonthlyTrend {
            month,
            purchases: m.purchases,
            sales: m.sales,
            purchase_cost: m.purchase_cost,
            sales_revenue: m.sales_revenue,
            profit: m.sales_revenue - m.purchase_cost,
        })
        .collect()
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn supplier_name(suppliers: &HashMap<i64, supplier::Model>, id: i64) -> String {
    suppliers
        .get(&id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn customer_name(customers: &HashMap<i64, customer::Model>, id: i64) -> String {
    customers
        .get(&id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn product_name(products: &HashMap<i64, product::Model>, id: i64) -> String {
    products
        .get(&id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn product_unit(products: &HashMap<i64, product::Model>, id: i64) -> String {
    products
        .get(&id)
        .map(|p| p.unit.clone())
        .unwrap_or_default()
}
