pub mod customers;
pub mod dashboard;
pub mod milk_purchases;
pub mod products;
pub mod sales;
pub mod sessions;
pub mod suppliers;
pub mod users;

use crate::db::DbPool;
use std::sync::Arc;

pub use customers::CustomerService;
pub use dashboard::DashboardService;
pub use milk_purchases::MilkPurchaseService;
pub use products::ProductService;
pub use sales::SaleService;
pub use sessions::SessionService;
pub use suppliers::SupplierService;
pub use users::UserService;

/// All per-resource services, shared across handlers via app state.
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
    pub customers: Arc<CustomerService>,
    pub products: Arc<ProductService>,
    pub milk_purchases: Arc<MilkPurchaseService>,
    pub sales: Arc<SaleService>,
    pub users: Arc<UserService>,
    pub dashboard: Arc<DashboardService>,
    pub sessions: Arc<SessionService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self {
            suppliers: Arc::new(SupplierService::new(db.clone())),
            customers: Arc::new(CustomerService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone())),
            milk_purchases: Arc::new(MilkPurchaseService::new(db.clone())),
            sales: Arc::new(SaleService::new(db.clone())),
            users: Arc::new(UserService::new(db.clone())),
            dashboard: Arc::new(DashboardService::new(db.clone())),
            sessions: Arc::new(SessionService::new(db)),
        }
    }
}
