//! Database entities for the dairy administration domain.
//!
//! Master data (suppliers, customers, products) is referenced by the
//! transactional records (milk purchases, sales). All entities use numeric
//! autoincrement ids and serialize in camelCase to match the wire contract.

pub mod customer;
pub mod milk_purchase;
pub mod product;
pub mod sale;
pub mod session_log;
pub mod supplier;
pub mod user;

pub use user::Role;
