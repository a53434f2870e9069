//! Service actors. Each owns a request channel and serves every request in
//! its own task, bounded by the caller's deadline.

pub mod account_service;
pub mod catalog_service;
pub mod order_service;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
