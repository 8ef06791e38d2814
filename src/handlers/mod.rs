pub mod health_handlers;
pub mod log_handlers;
pub mod product_handlers;
