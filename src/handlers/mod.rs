// HTTP handlers: service banner and health, the ingestion dashboard,
// and CRUD for each entity under /api/v1.

pub mod dashboard;
pub mod data_products;
pub mod domains;
pub mod policies;
pub mod roles;
pub mod system;
pub mod users;
