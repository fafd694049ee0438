use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Domain {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Domain with its member users (via users.domain_id) and linked data products
#[derive(Debug, Clone, Serialize)]
pub struct DomainView {
    #[serde(flatten)]
    pub domain: Domain,
    pub user_ids: Vec<i32>,
    pub data_product_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_ids: Option<Vec<i32>>,
    pub data_product_ids: Option<Vec<i32>>,
}
