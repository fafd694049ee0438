use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DataProduct {
    pub id: i32,
    pub name: String,
    pub domain_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataProductView {
    #[serde(flatten)]
    pub data_product: DataProduct,
    pub domain_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataProductCreate {
    pub name: String,
    pub domain_id: Option<i32>,
    pub domain_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataProductUpdate {
    pub name: Option<String>,
    pub domain_id: Option<i32>,
    pub domain_ids: Option<Vec<i32>>,
}
