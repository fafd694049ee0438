use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Policy {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyView {
    #[serde(flatten)]
    pub policy: Policy,
    pub role_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyCreate {
    pub name: String,
    pub description: Option<String>,
    pub role_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub role_ids: Option<Vec<i32>>,
}
