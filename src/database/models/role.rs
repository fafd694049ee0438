use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    #[serde(flatten)]
    pub role: Role,
    pub user_ids: Vec<i32>,
    pub policy_ids: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
    pub user_ids: Option<Vec<i32>>,
    pub policy_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub user_ids: Option<Vec<i32>>,
    pub policy_ids: Option<Vec<i32>>,
}
