use serde::Serialize;
use sqlx::{postgres::PgRow, FromRow, PgConnection, PgPool};

use crate::database::manager::DatabaseError;

/// Table-level operations shared by every entity.
///
/// Table and column names come from constants in the entity services, never
/// from request input.
pub struct Repository<T> {
    table_name: &'static str,
    label: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    /// `label` names the entity in not-found messages ("User", "Role", ...)
    pub fn new(table_name: &'static str, label: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            label,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} ORDER BY id", self.table_name);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn select_404(&self, id: i32) -> Result<T, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table_name);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Delete one row, returning it as it was before deletion
    pub async fn delete_404(&self, id: i32) -> Result<T, DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1 RETURNING *", self.table_name);
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Delete every row, returning how many were removed
    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        let sql = format!("DELETE FROM {}", self.table_name);
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        tracing::info!("Deleted {} rows from {}", result.rows_affected(), self.table_name);
        Ok(result.rows_affected())
    }

    pub fn not_found(&self) -> DatabaseError {
        DatabaseError::NotFound(format!("{} not found", self.label))
    }
}

/// A many-to-many association table between an owner and a target entity
#[derive(Debug, Clone, Copy)]
pub struct Association {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
}

pub const USER_ROLES: Association = Association {
    table: "user_roles",
    owner_column: "user_id",
    target_column: "role_id",
    target_table: "roles",
};

pub const ROLE_USERS: Association = USER_ROLES.reversed("users");

pub const ROLE_POLICIES: Association = Association {
    table: "role_policies",
    owner_column: "role_id",
    target_column: "policy_id",
    target_table: "policies",
};

pub const POLICY_ROLES: Association = ROLE_POLICIES.reversed("roles");

pub const DOMAIN_DATA_PRODUCTS: Association = Association {
    table: "domain_data_product",
    owner_column: "domain_id",
    target_column: "data_product_id",
    target_table: "data_products",
};

pub const DATA_PRODUCT_DOMAINS: Association = DOMAIN_DATA_PRODUCTS.reversed("domains");

impl Association {
    /// Same table seen from the target side; `owner_table` becomes the new target
    pub const fn reversed(self, owner_table: &'static str) -> Self {
        Self {
            table: self.table,
            owner_column: self.target_column,
            target_column: self.owner_column,
            target_table: owner_table,
        }
    }

    /// Target ids linked to `owner_id`, ascending
    pub async fn ids(&self, conn: &mut PgConnection, owner_id: i32) -> Result<Vec<i32>, DatabaseError> {
        let sql = format!(
            "SELECT {target} FROM {table} WHERE {owner} = $1 ORDER BY {target}",
            target = self.target_column,
            table = self.table,
            owner = self.owner_column,
        );
        let ids = sqlx::query_scalar::<_, i32>(&sql)
            .bind(owner_id)
            .fetch_all(conn)
            .await?;
        Ok(ids)
    }

    /// Replace every link of `owner_id` with `target_ids`. Ids with no
    /// matching target row are skipped.
    pub async fn replace(
        &self,
        conn: &mut PgConnection,
        owner_id: i32,
        target_ids: &[i32],
    ) -> Result<(), DatabaseError> {
        let delete = format!("DELETE FROM {} WHERE {} = $1", self.table, self.owner_column);
        sqlx::query(&delete).bind(owner_id).execute(&mut *conn).await?;

        if target_ids.is_empty() {
            return Ok(());
        }

        let insert = format!(
            "INSERT INTO {table} ({owner}, {target}) \
             SELECT $1, id FROM {target_table} WHERE id = ANY($2) \
             ON CONFLICT DO NOTHING",
            table = self.table,
            owner = self.owner_column,
            target = self.target_column,
            target_table = self.target_table,
        );
        let result = sqlx::query(&insert)
            .bind(owner_id)
            .bind(target_ids)
            .execute(&mut *conn)
            .await?;

        let skipped = target_ids.len() as u64 - result.rows_affected().min(target_ids.len() as u64);
        if skipped > 0 {
            tracing::debug!("Skipped {} unknown ids linking {}", skipped, self.table);
        }
        Ok(())
    }
}
