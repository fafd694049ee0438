use sqlx::{PgConnection, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::{Domain, DomainCreate, DomainUpdate, DomainView};
use crate::database::repository::{Repository, DOMAIN_DATA_PRODUCTS};
use crate::services::require_text;

pub struct DomainService {
    repo: Repository<Domain>,
}

impl DomainService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("domains", "Domain", pool),
        }
    }

    pub async fn create(&self, input: DomainCreate) -> Result<DomainView, DatabaseError> {
        require_text("name", &input.name)?;

        let domain = sqlx::query_as::<_, Domain>(
            "INSERT INTO domains (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created domain {}", domain.id);
        self.view(domain).await
    }

    pub async fn get(&self, id: i32) -> Result<DomainView, DatabaseError> {
        let domain = self.repo.select_404(id).await?;
        self.view(domain).await
    }

    pub async fn list(&self) -> Result<Vec<DomainView>, DatabaseError> {
        let mut views = Vec::new();
        for domain in self.repo.select_all().await? {
            views.push(self.view(domain).await?);
        }
        Ok(views)
    }

    pub async fn update(&self, id: i32, input: DomainUpdate) -> Result<DomainView, DatabaseError> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }

        let mut tx = self.repo.pool().begin().await?;
        let domain = sqlx::query_as::<_, Domain>(
            "UPDATE domains SET name = COALESCE($2, name), description = COALESCE($3, description) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| self.repo.not_found())?;

        if let Some(user_ids) = &input.user_ids {
            replace_members(&mut *tx, domain.id, user_ids).await?;
        }
        if let Some(data_product_ids) = &input.data_product_ids {
            DOMAIN_DATA_PRODUCTS.replace(&mut *tx, domain.id, data_product_ids).await?;
        }
        tx.commit().await?;

        self.view(domain).await
    }

    pub async fn delete(&self, id: i32) -> Result<Domain, DatabaseError> {
        self.repo.delete_404(id).await
    }

    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.repo.delete_all().await
    }

    async fn view(&self, domain: Domain) -> Result<DomainView, DatabaseError> {
        let mut conn = self.repo.pool().acquire().await?;
        let user_ids = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM users WHERE domain_id = $1 ORDER BY id",
        )
        .bind(domain.id)
        .fetch_all(&mut *conn)
        .await?;
        let data_product_ids = DOMAIN_DATA_PRODUCTS.ids(&mut *conn, domain.id).await?;
        Ok(DomainView {
            domain,
            user_ids,
            data_product_ids,
        })
    }
}

/// Users belong to at most one domain, so membership lives on users.domain_id
async fn replace_members(
    conn: &mut PgConnection,
    domain_id: i32,
    user_ids: &[i32],
) -> Result<(), DatabaseError> {
    sqlx::query("UPDATE users SET domain_id = NULL WHERE domain_id = $1")
        .bind(domain_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE users SET domain_id = $1 WHERE id = ANY($2)")
        .bind(domain_id)
        .bind(user_ids)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
