use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Policy, PolicyCreate, PolicyUpdate, PolicyView};
use crate::database::repository::{Repository, POLICY_ROLES};
use crate::services::require_text;

pub struct PolicyService {
    repo: Repository<Policy>,
}

impl PolicyService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("policies", "Policy", pool),
        }
    }

    pub async fn create(&self, input: PolicyCreate) -> Result<PolicyView, DatabaseError> {
        require_text("name", &input.name)?;

        let mut tx = self.repo.pool().begin().await?;
        let policy = sqlx::query_as::<_, Policy>(
            "INSERT INTO policies (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(role_ids) = &input.role_ids {
            POLICY_ROLES.replace(&mut *tx, policy.id, role_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("Created policy {}", policy.id);
        self.view(policy).await
    }

    pub async fn get(&self, id: i32) -> Result<PolicyView, DatabaseError> {
        let policy = self.repo.select_404(id).await?;
        self.view(policy).await
    }

    pub async fn list(&self) -> Result<Vec<PolicyView>, DatabaseError> {
        let mut views = Vec::new();
        for policy in self.repo.select_all().await? {
            views.push(self.view(policy).await?);
        }
        Ok(views)
    }

    pub async fn update(&self, id: i32, input: PolicyUpdate) -> Result<PolicyView, DatabaseError> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }

        let mut tx = self.repo.pool().begin().await?;
        let policy = sqlx::query_as::<_, Policy>(
            "UPDATE policies SET name = COALESCE($2, name), description = COALESCE($3, description) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| self.repo.not_found())?;

        if let Some(role_ids) = &input.role_ids {
            POLICY_ROLES.replace(&mut *tx, policy.id, role_ids).await?;
        }
        tx.commit().await?;

        self.view(policy).await
    }

    pub async fn delete(&self, id: i32) -> Result<Policy, DatabaseError> {
        self.repo.delete_404(id).await
    }

    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.repo.delete_all().await
    }

    async fn view(&self, policy: Policy) -> Result<PolicyView, DatabaseError> {
        let mut conn = self.repo.pool().acquire().await?;
        let role_ids = POLICY_ROLES.ids(&mut *conn, policy.id).await?;
        Ok(PolicyView { policy, role_ids })
    }
}
