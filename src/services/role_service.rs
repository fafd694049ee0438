use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Role, RoleCreate, RoleUpdate, RoleView};
use crate::database::repository::{Repository, ROLE_POLICIES, ROLE_USERS};
use crate::services::require_text;

pub struct RoleService {
    repo: Repository<Role>,
}

impl RoleService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("roles", "Role", pool),
        }
    }

    pub async fn create(&self, input: RoleCreate) -> Result<RoleView, DatabaseError> {
        require_text("name", &input.name)?;

        let mut tx = self.repo.pool().begin().await?;
        let role = sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(user_ids) = &input.user_ids {
            ROLE_USERS.replace(&mut *tx, role.id, user_ids).await?;
        }
        if let Some(policy_ids) = &input.policy_ids {
            ROLE_POLICIES.replace(&mut *tx, role.id, policy_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("Created role {}", role.id);
        self.view(role).await
    }

    pub async fn get(&self, id: i32) -> Result<RoleView, DatabaseError> {
        let role = self.repo.select_404(id).await?;
        self.view(role).await
    }

    pub async fn list(&self) -> Result<Vec<RoleView>, DatabaseError> {
        let mut views = Vec::new();
        for role in self.repo.select_all().await? {
            views.push(self.view(role).await?);
        }
        Ok(views)
    }

    pub async fn update(&self, id: i32, input: RoleUpdate) -> Result<RoleView, DatabaseError> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }

        let mut tx = self.repo.pool().begin().await?;
        let role = sqlx::query_as::<_, Role>(
            "UPDATE roles SET name = COALESCE($2, name), description = COALESCE($3, description) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| self.repo.not_found())?;

        if let Some(user_ids) = &input.user_ids {
            ROLE_USERS.replace(&mut *tx, role.id, user_ids).await?;
        }
        if let Some(policy_ids) = &input.policy_ids {
            ROLE_POLICIES.replace(&mut *tx, role.id, policy_ids).await?;
        }
        tx.commit().await?;

        self.view(role).await
    }

    pub async fn delete(&self, id: i32) -> Result<Role, DatabaseError> {
        self.repo.delete_404(id).await
    }

    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.repo.delete_all().await
    }

    async fn view(&self, role: Role) -> Result<RoleView, DatabaseError> {
        let mut conn = self.repo.pool().acquire().await?;
        let user_ids = ROLE_USERS.ids(&mut *conn, role.id).await?;
        let policy_ids = ROLE_POLICIES.ids(&mut *conn, role.id).await?;
        Ok(RoleView {
            role,
            user_ids,
            policy_ids,
        })
    }
}
