use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{User, UserCreate, UserUpdate, UserView};
use crate::database::repository::{Repository, USER_ROLES};
use crate::services::password::hash_password;
use crate::services::{require_text, validate_email};

const DUPLICATE_EMAIL: &str = "User with this email already exists";

pub struct UserService {
    repo: Repository<User>,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("users", "User", pool),
        }
    }

    pub async fn create(&self, input: UserCreate) -> Result<UserView, DatabaseError> {
        require_text("name", &input.name)?;
        validate_email(&input.email)?;
        require_text("password", &input.password)?;

        let mut tx = self.repo.pool().begin().await?;
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, hashed_password, domain_id) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(hash_password(&input.password))
        .bind(input.domain_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::unique_or(e, DUPLICATE_EMAIL))?;

        if let Some(role_ids) = &input.role_ids {
            USER_ROLES.replace(&mut *tx, user.id, role_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("Created user {}", user.id);
        self.view(user).await
    }

    pub async fn get(&self, id: i32) -> Result<UserView, DatabaseError> {
        let user = self.repo.select_404(id).await?;
        self.view(user).await
    }

    pub async fn list(&self) -> Result<Vec<UserView>, DatabaseError> {
        let mut views = Vec::new();
        for user in self.repo.select_all().await? {
            views.push(self.view(user).await?);
        }
        Ok(views)
    }

    pub async fn update(&self, id: i32, input: UserUpdate) -> Result<UserView, DatabaseError> {
        if let Some(email) = &input.email {
            validate_email(email)?;
        }
        if let Some(password) = &input.password {
            require_text("password", password)?;
        }

        let mut tx = self.repo.pool().begin().await?;
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             hashed_password = COALESCE($4, hashed_password), domain_id = COALESCE($5, domain_id) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(input.password.as_deref().map(hash_password))
        .bind(input.domain_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::unique_or(e, DUPLICATE_EMAIL))?
        .ok_or_else(|| self.repo.not_found())?;

        if let Some(role_ids) = &input.role_ids {
            USER_ROLES.replace(&mut *tx, user.id, role_ids).await?;
        }
        tx.commit().await?;

        self.view(user).await
    }

    pub async fn delete(&self, id: i32) -> Result<User, DatabaseError> {
        self.repo.delete_404(id).await
    }

    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.repo.delete_all().await
    }

    async fn view(&self, user: User) -> Result<UserView, DatabaseError> {
        let mut conn = self.repo.pool().acquire().await?;
        let role_ids = USER_ROLES.ids(&mut *conn, user.id).await?;
        Ok(UserView { user, role_ids })
    }
}
