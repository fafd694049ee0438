use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{DataProduct, DataProductCreate, DataProductUpdate, DataProductView};
use crate::database::repository::{Repository, DATA_PRODUCT_DOMAINS};
use crate::services::require_text;

const DUPLICATE_NAME: &str = "Data product with this name already exists";

pub struct DataProductService {
    repo: Repository<DataProduct>,
}

impl DataProductService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("data_products", "Data product", pool),
        }
    }

    pub async fn create(&self, input: DataProductCreate) -> Result<DataProductView, DatabaseError> {
        require_text("name", &input.name)?;

        let mut tx = self.repo.pool().begin().await?;
        let product = sqlx::query_as::<_, DataProduct>(
            "INSERT INTO data_products (name, domain_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.name)
        .bind(input.domain_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::unique_or(e, DUPLICATE_NAME))?;

        if let Some(domain_ids) = &input.domain_ids {
            DATA_PRODUCT_DOMAINS.replace(&mut *tx, product.id, domain_ids).await?;
        }
        tx.commit().await?;

        tracing::info!("Created data product {}", product.id);
        self.view(product).await
    }

    pub async fn get(&self, id: i32) -> Result<DataProductView, DatabaseError> {
        let product = self.repo.select_404(id).await?;
        self.view(product).await
    }

    pub async fn list(&self) -> Result<Vec<DataProductView>, DatabaseError> {
        let mut views = Vec::new();
        for product in self.repo.select_all().await? {
            views.push(self.view(product).await?);
        }
        Ok(views)
    }

    pub async fn update(
        &self,
        id: i32,
        input: DataProductUpdate,
    ) -> Result<DataProductView, DatabaseError> {
        if let Some(name) = &input.name {
            require_text("name", name)?;
        }

        let mut tx = self.repo.pool().begin().await?;
        let product = sqlx::query_as::<_, DataProduct>(
            "UPDATE data_products SET name = COALESCE($2, name), domain_id = COALESCE($3, domain_id) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.domain_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DatabaseError::unique_or(e, DUPLICATE_NAME))?
        .ok_or_else(|| self.repo.not_found())?;

        if let Some(domain_ids) = &input.domain_ids {
            DATA_PRODUCT_DOMAINS.replace(&mut *tx, product.id, domain_ids).await?;
        }
        tx.commit().await?;

        self.view(product).await
    }

    pub async fn delete(&self, id: i32) -> Result<DataProduct, DatabaseError> {
        self.repo.delete_404(id).await
    }

    pub async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.repo.delete_all().await
    }

    async fn view(&self, data_product: DataProduct) -> Result<DataProductView, DatabaseError> {
        let mut conn = self.repo.pool().acquire().await?;
        let domain_ids = DATA_PRODUCT_DOMAINS.ids(&mut *conn, data_product.id).await?;
        Ok(DataProductView {
            data_product,
            domain_ids,
        })
    }
}
