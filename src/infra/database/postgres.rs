//! PostgreSQL store for transactions awaiting KMS signing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{AppError, Chain, DatabaseError, KmsStore};

/// PostgreSQL connection pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(3),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

/// A stored KMS transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsTransaction {
    pub id: Uuid,
    pub chain: String,
    pub serialized_transaction: String,
    pub signature_ids: Vec<String>,
    pub index: Option<i32>,
    pub tx_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// KMS transaction store with connection pooling
pub struct PostgresClient {
    pool: PgPool,
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id)
        .map_err(|_| AppError::Database(DatabaseError::NotFound(format!("KMS transaction {id}"))))
}

impl PostgresClient {
    /// Create a new PostgreSQL client with custom configuration
    pub async fn new(database_url: &str, config: PostgresConfig) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub async fn with_defaults(database_url: &str) -> Result<Self, AppError> {
        Self::new(database_url, PostgresConfig::default()).await
    }

    /// Run database migrations using sqlx migrate
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Migration(e.to_string())))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load one stored transaction
    #[instrument(skip(self))]
    pub async fn get_kms_transaction(&self, id: &str) -> Result<Option<KmsTransaction>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT id, chain, serialized_transaction, signature_ids, signature_index,
                   tx_id, created_at, completed_at
            FROM kms_transactions
            WHERE id = $1
            "#,
        )
        .bind(parse_id(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;

        Ok(row.map(|row| KmsTransaction {
            id: row.get("id"),
            chain: row.get("chain"),
            serialized_transaction: row.get("serialized_transaction"),
            signature_ids: row.get("signature_ids"),
            index: row.get("signature_index"),
            tx_id: row.get("tx_id"),
            created_at: row.get("created_at"),
            completed_at: row.get("completed_at"),
        }))
    }
}

#[async_trait]
impl KmsStore for PostgresClient {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Connection(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, tx_data, signature_ids), fields(chain = %chain))]
    async fn store_kms_transaction(
        &self,
        tx_data: &str,
        chain: Chain,
        signature_ids: &[String],
        index: Option<u32>,
    ) -> Result<String, AppError> {
        let index = index
            .map(i32::try_from)
            .transpose()
            .map_err(|e| AppError::Database(DatabaseError::Query(e.to_string())))?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO kms_transactions (id, chain, serialized_transaction, signature_ids, signature_index)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chain.as_str())
        .bind(tx_data)
        .bind(signature_ids)
        .bind(index)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;

        info!(kms_id = %id, "Stored KMS transaction");
        Ok(id.to_string())
    }

    #[instrument(skip(self))]
    async fn complete_kms_transaction(&self, id: &str, tx_id: &str) -> Result<(), AppError> {
        let completed_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE kms_transactions
            SET tx_id = $2, completed_at = NOW()
            WHERE id = $1 AND completed_at IS NULL
            RETURNING completed_at
            "#,
        )
        .bind(parse_id(id)?)
        .bind(tx_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.into()))?;

        if completed_at.is_none() {
            return Err(AppError::Database(DatabaseError::NotFound(format!(
                "Pending KMS transaction {id}"
            ))));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_id_is_not_found() {
        let err = parse_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound(_))));
    }
}
