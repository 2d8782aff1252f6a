use crate::error::Result;
use nexusqr_models::{PageOptions, User};
use sqlx::PgPool;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of users, oldest first
    pub async fn list(&self, options: PageOptions) -> Result<Vec<User>> {
        let offset = i64::try_from(options.offset()).unwrap_or(i64::MAX);

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY id LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(options.limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DatabaseConfig, DatabaseError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_database_is_reported() {
        let database = Database::connect_lazy(DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout: Duration::from_millis(200),
            ..DatabaseConfig::default()
        });
        let repository = UserRepository::new(database.pool().clone());

        let err = repository.count().await.unwrap_err();
        assert!(matches!(err, DatabaseError::Sqlx(_)));
    }

    #[tokio::test]
    #[ignore] // Only run with database available
    async fn test_list_first_page() {
        let database = Database::connect(DatabaseConfig::default()).await.unwrap();
        database.migrate().await.unwrap();
        let repository = UserRepository::new(database.pool().clone());

        let total = repository.count().await.unwrap();
        let users = repository.list(PageOptions::default()).await.unwrap();
        assert!(users.len() as u64 <= total.min(20));
    }
}
