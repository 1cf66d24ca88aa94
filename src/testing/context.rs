use crate::testing::*;
use sqlx::{AssertSqlSafe, MySqlPool, PgPool};
use test_context::AsyncTestContext;
pub use test_context::test_context;

/// A freshly created, randomly named database inside the shared postgres
/// container. Dropped again on teardown unless `keep` is set.
pub struct IsolatedIntegrationTest {
    pub pool: PgPool,
    pub database: String,
    pub keep: bool,
}

fn database_name() -> String {
    use rand::Rng;
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("completion_{}", suffix.to_lowercase())
}

fn create_database_sql(database: &str) -> AssertSqlSafe<String> {
    AssertSqlSafe(format!("CREATE DATABASE {database}"))
}

impl AsyncTestContext for IsolatedIntegrationTest {
    async fn setup() -> Self {
        common_init();
        let admin = pool("postgres").await;
        let database = database_name();
        sqlx::query(create_database_sql(&database))
            .execute(&admin)
            .await
            .expect("Failed to create test database");
        admin.close().await;

        Self {
            pool: pool(&database).await,
            database,
            keep: false,
        }
    }

    async fn teardown(self) {
        if self.keep {
            return;
        }
        self.pool.close().await;

        let admin = pool("postgres").await;
        sqlx::query(AssertSqlSafe(format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            self.database
        )))
        .execute(&admin)
        .await
        .expect("Failed to drop test database");
    }
}

/// Like [`IsolatedIntegrationTest`], inside the shared mysql container.
pub struct IsolatedMySqlTest {
    pub pool: MySqlPool,
    pub database: String,
    pub keep: bool,
}

impl AsyncTestContext for IsolatedMySqlTest {
    async fn setup() -> Self {
        common_init();
        let admin = mysql_pool("mysql").await;
        let database = database_name();
        sqlx::query(create_database_sql(&database))
            .execute(&admin)
            .await
            .expect("Failed to create test database");
        admin.close().await;

        Self {
            pool: mysql_pool(&database).await,
            database,
            keep: false,
        }
    }

    async fn teardown(self) {
        if self.keep {
            return;
        }
        self.pool.close().await;

        let admin = mysql_pool("mysql").await;
        sqlx::query(AssertSqlSafe(format!(
            "DROP DATABASE IF EXISTS {}",
            self.database
        )))
        .execute(&admin)
        .await
        .expect("Failed to drop test database");
    }
}
