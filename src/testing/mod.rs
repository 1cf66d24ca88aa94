#![cfg(test)]
crate::reexport!(container);
crate::reexport!(context);
crate::reexport!(scripted);
pub use rstest::*;

pub(crate) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Only initialize once for all tests
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env()) // <- reads RUST_LOG
            .with_test_writer() // ensures it integrates with `cargo test` output
            .init();
    });
}

mod isolated_integration_tests {
    use super::{super::*, *};

    #[test_context(IsolatedIntegrationTest)]
    #[tokio::test]
    #[ignore = "requires docker"]
    async fn connects_to_isolated_database(ctx: &mut IsolatedIntegrationTest) -> Result {
        let database: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&ctx.pool)
            .await?;
        assert_eq!(ctx.database, database);
        Ok(())
    }

    #[test_context(IsolatedIntegrationTest)]
    #[rstest]
    #[case("customers")]
    #[case("orders")]
    #[tokio::test]
    #[ignore = "requires docker"]
    async fn databases_do_not_share_tables(
        ctx: &mut IsolatedIntegrationTest,
        #[case] table: &str,
    ) -> Result {
        let existing: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_one(&ctx.pool)
        .await?;
        assert_eq!(existing, 0);

        sqlx::query(sqlx::AssertSqlSafe(format!("CREATE TABLE {table} (id INT)")))
            .execute(&ctx.pool)
            .await?;
        Ok(())
    }
}
