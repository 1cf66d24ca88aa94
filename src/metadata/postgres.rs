use super::*;
use crate::MetadataError;
use sqlx::PgPool;

/// Reflects schema objects of a PostgreSQL database through `information_schema`.
///
/// The current database is the catalog; `pg_catalog` and `information_schema`
/// are never listed. Identifiers are cast to `text` so the `sql_identifier`
/// domain decodes as `String`.
#[derive(Debug, Clone)]
pub struct PgMetadataSource {
    pool: PgPool,
    schema: Option<String>,
}

const PG_TABLES: &str = r#"
    SELECT table_catalog::text, table_schema::text, table_name::text
    FROM information_schema.tables
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
      AND ($1::text IS NULL OR table_schema::text = $1::text)
"#;

const PG_COLUMNS: &str = r#"
    SELECT table_schema::text, table_name::text, column_name::text
    FROM information_schema.columns
    WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
      AND ($1::text IS NULL OR table_schema::text = $1::text)
"#;

const PG_KEYWORDS: &str = "SELECT word::text FROM pg_get_keywords()";

impl PgMetadataSource {
    pub fn new(pool: PgPool, schema: Option<String>) -> Self {
        Self { pool, schema }
    }

    /// Decode `information_schema` into a catalog tree.
    pub async fn fetch_database(&self) -> std::result::Result<Database, MetadataError> {
        if self.pool.is_closed() {
            return Err(MetadataError::Closed);
        }

        let catalog: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&self.pool)
            .await?;
        let mut database = Database::new(catalog);

        let tables: Vec<(String, String, String)> = sqlx::query_as(PG_TABLES)
            .bind(self.schema.as_deref())
            .fetch_all(&self.pool)
            .await?;
        for (_, schema, table) in tables {
            database.insert_table(schema, Table::new(table));
        }

        let columns: Vec<(String, String, String)> = sqlx::query_as(PG_COLUMNS)
            .bind(self.schema.as_deref())
            .fetch_all(&self.pool)
            .await?;
        for (schema, table, column) in columns {
            database.insert_column(schema, table, column);
        }

        trace!(
            "Reflected {} schemas from postgres database {}",
            database.schemas.len(),
            database.name
        );
        Ok(database)
    }
}

impl MetadataSource for PgMetadataSource {
    async fn fetch_schema_names(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        Ok(self.fetch_database().await?.object_names())
    }

    async fn fetch_keywords(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        if self.pool.is_closed() {
            return Err(MetadataError::Closed);
        }
        let words: Vec<String> = sqlx::query_scalar(PG_KEYWORDS)
            .fetch_all(&self.pool)
            .await?;
        Ok(words.into_iter().collect())
    }
}
