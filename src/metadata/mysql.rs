use super::*;
use crate::MetadataError;
use sqlx::MySqlPool;

/// Reflects schema objects of a MySQL / MariaDB server through `information_schema`.
///
/// MySQL has no catalog level above schemas, so every visible schema is listed
/// (the server's system schemas excepted) unless a schema filter is given.
#[derive(Debug, Clone)]
pub struct MySqlMetadataSource {
    pool: MySqlPool,
    schema: Option<String>,
}

// CAST keeps MySQL 8 from reporting identifiers as binary strings.
const MYSQL_TABLES: &str = r#"
    SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR)
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys')
      AND (? IS NULL OR TABLE_SCHEMA = ?)
"#;

const MYSQL_COLUMNS: &str = r#"
    SELECT CAST(TABLE_SCHEMA AS CHAR), CAST(TABLE_NAME AS CHAR), CAST(COLUMN_NAME AS CHAR)
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA NOT IN ('mysql', 'information_schema', 'performance_schema', 'sys')
      AND (? IS NULL OR TABLE_SCHEMA = ?)
"#;

// Only present from MySQL 8.0 on.
const MYSQL_KEYWORDS: &str = "SELECT CAST(WORD AS CHAR) FROM information_schema.KEYWORDS";

impl MySqlMetadataSource {
    pub fn new(pool: MySqlPool, schema: Option<String>) -> Self {
        Self { pool, schema }
    }

    /// Decode `information_schema` into a catalog tree named after the current database.
    pub async fn fetch_database(&self) -> std::result::Result<Database, MetadataError> {
        if self.pool.is_closed() {
            return Err(MetadataError::Closed);
        }

        let current: Option<String> = sqlx::query_scalar("SELECT CAST(DATABASE() AS CHAR)")
            .fetch_one(&self.pool)
            .await?;
        let mut database = Database::new(current.unwrap_or_default());

        let tables: Vec<(String, String)> = sqlx::query_as(MYSQL_TABLES)
            .bind(self.schema.as_deref())
            .bind(self.schema.as_deref())
            .fetch_all(&self.pool)
            .await?;
        for (schema, table) in tables {
            database.insert_table(schema, Table::new(table));
        }

        let columns: Vec<(String, String, String)> = sqlx::query_as(MYSQL_COLUMNS)
            .bind(self.schema.as_deref())
            .bind(self.schema.as_deref())
            .fetch_all(&self.pool)
            .await?;
        for (schema, table, column) in columns {
            database.insert_column(schema, table, column);
        }

        trace!("Reflected {} schemas from mysql", database.schemas.len());
        Ok(database)
    }
}

impl MetadataSource for MySqlMetadataSource {
    async fn fetch_schema_names(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        Ok(self.fetch_database().await?.object_names())
    }

    async fn fetch_keywords(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        if self.pool.is_closed() {
            return Err(MetadataError::Closed);
        }
        let words: Vec<String> = sqlx::query_scalar(MYSQL_KEYWORDS)
            .fetch_all(&self.pool)
            .await?;
        Ok(words.into_iter().collect())
    }
}
