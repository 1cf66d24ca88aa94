use super::*;
use crate::MetadataError;
use std::{future::Future, sync::Arc};

/// Something that can reflect live schema objects from a connected database.
///
/// Implementations own (a handle to) the connection. Both calls may be slow and
/// are only ever awaited off the completion path.
pub trait MetadataSource: Send + Sync + 'static {
    /// Catalog, schema, table and column names reachable in the current context,
    /// flattened into one namespace.
    fn fetch_schema_names(
        &self,
    ) -> impl Future<Output = std::result::Result<BTreeSet<String>, MetadataError>> + Send;

    /// Dialect keywords and function names the server advertises.
    fn fetch_keywords(
        &self,
    ) -> impl Future<Output = std::result::Result<BTreeSet<String>, MetadataError>> + Send {
        async { Ok(BTreeSet::new()) }
    }
}

impl<S: MetadataSource> MetadataSource for Arc<S> {
    fn fetch_schema_names(
        &self,
    ) -> impl Future<Output = std::result::Result<BTreeSet<String>, MetadataError>> + Send {
        S::fetch_schema_names(self)
    }

    fn fetch_keywords(
        &self,
    ) -> impl Future<Output = std::result::Result<BTreeSet<String>, MetadataError>> + Send {
        S::fetch_keywords(self)
    }
}

/// A [`MetadataSource`] backed by an in-memory catalog tree.
///
/// Useful for embedding the engine without a live connection, and for tests.
#[derive(Debug, Default)]
pub struct InMemorySource {
    database: RwLock<Database>,
    keywords: BTreeSet<String>,
}

impl InMemorySource {
    pub fn new(database: Database) -> Self {
        Self {
            database: RwLock::new(database),
            keywords: BTreeSet::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub async fn insert_table(&self, schema_name: impl Into<String>, table: Table) {
        self.database.write().await.insert_table(schema_name, table);
    }

    pub async fn drop_table(&self, schema_name: &str, table_name: &str) -> Option<Table> {
        self.database.write().await.drop_table(schema_name, table_name)
    }
}

impl MetadataSource for InMemorySource {
    async fn fetch_schema_names(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        Ok(self.database.read().await.object_names())
    }

    async fn fetch_keywords(&self) -> std::result::Result<BTreeSet<String>, MetadataError> {
        Ok(self.keywords.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_source_reflects_changes() {
        let mut db = Database::new("shop");
        db.insert_table("public", Table::new_with("orders", ["id"]));
        let source = InMemorySource::new(db).with_keywords(["LIMIT"]);

        let names = source.fetch_schema_names().await.expect("in-memory fetch");
        assert!(names.contains("orders"));
        assert!(!names.contains("customers"));

        source
            .insert_table("public", Table::new_with("customers", ["name"]))
            .await;
        source.drop_table("public", "orders").await;

        let names = source.fetch_schema_names().await.expect("in-memory fetch");
        assert!(names.contains("customers"));
        assert!(names.contains("name"));
        assert!(!names.contains("orders"));

        let keywords = source.fetch_keywords().await.expect("in-memory keywords");
        assert_eq!(keywords.into_iter().collect::<Vec<_>>(), ["LIMIT"]);
    }
}
