use super::*;

/// Catalog tree for one connected database: `Database → Schema → Table → columns`.
///
/// Introspection results are decoded into this tree first and then flattened
/// into completion names by [`Database::object_names`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    pub name: String,
    pub schemas: BTreeMap<String, Schema>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemas: BTreeMap::new(),
        }
    }

    /// Add (or create) schema/table and insert the column.
    pub fn insert_column(
        &mut self,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
        column: impl Into<String>,
    ) {
        let table_name = table_name.into();
        self.schema_mut(schema_name)
            .tables
            .entry(table_name.clone())
            .or_insert_with(|| Table::new(table_name)) // Create/return table
            .columns
            .insert(column.into());
    }

    /// Add (or create) schema and insert the table, replacing any table of the same name.
    pub fn insert_table(&mut self, schema_name: impl Into<String>, table: Table) {
        self.schema_mut(schema_name)
            .tables
            .insert(table.name.clone(), table);
    }

    /// Insert (or overwrite) a schema.
    pub fn insert_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn drop_table(&mut self, schema_name: &str, table_name: &str) -> Option<Table> {
        self.schemas
            .get_mut(schema_name)
            .and_then(|schema| schema.tables.remove(table_name))
    }

    /// Flatten the catalog, schema, table and column names into one namespace.
    ///
    /// Identity is by text: a column named like a table yields a single entry.
    /// Empty identifiers are skipped.
    pub fn object_names(&self) -> BTreeSet<String> {
        let schemas = self.schemas.values();
        let tables = schemas.clone().flat_map(|s| s.tables.values());
        let columns = tables.clone().flat_map(|t| t.columns.iter());

        std::iter::once(&self.name)
            .chain(schemas.map(|s| &s.name))
            .chain(tables.map(|t| &t.name))
            .chain(columns)
            .filter(|name| !name.is_empty())
            .cloned()
            .collect()
    }

    fn schema_mut(&mut self, schema_name: impl Into<String>) -> &mut Schema {
        let schema_name = schema_name.into();
        self.schemas
            .entry(schema_name.clone())
            .or_insert_with(|| Schema::new(schema_name)) // Create/return schema
    }
}
