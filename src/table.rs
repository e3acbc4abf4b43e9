use crate::schema::ColumnSchema;

/// One log record as positional cells under a [`ColumnSchema`].
pub type Row = Vec<String>;

/// An in-memory shard: the unit every stage reads, transforms and writes.
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: ColumnSchema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: ColumnSchema) -> Self {
        Table {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(schema: ColumnSchema, rows: Vec<Row>) -> Self {
        Table { schema, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
