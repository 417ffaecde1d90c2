use std::collections::BTreeMap;

/// Name of the implicit column holding unmapped input fields as JSON text
pub const OVERFLOW_COLUMN: &str = "extra";

/// An ordinary column - one value per row, no relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Storage-engine type, e.g. "INTEGER", "VARCHAR(100)"
    pub sql_type: String,

    /// Whether this column is part of the primary key
    pub pk: bool,
}

impl Column {
    pub fn new(sql_type: impl Into<String>) -> Self {
        Column {
            sql_type: sql_type.into(),
            pk: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.pk = true;
        self
    }
}

/// A one-to-many foreign key: this column references `references(references_on)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Target table name
    pub references: String,

    /// Target column name
    pub references_on: String,

    /// The local column backing the key
    pub column: Column,
}

/// A many-to-many declaration, rendered as a junction table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManyOnConstraint {
    pub references: String,
    pub references_on: String,

    /// Name of the joining relation
    pub many_on: String,
}

/// Classification of a single column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Column(Column),
    Constraint(Constraint),
    ManyOn(ManyOnConstraint),
}

/// One declared table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: BTreeMap<String, Column>,
    pub constraints: BTreeMap<String, Constraint>,
    pub many_on: BTreeMap<String, ManyOnConstraint>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: BTreeMap::new(),
            constraints: BTreeMap::new(),
            many_on: BTreeMap::new(),
        }
    }

    /// File a classified column into the matching map
    pub fn insert(&mut self, column_name: String, kind: ColumnKind) {
        match kind {
            ColumnKind::Column(column) => {
                self.columns.insert(column_name, column);
            }
            ColumnKind::Constraint(constraint) => {
                self.constraints.insert(column_name, constraint);
            }
            ColumnKind::ManyOn(many_on) => {
                self.many_on.insert(column_name, many_on);
            }
        }
    }

    /// Every column physically stored in this table (ordinary and foreign-key),
    /// in sorted name order. The overflow column is not included.
    pub fn stored_columns(&self) -> Vec<(&str, &Column)> {
        let mut stored: Vec<(&str, &Column)> = self
            .columns
            .iter()
            .map(|(name, column)| (name.as_str(), column))
            .chain(
                self.constraints
                    .iter()
                    .map(|(name, constraint)| (name.as_str(), &constraint.column)),
            )
            .collect();
        stored.sort_by(|a, b| a.0.cmp(b.0));
        stored
    }

    /// Names of the primary-key columns, sorted
    pub fn primary_key(&self) -> Vec<&str> {
        self.stored_columns()
            .into_iter()
            .filter(|(_, column)| column.pk)
            .map(|(name, _)| name)
            .collect()
    }

    /// Name of the junction table synthesized for a many-to-many declaration
    pub fn junction_name(&self, many_on: &ManyOnConstraint) -> String {
        format!("{}_{}", self.name, many_on.references)
    }
}

/// The immutable table model built from a configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: BTreeMap<String, Table>,
}

impl Schema {
    pub(crate) fn from_tables(tables: BTreeMap<String, Table>) -> Self {
        Schema { tables }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Tables in name order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
