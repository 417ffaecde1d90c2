use crate::config::{ManyOnConstraint, Schema, Table, OVERFLOW_COLUMN};
use crate::ddl::statement::{ColumnDef, CreateTable, TableConstraint};
use crate::error::SchemaError;

/// Configuration for DDL generation
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Storage type of the overflow column
    pub overflow_type: String,

    /// Storage type of the two key columns in a junction table
    pub junction_key_type: String,

    /// Emit `CREATE TABLE IF NOT EXISTS` so the DDL can be re-run
    pub if_not_exists: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            overflow_type: String::from("VARCHAR(5000)"),
            junction_key_type: String::from("VARCHAR(100)"),
            if_not_exists: false,
        }
    }
}

/// Renders a `Schema` into executable DDL
pub struct SchemaCompiler {
    config: CompileConfig,
}

impl SchemaCompiler {
    pub fn new(config: CompileConfig) -> Self {
        SchemaCompiler { config }
    }

    /// Compile every table (and its junction tables) into a single DDL blob
    pub fn compile(&self, schema: &Schema) -> Result<String, SchemaError> {
        let statements = self.statements(schema)?;
        let ddl: String = statements.iter().map(ToString::to_string).collect();
        tracing::debug!(statements = statements.len(), "compiled schema DDL");
        Ok(ddl)
    }

    /// Build the structured statements without rendering them
    pub fn statements(&self, schema: &Schema) -> Result<Vec<CreateTable>, SchemaError> {
        if schema.is_empty() {
            return Err(SchemaError::Uninitialized);
        }

        let mut statements = Vec::new();
        for table in schema.tables() {
            statements.push(self.table_statement(table));
            for many_on in table.many_on.values() {
                statements.push(self.junction_statement(table, many_on));
            }
        }
        Ok(statements)
    }

    fn table_statement(&self, table: &Table) -> CreateTable {
        let primary_key = table.primary_key();
        let inline_pk = primary_key.len() == 1;

        let mut statement =
            CreateTable::new(table.name.as_str()).if_not_exists(self.config.if_not_exists);

        for (name, column) in table.stored_columns() {
            let mut def = ColumnDef::new(name, column.sql_type.as_str());
            if column.pk && inline_pk {
                def = def.primary_key();
            }
            statement = statement.column(def);
        }
        statement = statement.column(self.overflow_column());

        if primary_key.len() > 1 {
            statement = statement.constraint(TableConstraint::PrimaryKey(
                primary_key.iter().map(|name| name.to_string()).collect(),
            ));
        }

        for (name, constraint) in &table.constraints {
            statement = statement.constraint(TableConstraint::foreign_key(
                name.as_str(),
                constraint.references.as_str(),
                constraint.references_on.as_str(),
            ));
        }

        statement
    }

    fn junction_statement(&self, owner: &Table, many_on: &ManyOnConstraint) -> CreateTable {
        let target_key = format!("{}Id", many_on.references);
        let owner_key = format!("{}Id", owner.name);

        // Owner side points at the owner's own key when it has exactly one
        let primary_key = owner.primary_key();
        let owner_column = match primary_key.as_slice() {
            [single] => single.to_string(),
            _ => many_on.references_on.clone(),
        };

        CreateTable::new(owner.junction_name(many_on))
            .if_not_exists(self.config.if_not_exists)
            .column(ColumnDef::new(
                target_key.as_str(),
                self.config.junction_key_type.as_str(),
            ))
            .column(ColumnDef::new(
                owner_key.as_str(),
                self.config.junction_key_type.as_str(),
            ))
            .column(self.overflow_column())
            .constraint(TableConstraint::foreign_key(
                target_key,
                many_on.references.as_str(),
                many_on.references_on.as_str(),
            ))
            .constraint(TableConstraint::foreign_key(
                owner_key,
                owner.name.as_str(),
                owner_column,
            ))
    }

    fn overflow_column(&self) -> ColumnDef {
        ColumnDef::new(OVERFLOW_COLUMN, self.config.overflow_type.as_str())
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        SchemaCompiler::new(CompileConfig::default())
    }
}
