//! Table catalog
//!
//! Owns the registered tables, the relation graph between them and the
//! filter configuration. This is the single-threaded core the api crate
//! wraps in a lock.

use crate::config::FilterConfig;
use crate::error::{Error, Result};
use crate::graph::{Relation, RelationGraph, TableId};
use crate::query::{FilterEngine, JoinPlan};
use crate::table::{Table, TableProvider};

/// Registered tables and the relations declared between them
#[derive(Debug, Clone)]
pub struct Catalog<T = Table> {
    graph: RelationGraph,
    tables: Vec<T>,
    config: FilterConfig,
}

impl<T: TableProvider> Default for Catalog<T> {
    fn default() -> Self {
        Self::with_config(FilterConfig::default())
    }
}

impl<T: TableProvider> Catalog<T> {
    /// Create an empty catalog with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty catalog with a custom configuration
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            graph: RelationGraph::new(),
            tables: Vec::new(),
            config,
        }
    }

    /// Filter configuration
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace the filter configuration
    pub fn set_config(&mut self, config: FilterConfig) {
        self.config = config;
    }

    /// Register a table under a unique name
    pub fn add_table(&mut self, name: &str, table: T) -> Result<TableId> {
        let id = self.graph.add_table(name)?;
        self.tables.push(table);
        tracing::debug!(table = name, id = %id, "table registered");
        Ok(id)
    }

    /// Declare a relation named `name` from `source` to `target`.
    ///
    /// `on_left` must be a column of `source` and `on_right` a column of
    /// `target`.
    pub fn relate(
        &mut self,
        source: TableId,
        name: &str,
        target: TableId,
        on_left: &str,
        on_right: &str,
    ) -> Result<()> {
        self.check_column(source, on_left)?;
        self.check_column(target, on_right)?;
        self.graph
            .add_relation(source, name, target, on_left, on_right)?;
        Ok(())
    }

    /// Filter `home` with a relational expression
    pub fn rfilter(&self, home: TableId, expr: &str) -> Result<T> {
        self.engine().run(home, expr)
    }

    /// Join plan an `rfilter` call would execute, without evaluating it
    pub fn explain(&self, home: TableId, expr: &str) -> Result<JoinPlan> {
        self.engine().explain(home, expr)
    }

    /// A registered table
    pub fn table(&self, id: TableId) -> Option<&T> {
        self.tables.get(id.0)
    }

    /// Look a table up by its registered name
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.graph.table_id(name)
    }

    /// Registered name of a table
    pub fn table_name(&self, id: TableId) -> Option<&str> {
        self.graph.table_name(id)
    }

    /// Relations declared on a table
    pub fn relations(&self, id: TableId) -> &[Relation] {
        self.graph.relations_of(id)
    }

    /// The relation graph
    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    /// Number of registered tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is registered
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn engine(&self) -> FilterEngine<'_, T> {
        FilterEngine::new(&self.graph, &self.tables, &self.config)
    }

    fn check_column(&self, id: TableId, column: &str) -> Result<()> {
        let table = self.table(id).ok_or(Error::UnknownTable(id.0))?;
        if table.has_column(column) {
            Ok(())
        } else {
            Err(Error::UnknownColumn {
                column: column.to_string(),
                table: self
                    .table_name(id)
                    .map_or_else(|| id.to_string(), str::to_string),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnqualifiedPolicy;
    use crate::table::Value;

    fn catalog() -> (Catalog, TableId, TableId) {
        let mut catalog = Catalog::new();
        let customers = catalog
            .add_table(
                "customers",
                Table::new(
                    &["user_id", "age"],
                    vec![vec![Value::from(1), 30.into()], vec![Value::from(2), 61.into()]],
                )
                .unwrap(),
            )
            .unwrap();
        let orders = catalog
            .add_table(
                "orders",
                Table::new(
                    &["user_id", "age"],
                    vec![vec![Value::from(1), 90.into()]],
                )
                .unwrap(),
            )
            .unwrap();
        catalog
            .relate(customers, "orders", orders, "user_id", "user_id")
            .unwrap();
        (catalog, customers, orders)
    }

    #[test]
    fn test_relate_checks_key_columns() {
        let (mut catalog, customers, orders) = catalog();
        let err = catalog
            .relate(customers, "bad", orders, "id", "user_id")
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnknownColumn {
                column: "id".to_string(),
                table: "customers".to_string(),
            }
        );
        assert!(catalog.relate(orders, "back", TableId(9), "user_id", "x").is_err());
        assert_eq!(catalog.relations(customers).len(), 1);
    }

    #[test]
    fn test_duplicate_table() {
        let (mut catalog, ..) = catalog();
        let err = catalog
            .add_table("orders", Table::new(&["a"], Vec::<Vec<Value>>::new()).unwrap())
            .unwrap_err();
        assert_eq!(err, Error::DuplicateTableName("orders".to_string()));
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_rfilter_and_explain() {
        let (mut catalog, customers, _) = catalog();
        let result = catalog.rfilter(customers, "age > 50").unwrap();
        assert_eq!(result.len(), 1);
        assert!(catalog.explain(customers, "age > 50").unwrap().is_empty());

        let result = catalog.rfilter(customers, "orders.age > 50").unwrap();
        assert_eq!(result.column("user_id").unwrap(), &[Value::from(1)]);

        catalog.set_config(FilterConfig::default().with_unqualified(UnqualifiedPolicy::Strict));
        assert!(matches!(
            catalog.rfilter(customers, "age > 50"),
            Err(Error::AmbiguousColumn { .. })
        ));
    }

    #[test]
    fn test_expression_length_limit() {
        let mut catalog: Catalog =
            Catalog::with_config(FilterConfig::default().with_max_expression_len(8));
        let id = catalog
            .add_table("t", Table::new(&["a"], vec![vec![Value::from(1)]]).unwrap())
            .unwrap();
        assert!(catalog.rfilter(id, "a == 1").is_ok());
        assert!(matches!(
            catalog.rfilter(id, "a == 1 | a == 2"),
            Err(Error::InvalidInput(_))
        ));
    }
}
