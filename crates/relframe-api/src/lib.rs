//! # relframe
//!
//! Filter tables through declared relations without writing joins.
//!
//! ## Quick Start
//!
//! ```rust
//! use relframe::{Table, Value, Workspace};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ws = Workspace::new();
//!
//!     let customers = ws.add_table(
//!         "customers",
//!         Table::new(
//!             &["user_id", "age"],
//!             vec![vec![Value::from(1), 34.into()], vec![Value::from(2), 61.into()]],
//!         )?,
//!     )?;
//!     let orders = ws.add_table(
//!         "orders",
//!         Table::new(
//!             &["user_id", "amount"],
//!             vec![vec![Value::from(2), 900.into()]],
//!         )?,
//!     )?;
//!
//!     // Declare how the tables join
//!     customers.relate("orders", &orders, "user_id", "user_id")?;
//!
//!     // Columns of related tables can be used directly
//!     let big_spenders = customers.rfilter("orders.amount > 500 & age > 50")?;
//!     assert_eq!(big_spenders.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Column references
//!
//! - `age`: the home table if it has the column, otherwise the one reachable
//!   table that does
//! - `self.age`: always the home table
//! - `orders.amount`: the target of the relation named `orders`
//! - `orders.product.price`: a chain of relations

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod logging;

// Re-export core types
pub use relframe_core::{
    Catalog, Error, FilterConfig, JoinPlan, JoinStep, Relation, Result, RowId, Table, TableId,
    TableProvider, UnqualifiedPolicy, Value,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A set of tables and the relations between them.
///
/// Thread-safe and can be cloned to share across threads. Declaring tables
/// and relations takes a write lock; filtering only reads.
///
/// # Examples
///
/// ```rust
/// use relframe::{Table, Value, Workspace};
///
/// let ws = Workspace::new();
/// let people = ws.add_table(
///     "people",
///     Table::new(&["name", "age"], vec![vec![Value::from("Ann"), 41.into()]])?,
/// )?;
/// assert_eq!(people.rfilter("age > 40")?.len(), 1);
/// # Ok::<(), relframe::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Workspace {
    inner: Arc<RwLock<Catalog>>,
}

impl Workspace {
    /// Create an empty workspace with the default filter configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty workspace with a custom filter configuration
    pub fn with_config(config: FilterConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Catalog::with_config(config))),
        }
    }

    /// Register a table under a unique name.
    ///
    /// The workspace takes ownership of the data; filtering never changes it.
    pub fn add_table(&self, name: &str, table: Table) -> Result<RelationalTable> {
        let id = self.write()?.add_table(name, table)?;
        Ok(RelationalTable {
            workspace: self.clone(),
            id,
        })
    }

    /// Handle to a registered table
    pub fn table(&self, name: &str) -> Result<Option<RelationalTable>> {
        Ok(self.read()?.table_id(name).map(|id| RelationalTable {
            workspace: self.clone(),
            id,
        }))
    }

    /// Current filter configuration
    pub fn config(&self) -> Result<FilterConfig> {
        Ok(self.read()?.config().clone())
    }

    /// Replace the filter configuration for subsequent calls
    pub fn set_config(&self, config: FilterConfig) -> Result<()> {
        self.write()?.set_config(config);
        Ok(())
    }

    /// Number of registered tables
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// True when no table is registered
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>> {
        self.inner.read().map_err(|_| Error::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.inner.write().map_err(|_| Error::LockPoisoned)
    }
}

/// Handle to a table registered in a [`Workspace`].
///
/// Cheap to clone; every clone refers to the same table.
#[derive(Clone)]
pub struct RelationalTable {
    workspace: Workspace,
    id: TableId,
}

impl RelationalTable {
    /// Identifier of the table in its workspace
    pub fn id(&self) -> TableId {
        self.id
    }

    /// Registered name
    pub fn name(&self) -> Result<String> {
        let catalog = self.workspace.read()?;
        catalog
            .table_name(self.id)
            .map(str::to_string)
            .ok_or(Error::UnknownTable(self.id.0))
    }

    /// Copy of the table data
    pub fn data(&self) -> Result<Table> {
        let catalog = self.workspace.read()?;
        catalog
            .table(self.id)
            .cloned()
            .ok_or(Error::UnknownTable(self.id.0))
    }

    /// Relations declared on this table, in declaration order
    pub fn relations(&self) -> Result<Vec<Relation>> {
        Ok(self.workspace.read()?.relations(self.id).to_vec())
    }

    /// Declare a relation named `name` from this table to `other`.
    ///
    /// Rows join where `self.on_left == other.on_right`. Keys need not be
    /// unique on either side.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateRelationName`] if this table already has a
    ///   relation called `name`
    /// - [`Error::UnknownColumn`] if a key column is missing
    /// - [`Error::ForeignTable`] if `other` belongs to another workspace
    /// - [`Error::InvalidInput`] if `other` is this table; self-relations
    ///   are not supported
    pub fn relate(
        &self,
        name: &str,
        other: &RelationalTable,
        on_left: &str,
        on_right: &str,
    ) -> Result<()> {
        if !Arc::ptr_eq(&self.workspace.inner, &other.workspace.inner) {
            return Err(Error::ForeignTable);
        }
        self.workspace
            .write()?
            .relate(self.id, name, other.id, on_left, on_right)
    }

    /// Filter this table with a relational expression.
    ///
    /// Returns the rows for which at least one combination of related rows
    /// satisfies `expr`, with this table's own columns and row order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use relframe::{Table, Value, Workspace};
    ///
    /// let ws = Workspace::new();
    /// let t = ws.add_table("t", Table::new(&["x"], vec![vec![Value::from(1)], vec![Value::from(5)]])?)?;
    /// assert_eq!(t.rfilter("x >= 2 | x == None")?.len(), 1);
    /// # Ok::<(), relframe::Error>(())
    /// ```
    pub fn rfilter(&self, expr: &str) -> Result<Table> {
        let result = self.workspace.read()?.rfilter(self.id, expr);
        match &result {
            Ok(table) => tracing::debug!(table = %self.id, expr, rows = table.len(), "rfilter"),
            Err(e) => tracing::debug!(table = %self.id, expr, error = %e, "rfilter failed"),
        }
        result
    }

    /// Join plan `rfilter(expr)` would execute, without reading rows
    pub fn explain(&self, expr: &str) -> Result<JoinPlan> {
        self.workspace.read()?.explain(self.id, expr)
    }
}

impl std::fmt::Debug for RelationalTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalTable")
            .field("id", &self.id)
            .finish()
    }
}
