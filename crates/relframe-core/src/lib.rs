//! # relframe Core
//!
//! Relation graph and filter engine for relframe.
//!
//! Tables are registered in a [`Catalog`], related to each other by named
//! key relations, and filtered with boolean expressions whose columns may
//! live on any table reachable from the one being filtered.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod query;
pub mod table;

pub use catalog::Catalog;
pub use config::{FilterConfig, UnqualifiedPolicy};
pub use error::{Error, Result};
pub use graph::{Relation, RelationGraph, TableId};
pub use query::{FilterEngine, JoinPlan, JoinStep};
pub use table::{RowId, Table, TableProvider, Value};
