/// Filter engine module
///
/// Expression lexing and parsing, column resolution, join planning and
/// evaluation, driven end to end by [`FilterEngine`].
/// Abstract Syntax Tree types
#[allow(missing_docs)]
pub mod ast;
/// Filter evaluator
#[allow(missing_docs)]
pub mod evaluator;
/// Expression lexer
#[allow(missing_docs)]
pub mod lexer;
/// Expression parser
#[allow(missing_docs)]
pub mod parser;
/// Join planner
#[allow(missing_docs)]
pub mod planner;
/// Column resolver
#[allow(missing_docs)]
pub mod resolver;

// Re-export main types
pub use ast::*;
pub use evaluator::{Evaluator, Frame};
pub use lexer::{Lexer, Spanned, Token};
pub use parser::{parse_filter, FilterExpr, Parser};
pub use planner::{JoinPlan, JoinStep, Planner};
pub use resolver::{PinnedPath, ResolvedFilter, Resolver};

use crate::config::FilterConfig;
use crate::error::{Error, Result};
use crate::graph::{RelationGraph, TableId};
use crate::table::TableProvider;

/// Runs filter expressions against tables registered in a relation graph.
///
/// `tables` is indexed by `TableId`. The engine borrows everything and keeps
/// no state between calls.
pub struct FilterEngine<'a, T> {
    graph: &'a RelationGraph,
    tables: &'a [T],
    config: &'a FilterConfig,
}

impl<'a, T: TableProvider> FilterEngine<'a, T> {
    /// Create an engine over a graph and its tables
    pub fn new(graph: &'a RelationGraph, tables: &'a [T], config: &'a FilterConfig) -> Self {
        Self {
            graph,
            tables,
            config,
        }
    }

    /// Parse, resolve and plan `expr` without reading any rows
    pub fn prepare(&self, home: TableId, expr: &str) -> Result<(ResolvedFilter, JoinPlan)> {
        if expr.len() > self.config.max_expression_len {
            return Err(Error::InvalidInput(format!(
                "Expression length {} exceeds maximum {}",
                expr.len(),
                self.config.max_expression_len
            )));
        }

        let parsed = parse_filter(expr)?;
        let resolved = Resolver::new(self.graph, self.tables, home)
            .with_policy(self.config.unqualified)
            .resolve(&parsed)?;
        let plan = Planner::new(self.graph).plan(home, &resolved)?;

        tracing::debug!(
            home = %home,
            expr = %resolved.expr,
            joins = plan.steps.len(),
            "filter prepared"
        );
        Ok((resolved, plan))
    }

    /// The join plan `expr` would run with
    pub fn explain(&self, home: TableId, expr: &str) -> Result<JoinPlan> {
        self.prepare(home, expr).map(|(_, plan)| plan)
    }

    /// Filter `home` with `expr`, returning the kept rows with home's columns
    pub fn run(&self, home: TableId, expr: &str) -> Result<T> {
        let (resolved, plan) = self.prepare(home, expr)?;
        Evaluator::new(self.tables)
            .with_max_frame_rows(self.config.max_frame_rows)
            .evaluate(&plan, &resolved.expr)
    }
}
