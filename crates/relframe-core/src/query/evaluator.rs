/// Filter evaluator
///
/// Executes a join plan as a sequence of left hash joins over row positions,
/// evaluates the predicate once per frame row and keeps every home row that
/// has at least one matching frame row.
use super::ast::*;
use super::planner::{JoinPlan, JoinStep};
use crate::error::{Error, Result};
use crate::graph::TableId;
use crate::table::{JoinKey, TableProvider, Value};
use std::collections::HashMap;

/// Joined rows as positions into their source tables.
///
/// Each row holds one slot per table in the plan; slot 0 is the home table
/// and is always filled. A `None` slot is a left-join miss.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    slots: HashMap<TableId, usize>,
    rows: Vec<Vec<Option<usize>>>,
}

impl Frame {
    /// Number of frame rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the frame has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row position of `table` in frame row `row`
    pub fn position(&self, row: usize, table: TableId) -> Option<usize> {
        let slot = *self.slots.get(&table)?;
        self.rows.get(row).and_then(|r| r[slot])
    }
}

/// Evaluator over the tables registered in a catalog, indexed by `TableId`
pub struct Evaluator<'a, T> {
    tables: &'a [T],
    max_frame_rows: Option<usize>,
}

impl<'a, T: TableProvider> Evaluator<'a, T> {
    /// Create an evaluator with no frame size limit
    pub fn new(tables: &'a [T]) -> Self {
        Self {
            tables,
            max_frame_rows: None,
        }
    }

    /// Fail instead of building frames larger than `limit` rows
    pub fn with_max_frame_rows(mut self, limit: Option<usize>) -> Self {
        self.max_frame_rows = limit;
        self
    }

    /// Filter the plan's home table with `expr`
    pub fn evaluate(&self, plan: &JoinPlan, expr: &Expr<ResolvedColumn>) -> Result<T> {
        let home = self.table(plan.home)?;
        let frame = self.build_frame(plan)?;
        let mask = self.eval_expr(plan, &frame, expr)?;

        let mut keep = vec![false; home.row_count()];
        for (row, matched) in frame.rows.iter().zip(&mask) {
            if let (true, Some(home_pos)) = (*matched, row[0]) {
                keep[home_pos] = true;
            }
        }

        tracing::debug!(
            frame_rows = frame.len(),
            kept = keep.iter().filter(|k| **k).count(),
            "filter evaluated"
        );
        home.select(&keep)
    }

    /// Materialize the joined frame for a plan
    pub fn build_frame(&self, plan: &JoinPlan) -> Result<Frame> {
        let home = self.table(plan.home)?;
        let mut frame = Frame {
            slots: HashMap::from([(plan.home, 0)]),
            rows: (0..home.row_count()).map(|i| vec![Some(i)]).collect(),
        };

        for step in &plan.steps {
            self.join(&mut frame, step)?;
        }
        Ok(frame)
    }

    fn join(&self, frame: &mut Frame, step: &JoinStep) -> Result<()> {
        let left = self.table(step.from)?;
        let right = self.table(step.to)?;
        let from_slot = *frame
            .slots
            .get(&step.from)
            .ok_or(Error::UnknownTable(step.from.0))?;

        let mut index: HashMap<JoinKey, Vec<usize>> = HashMap::new();
        for pos in 0..right.row_count() {
            if let Some(key) = right.value(pos, &step.on_right).and_then(Value::join_key) {
                index.entry(key).or_default().push(pos);
            }
        }

        let mut rows = Vec::with_capacity(frame.rows.len());
        for row in &frame.rows {
            let matches = row[from_slot]
                .and_then(|pos| left.value(pos, &step.on_left))
                .and_then(Value::join_key)
                .and_then(|key| index.get(&key));

            match matches {
                Some(positions) => {
                    for pos in positions {
                        let mut joined = row.clone();
                        joined.push(Some(*pos));
                        rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row.clone();
                    joined.push(None);
                    rows.push(joined);
                }
            }

            if let Some(limit) = self.max_frame_rows {
                if rows.len() > limit {
                    tracing::warn!(
                        relation = %step.relation,
                        limit,
                        "join frame exceeds the configured limit"
                    );
                    return Err(Error::FrameTooLarge {
                        rows: rows.len(),
                        limit,
                    });
                }
            }
        }

        tracing::trace!(step = %step, rows = rows.len(), "join step applied");
        frame.slots.insert(step.to, frame.slots.len());
        frame.rows = rows;
        Ok(())
    }

    fn eval_expr(
        &self,
        plan: &JoinPlan,
        frame: &Frame,
        expr: &Expr<ResolvedColumn>,
    ) -> Result<Vec<bool>> {
        match expr {
            Expr::Comparison {
                column,
                op,
                literal,
            } => self.eval_comparison(plan, frame, column, *op, &Value::from(literal)),
            Expr::And(terms) => {
                let mut mask = vec![true; frame.rows.len()];
                for term in terms {
                    let next = self.eval_expr(plan, frame, term)?;
                    mask.iter_mut().zip(next).for_each(|(m, n)| *m &= n);
                }
                Ok(mask)
            }
            Expr::Or(terms) => {
                let mut mask = vec![false; frame.rows.len()];
                for term in terms {
                    let next = self.eval_expr(plan, frame, term)?;
                    mask.iter_mut().zip(next).for_each(|(m, n)| *m |= n);
                }
                Ok(mask)
            }
            Expr::Not(e) => Ok(self.eval_expr(plan, frame, e)?.into_iter().map(|m| !m).collect()),
        }
    }

    fn eval_comparison(
        &self,
        plan: &JoinPlan,
        frame: &Frame,
        column: &ResolvedColumn,
        op: CompareOp,
        literal: &Value,
    ) -> Result<Vec<bool>> {
        let table = self.table(column.table)?;
        let slot = *frame.slots.get(&column.table).ok_or_else(|| Error::UnreachableTable {
            table: plan.table_name(column.table),
        })?;

        Ok(frame
            .rows
            .iter()
            .map(|row| match row[slot].and_then(|pos| table.value(pos, &column.column)) {
                Some(value) => compare(value, op, literal),
                None => compare(&Value::Null, op, literal),
            })
            .collect())
    }

    fn table(&self, id: TableId) -> Result<&'a T> {
        self.tables.get(id.0).ok_or(Error::UnknownTable(id.0))
    }
}

/// Compare a cell with a literal.
///
/// Null only equals the null literal. Values of unrelated kinds are unequal
/// and unordered.
pub fn compare(value: &Value, op: CompareOp, literal: &Value) -> bool {
    match (value.is_null(), literal.is_null()) {
        (true, true) => op == CompareOp::Eq,
        (true, false) => false,
        (false, true) => op == CompareOp::Ne,
        (false, false) => match op {
            CompareOp::Eq => value.loose_eq(literal) == Some(true),
            CompareOp::Ne => value.loose_eq(literal) != Some(true),
            CompareOp::Lt => value.partial_order(literal).is_some_and(|o| o.is_lt()),
            CompareOp::Le => value.partial_order(literal).is_some_and(|o| o.is_le()),
            CompareOp::Gt => value.partial_order(literal).is_some_and(|o| o.is_gt()),
            CompareOp::Ge => value.partial_order(literal).is_some_and(|o| o.is_ge()),
        },
    }
}
