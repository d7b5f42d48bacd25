/// Join planner
///
/// Turns the owner tables of a resolved filter into the minimal ordered list
/// of joins that brings all of them into one frame with the home table.
use super::resolver::{PinnedPath, ResolvedFilter};
use crate::error::{Error, Result};
use crate::graph::{Relation, RelationGraph, TableId};
use std::collections::HashMap;
use std::fmt;

/// One left join of the frame with a related table
#[derive(Debug, Clone, PartialEq)]
pub struct JoinStep {
    /// Table already in the frame
    pub from: TableId,
    /// Name of the relation followed
    pub relation: String,
    /// Table joined in by this step
    pub to: TableId,
    /// Key column on `from`
    pub on_left: String,
    /// Key column on `to`
    pub on_right: String,
    /// Hop count from home
    pub depth: usize,
}

/// Ordered joins starting at the home table
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub home: TableId,
    /// Every `from` is home or the `to` of an earlier step; no table repeats
    pub steps: Vec<JoinStep>,
    names: HashMap<TableId, String>,
}

impl JoinPlan {
    /// True when the filter only touches home columns
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Tables in the frame, home first, in join order
    pub fn tables(&self) -> Vec<TableId> {
        std::iter::once(self.home)
            .chain(self.steps.iter().map(|s| s.to))
            .collect()
    }

    /// Registered name of a table in the plan
    pub fn table_name(&self, table: TableId) -> String {
        self.names
            .get(&table)
            .cloned()
            .unwrap_or_else(|| table.to_string())
    }
}

/// Join planner over a relation graph
pub struct Planner<'a> {
    graph: &'a RelationGraph,
}

impl<'a> Planner<'a> {
    /// Create a new planner
    pub fn new(graph: &'a RelationGraph) -> Self {
        Self { graph }
    }

    /// Plan the joins needed to evaluate `filter` on `home`.
    ///
    /// Pinned paths from qualified references are used as written; every
    /// other owner table is reached through its shortest path.
    pub fn plan(&self, home: TableId, filter: &ResolvedFilter) -> Result<JoinPlan> {
        let mut builder = PlanBuilder::new(home);

        for pinned in &filter.pinned {
            builder.add_pinned(self.graph, pinned)?;
        }

        for owner in filter.owners() {
            if builder.contains(owner) {
                continue;
            }
            let reached = self
                .graph
                .reachable(home)
                .find(|r| r.table == owner)
                .ok_or_else(|| Error::UnreachableTable {
                    table: self
                        .graph
                        .table_name(owner)
                        .map_or_else(|| owner.to_string(), str::to_string),
                })?;
            builder.add_shortest(&reached.path);
        }

        let mut steps = builder.steps;
        // Stable, and a step's depth is always one more than its `from`
        steps.sort_by_key(|s| s.depth);

        // Names of every registered table, not only those in the plan
        let names = (0..self.graph.len())
            .map(TableId)
            .filter_map(|t| Some((t, self.graph.table_name(t)?.to_string())))
            .collect();

        let plan = JoinPlan { home, steps, names };
        tracing::debug!(home = %home, steps = plan.steps.len(), "join plan built");
        Ok(plan)
    }
}

struct PlanBuilder {
    home: TableId,
    steps: Vec<JoinStep>,
    depths: HashMap<TableId, usize>,
}

impl PlanBuilder {
    fn new(home: TableId) -> Self {
        let mut depths = HashMap::new();
        depths.insert(home, 0);
        Self {
            home,
            steps: Vec::new(),
            depths,
        }
    }

    fn contains(&self, table: TableId) -> bool {
        self.depths.contains_key(&table)
    }

    fn incoming(&self, table: TableId) -> Option<&JoinStep> {
        self.steps.iter().find(|s| s.to == table)
    }

    fn push(&mut self, relation: &Relation) {
        let depth = self.depths.get(&relation.source).copied().unwrap_or(0) + 1;
        self.depths.insert(relation.target, depth);
        self.steps.push(JoinStep {
            from: relation.source,
            relation: relation.name.clone(),
            to: relation.target,
            on_left: relation.on_left.clone(),
            on_right: relation.on_right.clone(),
            depth,
        });
    }

    /// Follow an explicit path; a table already joined through a different
    /// relation cannot be joined again.
    fn add_pinned(&mut self, graph: &RelationGraph, pinned: &PinnedPath) -> Result<()> {
        for relation in &pinned.path {
            if relation.target == self.home {
                return Err(Error::InvalidInput(format!(
                    "relation '{}' leads back to the home table, use self.<column>",
                    relation.name
                )));
            }
            match self.incoming(relation.target) {
                Some(step) if step.from == relation.source && step.relation == relation.name => {}
                Some(step) => {
                    let name = |t: TableId| {
                        graph
                            .table_name(t)
                            .map_or_else(|| t.to_string(), str::to_string)
                    };
                    return Err(Error::InvalidInput(format!(
                        "table '{}' is reached through both '{}.{}' and '{}.{}'",
                        name(relation.target),
                        name(step.from),
                        step.relation,
                        name(relation.source),
                        relation.name
                    )));
                }
                None => self.push(relation),
            }
        }
        Ok(())
    }

    /// Follow a shortest path, reusing tables already in the frame
    fn add_shortest(&mut self, path: &[&Relation]) {
        for relation in path {
            if !self.contains(relation.target) {
                self.push(relation);
            }
        }
    }
}

impl fmt::Display for JoinStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LeftJoin({} via {} ON {} = {})",
            self.to, self.relation, self.on_left, self.on_right
        )
    }
}

impl fmt::Display for JoinPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scan({})", self.table_name(self.home))?;
        for step in &self.steps {
            write!(
                f,
                " -> LeftJoin({}.{} -> {} ON {} = {})",
                self.table_name(step.from),
                step.relation,
                self.table_name(step.to),
                step.on_left,
                step.on_right
            )?;
        }
        Ok(())
    }
}
