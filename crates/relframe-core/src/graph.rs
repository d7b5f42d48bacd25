//! Relation graph
//!
//! An arena of table nodes keyed by [`TableId`] with one adjacency list of
//! outgoing named relations per node. Relations are only ever appended.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Stable identifier of a table node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub usize);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directed, named join declaration between two tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Table the relation is declared on
    pub source: TableId,
    /// Name, unique among the source's outgoing relations
    pub name: String,
    /// Related table
    pub target: TableId,
    /// Key column on the source table
    pub on_left: String,
    /// Key column on the target table
    pub on_right: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Node {
    name: String,
    relations: Vec<Relation>,
}

/// Table nodes and their outgoing relations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationGraph {
    nodes: Vec<Node>,
}

impl RelationGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table node. Names must be unique within the graph.
    pub fn add_table(&mut self, name: &str) -> Result<TableId> {
        if self.table_id(name).is_some() {
            return Err(Error::DuplicateTableName(name.to_string()));
        }
        self.nodes.push(Node {
            name: name.to_string(),
            relations: Vec::new(),
        });
        Ok(TableId(self.nodes.len() - 1))
    }

    /// Number of table nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no table is registered
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Name of a table node
    pub fn table_name(&self, id: TableId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.name.as_str())
    }

    /// Look a table up by name
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.nodes.iter().position(|n| n.name == name).map(TableId)
    }

    /// Declare a relation on `source`.
    ///
    /// Fails with [`Error::DuplicateRelationName`] if `source` already has a
    /// relation called `name`, and with [`Error::InvalidInput`] if `target` is
    /// `source`: a frame holds each table once, so a table cannot join itself.
    /// Key column existence is checked by the caller, which owns the table data.
    pub fn add_relation(
        &mut self,
        source: TableId,
        name: &str,
        target: TableId,
        on_left: &str,
        on_right: &str,
    ) -> Result<&Relation> {
        if self.nodes.get(target.0).is_none() {
            return Err(Error::UnknownTable(target.0));
        }
        let node = self
            .nodes
            .get_mut(source.0)
            .ok_or(Error::UnknownTable(source.0))?;

        if source == target {
            return Err(Error::InvalidInput(format!(
                "relation '{}' joins table '{}' to itself, self-relations are not supported",
                name, node.name
            )));
        }

        if node.relations.iter().any(|r| r.name == name) {
            return Err(Error::DuplicateRelationName {
                relation: name.to_string(),
                table: node.name.clone(),
            });
        }

        node.relations.push(Relation {
            source,
            name: name.to_string(),
            target,
            on_left: on_left.to_string(),
            on_right: on_right.to_string(),
        });
        tracing::debug!(
            relation = name,
            source = %source,
            target = %target,
            "relation declared"
        );
        Ok(&node.relations[node.relations.len() - 1])
    }

    /// Outgoing relations of a table, empty if it has none
    pub fn relations_of(&self, table: TableId) -> &[Relation] {
        self.nodes
            .get(table.0)
            .map(|n| n.relations.as_slice())
            .unwrap_or(&[])
    }

    /// Outgoing relation of `table` with the given name
    pub fn relation(&self, table: TableId, name: &str) -> Option<&Relation> {
        self.relations_of(table).iter().find(|r| r.name == name)
    }

    /// Breadth-first walk over every table reachable from `home`.
    ///
    /// Yields `home` first with an empty path, then each reachable table once,
    /// with the shortest relation path leading to it. Cycles are cut by a
    /// visited set, so the walk is always finite.
    pub fn reachable(&self, home: TableId) -> Reachable<'_> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        if home.0 < self.nodes.len() {
            visited.insert(home);
            queue.push_back(ReachableTable {
                table: home,
                path: Vec::new(),
            });
        }
        Reachable {
            graph: self,
            visited,
            queue,
        }
    }

    /// Shallowest relation named `name` reachable from `home`, together with
    /// the full path ending in it.
    pub fn find_relation(&self, home: TableId, name: &str) -> Option<Vec<&Relation>> {
        self.reachable(home).find_map(|reached| {
            self.relation(reached.table, name).map(|rel| {
                let mut path = reached.path;
                path.push(rel);
                path
            })
        })
    }
}

/// A table reached during traversal and the relations taken to reach it
#[derive(Debug, Clone, PartialEq)]
pub struct ReachableTable<'a> {
    pub table: TableId,
    pub path: Vec<&'a Relation>,
}

impl ReachableTable<'_> {
    /// Number of relation hops from home
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Lazy breadth-first traversal, see [`RelationGraph::reachable`]
pub struct Reachable<'a> {
    graph: &'a RelationGraph,
    visited: HashSet<TableId>,
    queue: VecDeque<ReachableTable<'a>>,
}

impl<'a> Iterator for Reachable<'a> {
    type Item = ReachableTable<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;
        for rel in self.graph.relations_of(current.table) {
            if self.visited.insert(rel.target) {
                let mut path = current.path.clone();
                path.push(rel);
                self.queue.push_back(ReachableTable {
                    table: rel.target,
                    path,
                });
            }
        }
        Some(current)
    }
}
