/// Column resolver
///
/// Binds every column reference of a parsed filter to the one table that owns
/// it, using the relation graph reachable from the home table. Runs before
/// any row is read.
use super::ast::*;
use super::parser::FilterExpr;
use crate::config::UnqualifiedPolicy;
use crate::error::{Error, Result};
use crate::graph::{Relation, RelationGraph, TableId};
use crate::table::TableProvider;

/// Relation path fixed by a qualified reference
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedPath {
    /// Table the path ends at
    pub table: TableId,
    /// Relations from home to `table`, never empty
    pub path: Vec<Relation>,
}

/// Filter with every column bound to its owner table
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub expr: Expr<ResolvedColumn>,
    /// Paths named explicitly by qualified references, in expression order
    pub pinned: Vec<PinnedPath>,
}

impl ResolvedFilter {
    /// Distinct owner tables, in order of first reference
    pub fn owners(&self) -> Vec<TableId> {
        let mut owners = Vec::new();
        for column in self.expr.columns() {
            if !owners.contains(&column.table) {
                owners.push(column.table);
            }
        }
        owners
    }
}

/// Column resolver over a graph and the tables registered in it.
///
/// `tables` is indexed by `TableId`.
pub struct Resolver<'a, T> {
    graph: &'a RelationGraph,
    tables: &'a [T],
    home: TableId,
    policy: UnqualifiedPolicy,
}

impl<'a, T: TableProvider> Resolver<'a, T> {
    /// Create a resolver for filters on `home`
    pub fn new(graph: &'a RelationGraph, tables: &'a [T], home: TableId) -> Self {
        Self {
            graph,
            tables,
            home,
            policy: UnqualifiedPolicy::default(),
        }
    }

    /// Set the unqualified-name policy
    pub fn with_policy(mut self, policy: UnqualifiedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve every reference in `expr`, failing on the first bad one
    pub fn resolve(&self, expr: &FilterExpr) -> Result<ResolvedFilter> {
        if self.tables.get(self.home.0).is_none() {
            return Err(Error::UnknownTable(self.home.0));
        }

        let mut pinned: Vec<PinnedPath> = Vec::new();
        let expr = expr.try_map_columns(&mut |column: &ColumnRef| {
            let (resolved, path) = self.resolve_column(column)?;
            if let Some(path) = path {
                if !pinned.iter().any(|p| p.path == path) {
                    pinned.push(PinnedPath {
                        table: resolved.table,
                        path,
                    });
                }
            }
            Ok::<_, Error>(resolved)
        })?;

        Ok(ResolvedFilter { expr, pinned })
    }

    fn resolve_column(&self, column: &ColumnRef) -> Result<(ResolvedColumn, Option<Vec<Relation>>)> {
        match &column.kind {
            ColumnRefKind::SelfQualified(name) => Ok((self.on_home(name)?, None)),
            ColumnRefKind::Qualified { path, name } => self.resolve_qualified(path, name),
            ColumnRefKind::Unqualified(name) => Ok((self.resolve_unqualified(name)?, None)),
        }
    }

    fn on_home(&self, name: &str) -> Result<ResolvedColumn> {
        if self.has_column(self.home, name) {
            Ok(ResolvedColumn {
                table: self.home,
                column: name.to_string(),
            })
        } else {
            Err(Error::UnknownColumn {
                column: name.to_string(),
                table: self.name_of(self.home),
            })
        }
    }

    fn resolve_qualified(
        &self,
        path: &[String],
        name: &str,
    ) -> Result<(ResolvedColumn, Option<Vec<Relation>>)> {
        let Some((first, rest)) = path.split_first() else {
            return Ok((self.on_home(name)?, None));
        };

        let mut hops: Vec<Relation> = match self.graph.find_relation(self.home, first) {
            Some(found) => found.into_iter().cloned().collect(),
            // `customers.age` on the customers table means `self.age`
            None if self.graph.table_name(self.home) == Some(first.as_str()) => Vec::new(),
            None => {
                return Err(Error::UnknownRelation {
                    relation: first.clone(),
                    table: self.name_of(self.home),
                })
            }
        };

        let mut current = hops.last().map_or(self.home, |r| r.target);
        for segment in rest {
            let relation = self
                .graph
                .relation(current, segment)
                .ok_or_else(|| Error::UnknownRelation {
                    relation: segment.clone(),
                    table: self.name_of(current),
                })?;
            current = relation.target;
            hops.push(relation.clone());
        }

        if !self.has_column(current, name) {
            return Err(Error::UnknownColumn {
                column: name.to_string(),
                table: self.name_of(current),
            });
        }

        let resolved = ResolvedColumn {
            table: current,
            column: name.to_string(),
        };
        Ok((resolved, (!hops.is_empty()).then_some(hops)))
    }

    fn resolve_unqualified(&self, name: &str) -> Result<ResolvedColumn> {
        let on_home = self.has_column(self.home, name);
        if on_home && self.policy == UnqualifiedPolicy::PreferHome {
            return Ok(ResolvedColumn {
                table: self.home,
                column: name.to_string(),
            });
        }

        let mut searched = Vec::new();
        let mut owners = Vec::new();
        for reached in self.graph.reachable(self.home) {
            searched.push(self.name_of(reached.table));
            if self.has_column(reached.table, name) {
                owners.push(reached.table);
            }
        }

        match owners.as_slice() {
            [] => Err(Error::UnknownColumn {
                column: name.to_string(),
                table: searched.join(", "),
            }),
            [owner] => {
                tracing::trace!(column = name, owner = %owner, "resolved unqualified column");
                Ok(ResolvedColumn {
                    table: *owner,
                    column: name.to_string(),
                })
            }
            _ => Err(Error::AmbiguousColumn {
                column: name.to_string(),
                candidates: owners.iter().map(|t| self.name_of(*t)).collect(),
            }),
        }
    }

    fn has_column(&self, table: TableId, name: &str) -> bool {
        self.tables
            .get(table.0)
            .is_some_and(|t| t.has_column(name))
    }

    fn name_of(&self, table: TableId) -> String {
        self.graph
            .table_name(table)
            .map_or_else(|| table.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parser::parse_filter;
    use crate::table::{Table, Value};

    struct Fixture {
        graph: RelationGraph,
        tables: Vec<Table>,
    }

    fn empty(columns: &[&str]) -> Table {
        Table::new(columns, Vec::<Vec<Value>>::new()).unwrap()
    }

    /// customers(0) -orders-> orders(1) -product-> products(2)
    /// customers(0) -refunds-> refunds(3)
    fn fixture() -> Fixture {
        let mut graph = RelationGraph::new();
        let c = graph.add_table("customers").unwrap();
        let o = graph.add_table("orders").unwrap();
        let p = graph.add_table("products").unwrap();
        let r = graph.add_table("refunds").unwrap();
        graph.add_relation(c, "orders", o, "user_id", "user_id").unwrap();
        graph.add_relation(o, "product", p, "product_id", "id").unwrap();
        graph.add_relation(c, "refunds", r, "user_id", "user_id").unwrap();

        let tables = vec![
            empty(&["user_id", "age", "name"]),
            empty(&["user_id", "product_id", "amount", "quantity"]),
            empty(&["id", "price", "name"]),
            empty(&["user_id", "amount", "reason"]),
        ];
        Fixture { graph, tables }
    }

    fn resolve(f: &Fixture, expr: &str) -> Result<ResolvedFilter> {
        Resolver::new(&f.graph, &f.tables, TableId(0)).resolve(&parse_filter(expr)?)
    }

    fn owner(f: &Fixture, expr: &str) -> TableId {
        resolve(f, expr).unwrap().owners()[0]
    }

    #[test]
    fn test_home_and_self() {
        let f = fixture();
        assert_eq!(owner(&f, "age > 50"), TableId(0));
        assert_eq!(owner(&f, "self.age > 50"), TableId(0));
        assert_eq!(owner(&f, "customers.age > 50"), TableId(0));
        assert!(resolve(&f, "age > 50").unwrap().pinned.is_empty());

        let err = resolve(&f, "self.amount > 1").unwrap_err();
        assert_eq!(
            err,
            Error::UnknownColumn {
                column: "amount".to_string(),
                table: "customers".to_string(),
            }
        );
    }

    #[test]
    fn test_unique_related_column() {
        let f = fixture();
        assert_eq!(owner(&f, "quantity > 1"), TableId(1));
        assert_eq!(owner(&f, "price < 10"), TableId(2));
    }

    #[test]
    fn test_home_wins_by_default() {
        let f = fixture();
        // `name` is on customers and products
        assert_eq!(owner(&f, "name == 'x'"), TableId(0));
    }

    #[test]
    fn test_strict_policy_flags_home_collisions() {
        let f = fixture();
        let err = Resolver::new(&f.graph, &f.tables, TableId(0))
            .with_policy(UnqualifiedPolicy::Strict)
            .resolve(&parse_filter("name == 'x'").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            Error::AmbiguousColumn {
                column: "name".to_string(),
                candidates: vec!["customers".to_string(), "products".to_string()],
            }
        );
    }

    #[test]
    fn test_ambiguous_across_related_tables() {
        let f = fixture();
        let err = resolve(&f, "amount > 500").unwrap_err();
        assert_eq!(
            err,
            Error::AmbiguousColumn {
                column: "amount".to_string(),
                candidates: vec!["orders".to_string(), "refunds".to_string()],
            }
        );

        let resolved = resolve(&f, "orders.amount > 500 & refunds.amount < 5").unwrap();
        assert_eq!(resolved.owners(), vec![TableId(1), TableId(3)]);
    }

    #[test]
    fn test_qualified_paths_are_pinned() {
        let f = fixture();
        let resolved = resolve(&f, "orders.product.price > 1").unwrap();
        assert_eq!(resolved.owners(), vec![TableId(2)]);
        assert_eq!(resolved.pinned.len(), 1);
        let names: Vec<_> = resolved.pinned[0].path.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "product"]);

        // A single segment may name any reachable relation
        let resolved = resolve(&f, "product.price > 1").unwrap();
        assert_eq!(resolved.pinned[0].path.len(), 2);
    }

    #[test]
    fn test_unknown_relation_and_column() {
        let f = fixture();
        assert_eq!(
            resolve(&f, "invoices.amount > 1").unwrap_err(),
            Error::UnknownRelation {
                relation: "invoices".to_string(),
                table: "customers".to_string(),
            }
        );
        assert_eq!(
            resolve(&f, "orders.refunds.amount > 1").unwrap_err(),
            Error::UnknownRelation {
                relation: "refunds".to_string(),
                table: "orders".to_string(),
            }
        );
        assert_eq!(
            resolve(&f, "orders.price > 1").unwrap_err(),
            Error::UnknownColumn {
                column: "price".to_string(),
                table: "orders".to_string(),
            }
        );

        match resolve(&f, "height > 1").unwrap_err() {
            Error::UnknownColumn { column, table } => {
                assert_eq!(column, "height");
                assert_eq!(table, "customers, orders, refunds, products");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolution_from_other_home() {
        let f = fixture();
        // From orders, customers is not reachable
        let err = Resolver::new(&f.graph, &f.tables, TableId(1))
            .resolve(&parse_filter("age > 1").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }
}
