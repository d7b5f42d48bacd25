/// Abstract Syntax Tree (AST) node types for filter expressions
///
/// The tree is generic over its column reference type: the parser produces
/// `Expr<ColumnRef>` with raw tokens, the resolver rewrites it into
/// `Expr<ResolvedColumn>` bound to concrete tables.
use crate::graph::TableId;
use crate::table::Value;
use std::fmt;

/// Boolean filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<C> {
    /// column <op> literal
    Comparison {
        column: C,
        op: CompareOp,
        literal: Literal,
    },
    /// Conjunction of two or more terms; a chain `x & y & z` is one node
    And(Vec<Expr<C>>),
    /// Disjunction of two or more terms
    Or(Vec<Expr<C>>),
    Not(Box<Expr<C>>),
}

impl<C> Expr<C> {
    /// Every column reference, left to right
    pub fn columns(&self) -> Vec<&C> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a C>) {
        match self {
            Expr::Comparison { column, .. } => out.push(column),
            Expr::And(terms) | Expr::Or(terms) => {
                for term in terms {
                    term.collect_columns(out);
                }
            }
            Expr::Not(e) => e.collect_columns(out),
        }
    }

    /// Rebuild the tree with every column reference mapped through `f`,
    /// stopping at the first error.
    pub fn try_map_columns<D, E>(
        &self,
        f: &mut impl FnMut(&C) -> Result<D, E>,
    ) -> Result<Expr<D>, E> {
        Ok(match self {
            Expr::Comparison {
                column,
                op,
                literal,
            } => Expr::Comparison {
                column: f(column)?,
                op: *op,
                literal: literal.clone(),
            },
            Expr::And(terms) => Expr::And(
                terms
                    .iter()
                    .map(|t| t.try_map_columns(&mut *f))
                    .collect::<Result<_, E>>()?,
            ),
            Expr::Or(terms) => Expr::Or(
                terms
                    .iter()
                    .map(|t| t.try_map_columns(&mut *f))
                    .collect::<Result<_, E>>()?,
            ),
            Expr::Not(e) => Expr::Not(Box::new(e.try_map_columns(f)?)),
        })
    }
}

/// Column reference as written in the expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub kind: ColumnRefKind,
    /// Character offset of the token in the expression
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRefKind {
    /// `amount`
    Unqualified(String),
    /// `orders.amount`, `orders.product.price`; `path` is never empty
    Qualified { path: Vec<String>, name: String },
    /// `self.age`
    SelfQualified(String),
}

impl ColumnRef {
    /// The bare column name, without qualifiers
    pub fn name(&self) -> &str {
        match &self.kind {
            ColumnRefKind::Unqualified(name)
            | ColumnRefKind::SelfQualified(name)
            | ColumnRefKind::Qualified { name, .. } => name,
        }
    }
}

/// Column reference bound to the table that owns it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedColumn {
    pub table: TableId,
    pub column: String,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq, // ==
    Ne, // !=
    Lt, // <
    Le, // <=
    Gt, // >
    Ge, // >=
}

impl CompareOp {
    /// The operator with its operands swapped: `a < b` is `b > a`
    pub fn mirrored(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Eq,
            CompareOp::Ne => CompareOp::Ne,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
        }
    }
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
        }
    }
}

// Display implementations for debugging and error messages

impl<C: fmt::Display> fmt::Display for Expr<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comparison {
                column,
                op,
                literal,
            } => write!(f, "{} {} {}", column, op, literal),
            Expr::And(terms) => write_terms(f, terms, " & "),
            Expr::Or(terms) => write_terms(f, terms, " | "),
            Expr::Not(e) => write!(f, "~({})", e),
        }
    }
}

fn write_terms<C: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    terms: &[Expr<C>],
    separator: &str,
) -> fmt::Result {
    write!(f, "(")?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", term)?;
    }
    write!(f, ")")
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ColumnRefKind::Unqualified(name) => write!(f, "{}", name),
            ColumnRefKind::Qualified { path, name } => write!(f, "{}.{}", path.join("."), name),
            ColumnRefKind::SelfQualified(name) => write!(f, "self.{}", name),
        }
    }
}

impl fmt::Display for ResolvedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(fl) if fl.fract() == 0.0 => write!(f, "{:.1}", fl),
            Literal::Float(fl) => write!(f, "{}", fl),
            // No escapes in the grammar, so pick the quote the string lacks
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "None"),
        }
    }
}
