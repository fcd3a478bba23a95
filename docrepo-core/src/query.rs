//! Query expressions and the visitor backends use to evaluate them.
//!
//! Filters compiled by [`compile`](crate::filter::compile) and the queries issued by a
//! [`Repository`](crate::repository::Repository) are expressed with the small AST in this module.
//! Each backend walks it through [`QueryVisitor`]: the memory backend evaluates it against stored
//! documents, the MongoDB backend translates it into a filter document.
//!
//! ```ignore
//! use docrepo::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::and([Filter::eq("status", "active"), Filter::contains("name", "ann")]))
//!     .limit(10)
//!     .sort("_id", SortDirection::Asc)
//!     .build();
//! ```

use bson::Bson;

use crate::error::RepositoryError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

/// Sort order: which field, which direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Exact equality.
    Eq,
    /// Strictly greater than.
    Gt,
    /// Case-insensitive, unanchored pattern match on a string field. The value is a pattern
    /// fragment and is not escaped.
    Contains,
}

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of the expressions. The empty conjunction matches every document.
    And(Vec<Expr>),
    /// A single field condition.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// An expression matching every document.
    pub fn all() -> Self {
        Expr::And(Vec::new())
    }

    /// Combines this expression with another using logical AND, flattening into an existing
    /// conjunction.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Returns `true` if this expression places no condition on documents.
    pub fn matches_all(&self) -> bool {
        match self {
            Expr::And(exprs) => exprs.iter().all(Expr::matches_all),
            Expr::Field { .. } => false,
        }
    }
}

/// A query: optional filter, limit and sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filter expression; `None` matches every document.
    pub filter: Option<Expr>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Sort order; `None` keeps storage order.
    pub sort: Option<Sort>,
}

impl Query {
    /// Creates a new query matching every document in storage order.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a new query builder.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

/// Constructors for filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field is strictly greater than the value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents where the string field contains the pattern fragment, ignoring case.
    pub fn contains(field: impl Into<String>, fragment: impl Into<String>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, Bson::String(fragment.into()))
    }

    /// Matches documents satisfying every expression.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the sort order.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort { field: field.into(), direction });
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// Walks an [`Expr`] tree. Implemented by each backend.
pub trait QueryVisitor {
    type Output;
    type Error: Into<RepositoryError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
