//! Translation of docrepo query expressions into MongoDB filter documents.

use bson::{Bson, Document, doc};

use docrepo_core::{
    error::RepositoryError,
    query::{Expr, FieldOp, QueryVisitor},
};


/// Translates query expressions into MongoDB's filter syntax.
///
/// An empty conjunction becomes the empty filter `{}`, which MongoDB treats as "match all"
/// (an empty `$and` array is rejected by the server).
pub(crate) struct MongoQueryTranslator;

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = RepositoryError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let clauses = exprs
            .iter()
            .filter(|expr| !expr.matches_all())
            .map(|expr| self.visit_expr(expr))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match clauses.len() {
            0 => doc! {},
            _ => doc! { "$and": clauses },
        })
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Gt => doc! { "$gt": value },
                FieldOp::Contains => match value {
                    Bson::String(fragment) => doc! { "$regex": format!(".*{}.*", fragment), "$options": "i" },
                    _ => return Err(RepositoryError::InvalidFilter(format!("contains on `{field}` requires a string fragment"))),
                },
            }
        })
    }
}
