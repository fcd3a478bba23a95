//! Compilation of field-to-value filter maps into query expressions.
//!
//! Callers describe what they are looking for with a plain document used as a map:
//!
//! ```ignore
//! let filters = doc! { "name": "ann", "age": 30 };
//! ```
//!
//! [`compile`] turns it into an AND of one condition per entry:
//!
//! - the reserved [`CURSOR_KEY`] becomes `_id > cursor`, the keyset pagination condition;
//! - a string value becomes a case-insensitive "contains" match. The string is a pattern
//!   fragment and is not escaped, so characters such as `.` or `*` keep their pattern meaning;
//! - any other value becomes an exact equality.

use std::collections::BTreeMap;

use bson::{Bson, Document};

use crate::{
    error::RepositoryResult,
    id::{ID_KEY, parse_id},
    query::{Expr, Filter},
};

/// Reserved filter key carrying a keyset pagination cursor.
pub const CURSOR_KEY: &str = "__after_id";

/// Alternative values per field, accepted by query operations but not applied.
pub type OrFilters = BTreeMap<String, Vec<Bson>>;

/// Compiles a filter map into a conjunction of per-field conditions.
///
/// An empty map compiles to the empty conjunction, which matches every document.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidCursor`](crate::error::RepositoryError::InvalidCursor) if
/// the value under [`CURSOR_KEY`] is not an identifier.
pub fn compile(filters: &Document) -> RepositoryResult<Expr> {
    filters
        .iter()
        .map(|(field, value)| condition(field, value))
        .collect::<RepositoryResult<Vec<_>>>()
        .map(Expr::And)
}

fn condition(field: &str, value: &Bson) -> RepositoryResult<Expr> {
    if field == CURSOR_KEY {
        return Ok(Filter::gt(ID_KEY, parse_id(value)?));
    }

    Ok(match value {
        Bson::String(fragment) => Filter::contains(field, fragment.as_str()),
        other => Filter::eq(field, other.clone()),
    })
}

#[cfg(test)]
mod tests {
    use bson::{doc, oid::ObjectId};

    use super::*;
    use crate::{error::RepositoryError, query::FieldOp};

    #[test]
    fn empty_map_matches_everything() {
        let expr = compile(&Document::new()).unwrap();

        assert_eq!(expr, Expr::And(vec![]));
        assert!(expr.matches_all());
    }

    #[test]
    fn one_condition_per_entry_in_map_order() {
        let id = ObjectId::new();
        let expr = compile(&doc! {
            "name": "Ann",
            "age": 30,
            "active": true,
            CURSOR_KEY: id,
        })
        .unwrap();

        assert_eq!(
            expr,
            Expr::And(vec![
                Expr::field("name".into(), FieldOp::Contains, Bson::String("Ann".into())),
                Expr::field("age".into(), FieldOp::Eq, Bson::Int32(30)),
                Expr::field("active".into(), FieldOp::Eq, Bson::Boolean(true)),
                Expr::field("_id".into(), FieldOp::Gt, Bson::ObjectId(id)),
            ])
        );
    }

    #[test]
    fn string_fragment_is_not_escaped() {
        let expr = compile(&doc! { "email": "a.b+" }).unwrap();

        assert_eq!(
            expr,
            Expr::And(vec![Expr::field(
                "email".into(),
                FieldOp::Contains,
                Bson::String("a.b+".into())
            )])
        );
    }

    #[test]
    fn cursor_accepts_hex_form() {
        let id = ObjectId::new();
        let expr = compile(&doc! { CURSOR_KEY: id.to_hex() }).unwrap();

        assert_eq!(expr, Expr::And(vec![Filter::gt("_id", id)]));
    }

    #[test]
    fn unparsable_cursor_is_a_caller_error() {
        let err = compile(&doc! { CURSOR_KEY: "page-two" }).unwrap_err();

        assert!(matches!(err, RepositoryError::InvalidCursor(_)));
        assert!(err.is_caller_error());
    }
}
