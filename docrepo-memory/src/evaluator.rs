//! Query expression evaluation for in-memory document filtering.
//!
//! This module evaluates query expressions against stored BSON documents and orders documents
//! in the order a sort asks for.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use regex::{Regex, RegexBuilder};

use docrepo_core::{
    error::{RepositoryError, RepositoryResult},
    query::{Expr, FieldOp, QueryVisitor},
};

/// Comparable view of a BSON value.
///
/// `Int32` and `Int64` share one integer variant and compare exactly, so `30` and `30i64` are
/// equal and distinct integers above 2^53 stay distinct. Only a comparison against a double goes
/// through `f64`, which makes `30` and `30.0` equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or missing value
    Null,
    /// Integer value
    Integer(i64),
    /// Floating point value
    Double(f64),
    /// String value
    String(&'a str),
    /// Embedded document
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Object id
    ObjectId(ObjectId),
    /// Boolean value
    Bool(bool),
    /// DateTime value
    DateTime(DateTime),
    /// Any other BSON type, never equal to anything
    Opaque,
}

impl<'a> Comparable<'a> {
    /// Position of the value's type in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Integer(_) | Comparable::Double(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::ObjectId(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
            Comparable::Opaque => 8,
        }
    }

    /// Total order used for sorting: values of one type by value, different types by rank.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Integer(i64::from(*value)),
            Bson::Int64(value) => Comparable::Integer(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Opaque,
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Integer(_) | Comparable::Double(_), Comparable::Integer(_) | Comparable::Double(_)) => {
                self.partial_cmp(other) == Some(Ordering::Equal)
            },
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Integer(b)) => a.partial_cmp(b),
            (Comparable::Integer(a), Comparable::Double(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Double(a), Comparable::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::Double(a), Comparable::Double(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Looks a field up by name, following dots into embedded documents.
pub(crate) fn lookup<'a>(document: &'a Document, field: &str) -> Option<&'a Bson> {
    let mut segments = field.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Sort key of a document for the given field, `Null` when the field is missing.
pub(crate) fn sort_key<'a>(document: &'a Document, field: &str) -> Comparable<'a> {
    lookup(document, field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null)
}

/// Compiled "contains" patterns, keyed by the caller's fragment.
pub(crate) type PatternCache = HashMap<String, Regex>;

pub(crate) struct DocumentEvaluator<'d, 'p> {
    document: &'d Document,
    patterns: &'p mut PatternCache,
}

impl<'d, 'p> DocumentEvaluator<'d, 'p> {
    pub fn new(document: &'d Document, patterns: &'p mut PatternCache) -> Self {
        Self { document, patterns }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> RepositoryResult<bool> {
        self.visit_expr(expr)
    }

    /// Keeps the documents matching `expr`, in iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidFilter`] if a "contains" fragment is not a valid
    /// pattern.
    pub fn filter_documents<'a>(
        documents: impl IntoIterator<Item = &'a Document>,
        expr: &Expr,
    ) -> RepositoryResult<Vec<&'a Document>> {
        let mut patterns = PatternCache::new();
        let mut matched = Vec::new();

        for document in documents {
            if DocumentEvaluator::new(document, &mut patterns).evaluate(expr)? {
                matched.push(document);
            }
        }

        Ok(matched)
    }

    fn pattern(&mut self, fragment: &str) -> RepositoryResult<&Regex> {
        if !self.patterns.contains_key(fragment) {
            let regex = RegexBuilder::new(fragment)
                .case_insensitive(true)
                .build()
                .map_err(|e| RepositoryError::InvalidFilter(format!("{fragment:?}: {e}")))?;
            self.patterns.insert(fragment.to_string(), regex);
        }

        Ok(&self.patterns[fragment])
    }

    /// Applies one comparison to a single stored value.
    fn compare(&mut self, stored: &Bson, op: FieldOp, value: &Bson) -> RepositoryResult<bool> {
        match (op, stored, value) {
            (FieldOp::Eq, _, _) => Ok(Comparable::from(stored) == Comparable::from(value)),
            (FieldOp::Gt, _, _) => Ok(
                Comparable::from(stored).partial_cmp(&Comparable::from(value)) == Some(Ordering::Greater)
            ),
            (FieldOp::Contains, Bson::String(text), Bson::String(fragment)) => {
                Ok(self.pattern(fragment)?.is_match(text))
            },
            (FieldOp::Contains, _, Bson::String(fragment)) => {
                // Validate the fragment even when this value cannot match.
                self.pattern(fragment)?;
                Ok(false)
            },
            (FieldOp::Contains, _, _) => Ok(false),
        }
    }
}

impl<'d, 'p> QueryVisitor for DocumentEvaluator<'d, 'p> {
    type Output = bool;
    type Error = RepositoryError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = lookup(self.document, field) else {
            return Ok(matches!(op, FieldOp::Eq) && matches!(value, Bson::Null));
        };

        if matches!(op, FieldOp::Contains) && !matches!(value, Bson::String(_)) {
            return Err(RepositoryError::InvalidFilter(format!(
                "contains on `{field}` requires a string fragment",
            )));
        }

        // Array fields match on the whole array or on any one element.
        if let Bson::Array(items) = field_value {
            if self.compare(field_value, op, value)? {
                return Ok(true);
            }
            for item in items {
                if self.compare(item, op, value)? {
                    return Ok(true);
                }
            }

            return Ok(false);
        }

        self.compare(field_value, op, value)
    }
}
