//! # Find Queries
//!
//! The clauses of a single `find` call: filter, sort, projection and the
//! skip/limit window. Clauses are assembled up front and handed to the store
//! once.

use std::cmp::Ordering;

use super::filter::Filter;
use super::value::{get_path, sort_order, Document};

/// Identifier field present on every document
pub const ID_FIELD: &str = "_id";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One key of a multi-key sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Stable multi-key sort; earlier keys take priority.
pub fn sort_documents(documents: &mut [Document], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        for key in keys {
            let ordering = sort_order(get_path(a, &key.field), get_path(b, &key.field));
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Which fields of a document are returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every field
    All,
    /// Only the listed fields; `_id` unless `with_id` is false
    Include { fields: Vec<String>, with_id: bool },
    /// Every field except the listed ones
    Exclude(Vec<String>),
}

impl Projection {
    /// Inclusion allow-list that keeps `_id`
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Include {
            fields: fields.into_iter().map(Into::into).collect(),
            with_id: true,
        }
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Exclude(fields.into_iter().map(Into::into).collect())
    }

    /// Apply to one document
    pub fn apply(&self, doc: Document) -> Document {
        match self {
            Projection::All => doc,
            Projection::Include { fields, with_id } => doc
                .into_iter()
                .filter(|(k, _)| (*with_id && k == ID_FIELD) || fields.iter().any(|f| f == k))
                .collect(),
            Projection::Exclude(fields) => doc
                .into_iter()
                .filter(|(k, _)| !fields.iter().any(|f| f == k))
                .collect(),
        }
    }
}

/// A fully composed find query
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindQuery {
    /// Every document of a collection, unordered, all fields
    pub fn all() -> Self {
        Self {
            filter: Filter::new(),
            sort: Vec::new(),
            projection: Projection::All,
            skip: 0,
            limit: None,
        }
    }

    /// Evaluate against an in-memory set of documents.
    ///
    /// Order of application: filter, sort, skip/limit, projection.
    pub fn execute<'a, I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.filter.matches(doc))
            .cloned()
            .collect();

        sort_documents(&mut matched, &self.sort);

        matched
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .map(|doc| self.projection.apply(doc))
            .collect()
    }
}

impl Default for FindQuery {
    fn default() -> Self {
        Self::all()
    }
}
