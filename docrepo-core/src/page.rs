//! Keyset pagination requests.
//!
//! A [`PageRequest`] describes one page: its number, its size, the last entity of the previous
//! page and an optional sort. Pages after the first start strictly after the identifier of that
//! last entity rather than at a numeric offset, so rows inserted or deleted elsewhere between two
//! requests never shift a page boundary.
//!
//! ```ignore
//! use docrepo::page::PageRequest;
//!
//! let first = repository.paginate(&PageRequest::new(0, 10), &doc! {}, &OrFilters::new()).await?;
//! let next = PageRequest::builder()
//!     .with_page(1)
//!     .with_page_size(10)
//!     .with_last_entity(first.last())
//!     .build();
//! let second = repository.paginate(&next, &doc! {}, &OrFilters::new()).await?;
//! ```

use crate::{
    id::ID_KEY,
    query::{Sort, SortDirection},
};

/// Number of entities returned per page when no size is given.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Parameters of a keyset-paginated query.
///
/// Pages are 0-indexed. The last entity is only used as a cursor for `page > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest<'a, E> {
    /// The page number, starting at 0.
    pub page: usize,
    /// Maximum number of entities in the page.
    pub page_size: usize,
    /// Last entity of the previous page, if any.
    pub last_entity: Option<&'a E>,
    /// Field to sort by; empty sorts by identifier.
    pub sort_field: String,
    /// Direction applied to `sort_field`. The identifier default is always ascending.
    pub ascending: bool,
}

impl<'a, E> PageRequest<'a, E> {
    /// Creates a request for the given page, sorted by ascending identifier, with no cursor.
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            last_entity: None,
            sort_field: String::new(),
            ascending: true,
        }
    }

    /// Creates a new builder for a page request.
    pub fn builder() -> PageRequestBuilder<'a, E> {
        PageRequestBuilder::new()
    }

    /// Returns the entity whose identifier the page must start after, if any.
    pub fn cursor(&self) -> Option<&'a E> {
        if self.page > 0 { self.last_entity } else { None }
    }

    /// Returns the sort the page is ordered by.
    pub fn sort(&self) -> Sort {
        if self.sort_field.is_empty() {
            return Sort { field: ID_KEY.to_string(), direction: SortDirection::Asc };
        }

        Sort {
            field: self.sort_field.clone(),
            direction: if self.ascending { SortDirection::Asc } else { SortDirection::Desc },
        }
    }
}

/// Builder for [`PageRequest`]. Unset values default to page 0, [`DEFAULT_PAGE_SIZE`], no
/// cursor and identifier order.
pub struct PageRequestBuilder<'a, E> {
    request: PageRequest<'a, E>,
}

impl<'a, E> PageRequestBuilder<'a, E> {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { request: PageRequest::new(0, DEFAULT_PAGE_SIZE) }
    }

    /// Sets the page number.
    pub fn with_page(mut self, page: usize) -> Self {
        self.request.page = page;
        self
    }

    /// Sets the number of entities per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.request.page_size = page_size;
        self
    }

    /// Sets the last entity of the previous page.
    pub fn with_last_entity(mut self, last_entity: Option<&'a E>) -> Self {
        self.request.last_entity = last_entity;
        self
    }

    /// Sorts by the given field in the given direction.
    pub fn with_sort(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.request.sort_field = field.into();
        self.request.ascending = ascending;
        self
    }

    /// Builds and returns the [`PageRequest`].
    pub fn build(self) -> PageRequest<'a, E> {
        self.request
    }
}

impl<'a, E> Default for PageRequestBuilder<'a, E> {
    fn default() -> Self {
        Self::new()
    }
}
