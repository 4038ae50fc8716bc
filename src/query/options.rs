use crate::store::{FindOptions, Predicate, Sort};

/// Caller-supplied refinements layered on top of a query's base predicate.
///
/// Defaults: no extra filter, every attribute, store natural order,
/// no skip, no limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// AND-merged with the base predicate.
    pub filter: Predicate,
    /// Attribute keys to keep; `None` keeps all.
    pub projection: Option<Vec<String>>,
    /// Result ordering; `None` uses the store's natural order.
    pub sort: Option<Sort>,
    /// Records to drop from the front.
    pub skip: usize,
    /// Maximum number of records.
    pub limit: Option<usize>,
}

impl QueryOptions {
    /// Options with nothing layered on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extra filter.
    pub fn with_filter(mut self, filter: Predicate) -> Self {
        self.filter = filter;
        self
    }

    /// Keep only these attribute keys.
    pub fn with_projection<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.projection = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Order the result.
    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Drop the first `skip` records.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Return at most `limit` records.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Merge the caller filter into `base`.
    pub(crate) fn predicate(&self, base: Predicate) -> Predicate {
        base.and(&self.filter)
    }

    pub(crate) fn find_options(&self) -> FindOptions {
        FindOptions {
            projection: self.projection.clone(),
            sort: self.sort,
            skip: self.skip,
            limit: self.limit,
        }
    }
}
