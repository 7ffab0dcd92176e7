// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable record contract shared by the pipelines and the stores

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A record kept in a durable store
///
/// Stores assign the id on append; records built by callers start with an
/// empty id.
pub trait Record: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Name of the collection this record lives in (file name, table name)
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Result ordering, by insertion sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    OldestFirst,
    NewestFirst,
}

type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Filter, order and limit for a store lookup
pub struct Query<R> {
    predicate: Option<Predicate<R>>,
    order: Order,
    limit: Option<usize>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            order: self.order,
            limit: self.limit,
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filtered", &self.predicate.is_some())
            .field("order", &self.order)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<R> Default for Query<R> {
    fn default() -> Self {
        Self::all()
    }
}

impl<R> Query<R> {
    /// Every record, oldest first
    pub fn all() -> Self {
        Self {
            predicate: None,
            order: Order::OldestFirst,
            limit: None,
        }
    }

    /// Only records matching `predicate`
    pub fn matching(predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
            ..Self::all()
        }
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &R) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(record))
    }

    /// Apply the query to records given in insertion order
    pub fn select<'a, I>(&self, records: I) -> Vec<R>
    where
        I: DoubleEndedIterator<Item = &'a R>,
        R: Clone + 'a,
    {
        let limit = self.limit.unwrap_or(usize::MAX);
        match self.order {
            Order::OldestFirst => records
                .filter(|r| self.matches(r))
                .take(limit)
                .cloned()
                .collect(),
            Order::NewestFirst => records
                .rev()
                .filter(|r| self.matches(r))
                .take(limit)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
