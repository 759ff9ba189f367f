//! Networked property tables
//!
//! This module provides:
//! - Borrowed views over the host's receive tables and class list
//! - The recursive walker that turns a field name into an accumulated offset
//! - [`NetvarCache`], the resolved-offset cache owned by [`crate::Sdk`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ Sdk::netvar  │────►│ NetvarCache  │────►│ walker::find_path│
//! │ (table,path) │     │ DashMap<u64> │     │ over TableRef    │
//! └──────────────┘     └──────────────┘     └──────────────────┘
//! ```

pub mod table;
pub mod walker;

#[cfg(test)]
pub(crate) mod fixtures;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::hash::netvar_key;

pub use table::{ClassIter, ClassRef, PropRef, TableRef};
pub use walker::{
    collect_fields, find_class_by_id, find_class_by_name, find_field, find_path, find_table,
    FieldMatch, MAX_DEPTH,
};

/// One resolved lookup, names kept to tell colliding keys apart
#[derive(Debug)]
struct CachedNetvar {
    table: Box<str>,
    path: Box<str>,
    offset: i64,
}

impl CachedNetvar {
    fn is(&self, table: &str, path: &str) -> bool {
        &*self.table == table && &*self.path == path
    }
}

/// Cache of resolved `(table, path) -> offset` lookups
///
/// Entries are bucketed by [`netvar_key`] and matched on the full names, so
/// two paths whose hashes collide never share an offset. Only successes are
/// stored; a miss is retried on the next call.
#[derive(Debug, Default)]
pub struct NetvarCache {
    offsets: DashMap<u64, Vec<CachedNetvar>>,
}

impl NetvarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached offset, if any
    pub fn get(&self, table: &str, path: &str) -> Option<i64> {
        let bucket = self.offsets.get(&netvar_key(table.as_bytes(), path.as_bytes()))?;
        let offset = bucket
            .iter()
            .find(|entry| entry.is(table, path))
            .map(|entry| entry.offset);
        offset
    }

    /// Cached offset, resolving and caching it on a miss
    pub fn try_get_or_resolve<E, F>(&self, table: &str, path: &str, resolve: F) -> Result<i64, E>
    where
        F: FnOnce() -> Result<i64, E>,
    {
        if let Some(offset) = self.get(table, path) {
            trace!("netvar cache hit: {}.{} = {:#x}", table, path, offset);
            return Ok(offset);
        }

        let offset = resolve()?;
        let key = netvar_key(table.as_bytes(), path.as_bytes());
        let mut bucket = self.offsets.entry(key).or_default();
        // A concurrent resolver may have stored the same lookup first
        let stored = match bucket.iter().find(|entry| entry.is(table, path)) {
            Some(existing) => existing.offset,
            None => {
                bucket.push(CachedNetvar {
                    table: table.into(),
                    path: path.into(),
                    offset,
                });
                offset
            }
        };
        debug!("netvar {}.{} = {:#x}", table, path, stored);
        Ok(stored)
    }

    /// Number of cached offsets
    pub fn len(&self) -> usize {
        self.offsets.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.iter().all(|bucket| bucket.is_empty())
    }
}
