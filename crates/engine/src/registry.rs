//! Binding registry
//!
//! Caches `name -> Address` bindings produced by signature scans,
//! `module!symbol -> Address` bindings produced by export lookups and
//! `module:version -> Address` bindings produced by interface factories.
//! Each kind has its own map, so a signature may share a name with an
//! export or interface key.
//!
//! # Lifecycle
//!
//! A registry lives as long as the context that owns it, which in an attached
//! build is the whole process. Entries are created on the first successful
//! resolution and never evicted: host modules do not unload while a tool is
//! attached. A cached address can still go stale if the host patches itself
//! at runtime; that is not detectable here.
//!
//! # Concurrency
//!
//! Reads go through a sharded concurrent map. Resolution closures run outside
//! any lock, so two threads may resolve the same name at once; the first
//! insert wins and every caller gets the stored value back. Failed or null
//! resolutions are never stored, so the next call tries again.

use dashmap::DashMap;
use tracing::{debug, trace};

use srcsdk_sdk::Address;

/// Process-lifetime cache of resolved addresses
#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: DashMap<String, Address>,
    exports: DashMap<String, Address>,
    interfaces: DashMap<String, Address>,
}

impl BindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached binding
    pub fn get(&self, name: &str) -> Option<Address> {
        self.bindings.get(name).map(|entry| *entry)
    }

    /// Get a cached binding, resolving and caching it on a miss
    ///
    /// `resolve` is only called when nothing is cached. A `None` or null
    /// result is returned as `None` and not cached.
    pub fn get_or_resolve<F>(&self, name: &str, resolve: F) -> Option<Address>
    where
        F: FnOnce() -> Option<Address>,
    {
        self.try_get_or_resolve(name, || resolve().ok_or(()))
            .ok()
            .and_then(Address::non_null)
    }

    /// Fallible variant of [`BindingRegistry::get_or_resolve`]
    ///
    /// A null `Ok` address is treated like a miss: it is returned but not
    /// cached.
    pub fn try_get_or_resolve<E, F>(&self, name: &str, resolve: F) -> Result<Address, E>
    where
        F: FnOnce() -> Result<Address, E>,
    {
        resolve_in(&self.bindings, "binding", name, resolve)
    }

    /// Store a binding that was resolved elsewhere
    ///
    /// Returns the value now cached for `name`. An existing entry is never
    /// replaced, and null addresses are ignored.
    pub fn bind(&self, name: &str, address: Address) -> Option<Address> {
        store_in(&self.bindings, "binding", name, address)
    }

    /// Get a cached export address
    pub fn export(&self, key: &str) -> Option<Address> {
        self.exports.get(key).map(|entry| *entry)
    }

    /// Get a cached export address, resolving and caching it on a miss
    pub fn try_export_or_resolve<E, F>(&self, key: &str, resolve: F) -> Result<Address, E>
    where
        F: FnOnce() -> Result<Address, E>,
    {
        resolve_in(&self.exports, "export", key, resolve)
    }

    /// Get a cached interface pointer
    pub fn interface(&self, key: &str) -> Option<Address> {
        self.interfaces.get(key).map(|entry| *entry)
    }

    /// Get a cached interface pointer, resolving and caching it on a miss
    pub fn try_interface_or_resolve<E, F>(&self, key: &str, resolve: F) -> Result<Address, E>
    where
        F: FnOnce() -> Result<Address, E>,
    {
        resolve_in(&self.interfaces, "interface", key, resolve)
    }

    /// Store an interface pointer that was obtained elsewhere
    pub fn bind_interface(&self, key: &str, address: Address) -> Option<Address> {
        store_in(&self.interfaces, "interface", key, address)
    }

    /// Number of cached signature bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check whether no signature bindings are cached
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Number of cached export addresses
    pub fn export_count(&self) -> usize {
        self.exports.len()
    }

    /// Number of cached interface pointers
    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    /// Copy of every cached signature binding, sorted by name
    pub fn bindings(&self) -> Vec<(String, Address)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        all.sort();
        all
    }
}

/// Key for the export cache
pub fn export_key(module: &str, symbol: &str) -> String {
    format!("{}!{}", module, symbol)
}

/// Key for the interface cache
pub fn interface_key(module: &str, version: &str) -> String {
    format!("{}:{}", module, version)
}

fn resolve_in<E, F>(
    map: &DashMap<String, Address>,
    kind: &str,
    name: &str,
    resolve: F,
) -> Result<Address, E>
where
    F: FnOnce() -> Result<Address, E>,
{
    if let Some(entry) = map.get(name) {
        trace!("{} cache hit: {} = {}", kind, name, *entry);
        return Ok(*entry);
    }

    let address = resolve()?;
    if address.is_null() {
        return Ok(address);
    }

    Ok(store_in(map, kind, name, address).unwrap_or(address))
}

fn store_in(
    map: &DashMap<String, Address>,
    kind: &str,
    name: &str,
    address: Address,
) -> Option<Address> {
    if address.is_null() {
        return None;
    }

    let stored = *map.entry(name.to_string()).or_insert_with(|| {
        debug!("{} cached: {} = {}", kind, name, address);
        address
    });

    if stored != address {
        debug!(
            "{} {} already bound to {}, keeping it over {}",
            kind, name, stored, address
        );
    }

    Some(stored)
}
