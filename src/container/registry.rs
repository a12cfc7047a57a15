//! Address-keyed dependency container.
//!
//! # Responsibilities
//! - Register entries under unique addresses (append-only)
//! - Build fresh instances (`make`) with merged, resolved parameters
//! - Memoize singletons (`invoke`), at most one construction per address
//!
//! # Design Decisions
//! - `DashMap` for entries: check-and-insert is atomic per address
//! - Singletons live in per-address slots; the map guard is dropped before
//!   construction, the slot lock is held across it
//! - Cycle detection happens before a slot is locked, so a cycle fails
//!   instead of deadlocking

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::container::entry::{downcast, Args, DependencyMap, Entry, Instance, Param, Params, Source};
use crate::container::error::{ContainerError, ContainerResult};
use crate::container::resolver::{ResolutionStack, Resolver};

type SingletonSlot = Arc<Mutex<Option<Instance>>>;

/// Dependency container.
#[derive(Default)]
pub struct Container {
    entries: DashMap<String, Arc<Entry>>,
    singletons: DashMap<String, SingletonSlot>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a container pre-populated from a dependency map.
    pub fn with_dependencies(dependencies: DependencyMap) -> ContainerResult<Self> {
        let container = Self::new();
        container.set_batch(dependencies)?;
        Ok(container)
    }

    /// Register one entry.
    pub fn set(&self, address: impl Into<String>, entry: Entry) -> ContainerResult<()> {
        let address = address.into();
        if address.is_empty() {
            return Err(ContainerError::MissingAddress);
        }

        match self.entries.entry(address) {
            MapEntry::Occupied(occupied) => Err(ContainerError::DuplicateAddress(occupied.key().clone())),
            MapEntry::Vacant(vacant) => {
                entry.validate(vacant.key())?;
                tracing::debug!(
                    address = %vacant.key(),
                    source = entry.source().map(|s| s.type_name()).unwrap_or("?"),
                    "Dependency registered"
                );
                vacant.insert(Arc::new(entry));
                Ok(())
            }
        }
    }

    /// Register entries in order. Stops at the first failure; entries
    /// registered before it stay registered.
    pub fn set_batch(&self, dependencies: DependencyMap) -> ContainerResult<()> {
        for (address, entry) in dependencies {
            self.set(address, entry)?;
        }
        Ok(())
    }

    /// Registered entry at `address`.
    pub fn get(&self, address: &str) -> ContainerResult<Arc<Entry>> {
        if address.is_empty() {
            return Err(ContainerError::MissingAddress);
        }
        self.entries
            .get(address)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ContainerError::UnknownAddress(address.to_string()))
    }

    /// Raw source registered at `address`.
    pub fn from(&self, address: &str) -> ContainerResult<Arc<Source>> {
        let entry = self.get(address)?;
        entry.source().cloned().ok_or_else(|| ContainerError::InvalidEntry {
            address: address.to_string(),
            reason: "no source".to_string(),
        })
    }

    pub fn contains(&self, address: &str) -> bool {
        self.entries.contains_key(address)
    }

    /// Number of registered addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered addresses, sorted.
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        addresses.sort();
        addresses
    }

    /// Build a new instance of `address`, with `overrides` merged over the
    /// entry's default parameters.
    pub fn make(&self, address: &str, overrides: Params) -> ContainerResult<Instance> {
        let stack = ResolutionStack::new();
        self.make_in(address, overrides, &stack)
    }

    /// Singleton at `address`, built on first use.
    pub fn invoke(&self, address: &str) -> ContainerResult<Instance> {
        let stack = ResolutionStack::new();
        self.invoke_in(address, &stack)
    }

    pub fn make_as<T: Any + Send + Sync>(&self, address: &str, overrides: Params) -> ContainerResult<Arc<T>> {
        downcast(address, self.make(address, overrides)?)
    }

    pub fn invoke_as<T: Any + Send + Sync>(&self, address: &str) -> ContainerResult<Arc<T>> {
        downcast(address, self.invoke(address)?)
    }

    pub(crate) fn make_in(&self, address: &str, overrides: Params, stack: &ResolutionStack) -> ContainerResult<Instance> {
        let entry = self.get(address)?;
        stack.enter(address)?;
        let built = self.build(address, &entry, &overrides, stack);
        stack.leave();
        built
    }

    pub(crate) fn invoke_in(&self, address: &str, stack: &ResolutionStack) -> ContainerResult<Instance> {
        if address.is_empty() {
            return Err(ContainerError::MissingAddress);
        }
        if !self.entries.contains_key(address) {
            return Err(ContainerError::UnknownAddress(address.to_string()));
        }
        stack.check(address)?;

        let slot = Arc::clone(self.singletons.entry(address.to_string()).or_default().value());
        let mut cached = slot.lock();
        if let Some(instance) = cached.as_ref() {
            return Ok(Arc::clone(instance));
        }

        let instance = self.make_in(address, Params::new(), stack)?;
        *cached = Some(Arc::clone(&instance));
        tracing::debug!(address, "Singleton constructed");
        Ok(instance)
    }

    fn build(&self, address: &str, entry: &Entry, overrides: &Params, stack: &ResolutionStack) -> ContainerResult<Instance> {
        let source = entry.source().ok_or_else(|| ContainerError::InvalidEntry {
            address: address.to_string(),
            reason: "no source".to_string(),
        })?;
        let merged = overrides.merged_over(entry.default_params(), address)?;
        let resolver = Resolver::new(self, stack);

        let mut resolved = HashMap::with_capacity(merged.len());
        for (name, param) in merged {
            let value = match param {
                Param::Literal(value) => value,
                Param::Resolved(f) => f(&resolver)?,
            };
            resolved.insert(name, value);
        }

        let args = Args::project(address, source.params(), resolved);
        tracing::trace!(address, depth = stack.depth(), "Building dependency");
        source.instantiate(&resolver, &args)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("entries", &self.entries.len())
            .field("singletons", &self.singletons.len())
            .finish()
    }
}
