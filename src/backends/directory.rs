//! Backend directory.
//!
//! # Responsibilities
//! - Hold the current backend name → address map
//! - Hand the monitor a fresh target snapshot every cycle
//! - Report which backends a config reload registered or removed

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::BackendConfig;
use crate::health::TargetSource;

/// Differences between two backend sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendChanges {
    pub registered: Vec<String>,
    pub unregistered: Vec<String>,
    /// Backends whose address changed under the same name.
    pub moved: Vec<String>,
}

impl BackendChanges {
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty() && self.unregistered.is_empty() && self.moved.is_empty()
    }
}

/// Lock-free view of the registered backends.
#[derive(Debug)]
pub struct BackendDirectory {
    current: ArcSwap<BTreeMap<String, String>>,
}

impl BackendDirectory {
    /// Create a directory from configuration.
    pub fn new(configs: &[BackendConfig]) -> Self {
        Self {
            current: ArcSwap::from_pointee(to_map(configs)),
        }
    }

    /// Address of the backend registered as `name`.
    pub fn address_of(&self, name: &str) -> Option<String> {
        self.current.load().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.current.load().contains_key(name)
    }

    /// Sorted names of all registered backends.
    pub fn names(&self) -> Vec<String> {
        self.current.load().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Atomically swap in a new backend set and describe what changed.
    pub fn replace(&self, configs: &[BackendConfig]) -> BackendChanges {
        let next = Arc::new(to_map(configs));
        let previous = self.current.swap(Arc::clone(&next));

        let mut changes = BackendChanges::default();
        for (name, address) in next.iter() {
            match previous.get(name) {
                None => changes.registered.push(name.clone()),
                Some(old) if old != address => changes.moved.push(name.clone()),
                Some(_) => {}
            }
        }
        changes.unregistered = previous
            .keys()
            .filter(|name| !next.contains_key(*name))
            .cloned()
            .collect();

        if !changes.is_empty() {
            tracing::info!(
                registered = ?changes.registered,
                unregistered = ?changes.unregistered,
                moved = ?changes.moved,
                "Backend set updated"
            );
        }
        changes
    }
}

impl TargetSource for BackendDirectory {
    fn snapshot(&self) -> Vec<String> {
        self.names()
    }
}

fn to_map(configs: &[BackendConfig]) -> BTreeMap<String, String> {
    configs
        .iter()
        .map(|c| (c.name.clone(), c.address.clone()))
        .collect()
}
