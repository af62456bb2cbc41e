//! Tracks the live chart instance for each on-page target.

use std::collections::BTreeMap;

/// A mapping from target identifier to the handle of the chart drawn there.
///
/// There is at most one handle per target. [ChartRegistry::acquire] hands back
/// whatever it displaced so the caller can release the underlying resources.
#[derive(Debug)]
pub struct ChartRegistry<H> {
    instances: BTreeMap<String, H>,
}

impl<H> Default for ChartRegistry<H> {
    fn default() -> Self {
        Self {
            instances: BTreeMap::new(),
        }
    }
}

impl<H> ChartRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `handle` as the live instance for `target`, returning the previous one.
    pub fn acquire(&mut self, target: &str, handle: H) -> Option<H> {
        self.instances.insert(target.to_owned(), handle)
    }

    /// Remove and return the instance for `target`. Releasing an empty target is a no-op.
    pub fn release(&mut self, target: &str) -> Option<H> {
        self.instances.remove(target)
    }

    pub fn get(&self, target: &str) -> Option<&H> {
        self.instances.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.instances.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The occupied targets in sorted order.
    pub fn targets(&self) -> Vec<String> {
        self.instances.keys().cloned().collect()
    }

    /// Remove every instance, returning them in target order.
    pub fn drain(&mut self) -> Vec<(String, H)> {
        std::mem::take(&mut self.instances).into_iter().collect()
    }
}
