//! Dependency Registry
//!
//! Maps each atom to the observers that read it. An atom only gets an entry
//! once some observer reads it; atoms that are never read inside a tracking
//! context cost nothing here.
//!
//! Subscriber sets are insertion-ordered so that per-atom notification
//! follows subscription order.

use indexmap::map::Entry;
use indexmap::IndexMap;

use super::atom::AtomId;
use super::observer::{Observer, ObserverId};

/// Ordered set of observers, keyed by identity.
type ObserverSet = IndexMap<ObserverId, Observer>;

/// Mapping from atom identity to the observers subscribed to it.
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    edges: IndexMap<AtomId, ObserverSet>,
}

impl DependencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `observer` depends on `atom`.
    ///
    /// Returns `true` if the edge is new.
    pub fn subscribe(&mut self, atom: AtomId, observer: &Observer) -> bool {
        match self.edges.entry(atom).or_default().entry(observer.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(observer.clone());
                true
            }
        }
    }

    /// Snapshot of the observers subscribed to `atom`, in subscription order.
    pub fn subscribers(&self, atom: AtomId) -> Vec<Observer> {
        self.edges
            .get(&atom)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of observers subscribed to `atom`.
    pub fn subscriber_count(&self, atom: AtomId) -> usize {
        self.edges.get(&atom).map_or(0, IndexMap::len)
    }

    /// Union of the subscribers of every atom in `atoms`.
    ///
    /// Each observer appears once, at the position of its first occurrence.
    pub fn resolve<'a, I>(&self, atoms: I) -> Vec<Observer>
    where
        I: IntoIterator<Item = &'a AtomId>,
    {
        let mut union = ObserverSet::new();
        for atom in atoms {
            let Some(set) = self.edges.get(atom) else {
                continue;
            };
            for (id, observer) in set {
                union.entry(*id).or_insert_with(|| observer.clone());
            }
        }
        union.into_values().collect()
    }

    /// Remove every edge pointing at `observer`.
    ///
    /// Returns the number of edges removed.
    pub fn forget(&mut self, observer: ObserverId) -> usize {
        let mut removed = 0;
        for set in self.edges.values_mut() {
            if set.shift_remove(&observer).is_some() {
                removed += 1;
            }
        }
        self.edges.retain(|_, set| !set.is_empty());
        removed
    }

    /// Number of atoms with at least one subscriber.
    pub fn atom_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of atom -> observer edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexMap::len).sum()
    }
}
