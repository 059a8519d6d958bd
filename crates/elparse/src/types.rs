//! Deterministic collection types used throughout table construction.

use std::hash::BuildHasherDefault;

type BuildHasher = BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered hash map. Iteration order determines state numbering
/// and conflict resolution.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
