//! Version vector: per-client monotonic counters.

use super::ClientId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Causal relationship between two version vectors.
///
/// Read as "left is ... of right", e.g. `a.compare(&b) == Ancestor` means `a`
/// happened before `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Causality {
    /// Identical histories
    Equal,
    /// Left precedes right
    Ancestor,
    /// Left already contains right
    Descendant,
    /// Concurrent edits; neither contains the other
    Conflict,
}

/// A mapping from client identity to a non-negative counter.
///
/// Keys exist only for clients that mutated the graph locally or whose edits
/// were merged in. Absent keys read as zero. Entries are never decremented.
///
/// All operations are pure: they return a new vector and leave `self` alone.
/// Entries are kept in a `BTreeMap` so serialized snapshots are byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionVector {
    entries: BTreeMap<String, u64>,
}

impl VersionVector {
    /// Vector for a brand-new graph: a single entry for `client` at 1.
    pub fn new(client: &ClientId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(client.as_str().to_string(), 1);
        Self { entries }
    }

    /// Vector with no entries at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a vector from explicit `(client, counter)` pairs.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Counter for `client`, zero when absent.
    #[inline]
    pub fn get(&self, client: &ClientId) -> u64 {
        self.entries.get(client.as_str()).copied().unwrap_or(0)
    }

    /// Copy of this vector with `client`'s entry advanced by one.
    pub fn incremented(&self, client: &ClientId) -> Self {
        let mut entries = self.entries.clone();
        *entries.entry(client.as_str().to_string()).or_insert(0) += 1;
        Self { entries }
    }

    /// Entry-wise maximum over the union of keys.
    ///
    /// Commutative, associative and idempotent.
    pub fn merged(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (client, &theirs) in &other.entries {
            let ours = entries.entry(client.clone()).or_insert(0);
            *ours = (*ours).max(theirs);
        }
        Self { entries }
    }

    /// Classify the causal relationship of `self` to `other`.
    ///
    /// Single pass over the union of keys, noting whether any entry is behind
    /// and whether any entry is ahead.
    pub fn compare(&self, other: &Self) -> Causality {
        let mut behind = false;
        let mut ahead = false;

        let keys = self.entries.keys().chain(other.entries.keys());
        for key in keys {
            let ours = self.entries.get(key).copied().unwrap_or(0);
            let theirs = other.entries.get(key).copied().unwrap_or(0);
            if ours < theirs {
                behind = true;
            } else if ours > theirs {
                ahead = true;
            }
            if behind && ahead {
                return Causality::Conflict;
            }
        }

        match (behind, ahead) {
            (true, false) => Causality::Ancestor,
            (false, true) => Causality::Descendant,
            (false, false) => Causality::Equal,
            (true, true) => Causality::Conflict,
        }
    }

    /// True when `self` strictly contains `other`.
    pub fn dominates(&self, other: &Self) -> bool {
        self.compare(other) == Causality::Descendant
    }

    /// True when neither vector contains the other.
    pub fn is_concurrent_with(&self, other: &Self) -> bool {
        self.compare(other) == Causality::Conflict
    }

    /// Iterate over `(client, counter)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of clients tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no client is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for VersionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (client, counter)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", client, counter)?;
        }
        write!(f, "}}")
    }
}
