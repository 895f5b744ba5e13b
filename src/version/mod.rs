//! Causal versioning for graph states.
//!
//! Two copies of a graph can evolve independently (on two devices, or against a
//! stale cached copy). Each copy carries a [`VersionVector`]: one counter per
//! client that ever mutated it. Comparing two vectors tells the engine, without
//! looking at any content, whether one copy causally precedes the other.
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | [`Causality::Equal`] | Same history |
//! | [`Causality::Ancestor`] | Left side precedes right side |
//! | [`Causality::Descendant`] | Left side already contains right side |
//! | [`Causality::Conflict`] | Concurrent edits, no order exists |
//!
//! # Examples
//!
//! ```
//! use flowstate::version::{Causality, ClientId, VersionVector};
//!
//! let a = ClientId::new("A");
//! let b = ClientId::new("B");
//!
//! let base = VersionVector::new(&a);
//! let left = base.incremented(&a);
//! let right = base.incremented(&b);
//!
//! assert_eq!(base.compare(&left), Causality::Ancestor);
//! assert_eq!(left.compare(&right), Causality::Conflict);
//!
//! let merged = left.merged(&right);
//! assert_eq!(merged.get(&a), 2);
//! assert_eq!(merged.get(&b), 1);
//! ```

mod client_id;
mod vector;

pub use client_id::ClientId;
pub use vector::{Causality, VersionVector};
