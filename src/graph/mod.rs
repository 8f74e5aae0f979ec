//! Dependency graph - transitive closure of declared relations and its inverse
//!
//! `expand` turns the declared symbols into a [`DependencyGraph`] (what each
//! symbol depends on, directly or transitively). `generate` inverts it into a
//! [`DependentsIndex`] (who depends on each symbol), the unit the cache
//! persists.

pub mod dependents;
pub mod expansion;

pub use dependents::{generate, DependentsIndex};
pub use expansion::{expand, DependencyGraph};
