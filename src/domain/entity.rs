//! Entity and configuration-kind descriptors.
//!
//! Generic services are parameterized over these traits instead of
//! inspecting types at runtime: the cache namespace of a kind is its
//! explicit [`Entity::KIND`] name, and eager-load selectors are plain
//! [`Navigation`] values.

use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::value_objects::GuildId;

/// A navigation path that can be eagerly loaded alongside its owner.
pub trait Navigation: Copy + Debug + Eq + Send + Sync + 'static {
    /// Stable name of the path. Part of the settings cache key.
    fn path(&self) -> &'static str;
}

/// Include type for entities without navigations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoInclude {}

impl Navigation for NoInclude {
    fn path(&self) -> &'static str {
        match *self {}
    }
}

/// A persisted entity type.
pub trait Entity: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key.
    type Key: Clone + Debug + Eq + Hash + Send + Sync + 'static;

    /// Navigations that callers may ask to materialize.
    type Include: Navigation;

    /// Kind name, e.g. `"StreamerSettings"`.
    const KIND: &'static str;

    fn key(&self) -> Self::Key;

    /// Materialize exactly the requested navigations and unload the rest.
    fn restrict_to(&mut self, _includes: &[Self::Include]) {}
}

/// Per-guild module configuration. One row exists per (guild, kind).
pub trait ModuleSettings: Entity<Key = GuildId> {
    fn guild_id(&self) -> GuildId;

    fn enabled(&self) -> bool;

    /// Overwrite this row's values with `incoming`.
    ///
    /// Scalars are always copied. Navigation collections are only replaced
    /// when `incoming` has them loaded.
    fn merge_from(&mut self, incoming: &Self);
}

/// Join the include paths in call order.
pub fn include_paths<I: Navigation>(includes: &[I]) -> Vec<&'static str> {
    includes.iter().map(Navigation::path).collect()
}
