//! # Domain Layer
//!
//! Configuration entities, identifiers and the store contracts the services
//! are written against. Nothing here depends on the infrastructure layer.
//!
//! - **entities**: module settings and their owned sub-objects
//! - **value_objects**: Snowflake identifiers
//! - **entity**: kind descriptors (`Entity`, `ModuleSettings`, `Navigation`)
//! - **store**: persistent store traits
//! - **modules**: module metadata

pub mod entities;
pub mod entity;
pub mod modules;
pub mod store;
pub mod value_objects;

pub use entities::*;
pub use entity::{Entity, ModuleSettings, Navigation, NoInclude};
pub use store::{EntityStore, ModuleSettingsStore};
pub use value_objects::*;
