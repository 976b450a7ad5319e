//! Application Layer
//!
//! Services built on the domain store traits, plus the in-process change
//! notification they publish to.

pub mod events;
pub mod services;

pub use events::{
    EntityChangedDispatcher, EntityChangedEvent, SettingsChangedEvent, Subscribers, SubscriptionId,
};
