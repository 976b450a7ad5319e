//! # Domain Entities
//!
//! Module configuration and the sub-objects it owns. All entities map
//! directly to their corresponding database tables.
//!
//! - **StreamerSettings**: per-guild configuration of the streamer module
//! - **StreamerChannelSettings**: per-channel override owned by the settings
//! - **StreamAnnouncerMessage**: announcement posted for a live member
//! - **WhiteListedRole**: role eligible for announcements

mod stream_announcer_message;
mod streamer_channel_settings;
mod streamer_settings;
mod white_listed_role;

pub use stream_announcer_message::StreamAnnouncerMessage;
pub use streamer_channel_settings::StreamerChannelSettings;
pub use streamer_settings::{StreamerSettings, StreamerSettingsInclude};
pub use white_listed_role::WhiteListedRole;
