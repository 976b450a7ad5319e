//! Per-channel streamer overrides.
//!
//! Maps to the `streamer_channel_settings` table, keyed by channel ID and
//! owned by a `streamer_settings` row.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, NoInclude};
use crate::domain::value_objects::{ChannelId, GuildId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerChannelSettings {
    pub channel_id: ChannelId,

    pub guild_id: GuildId,

    /// Delete the announcement once the stream ends.
    pub remove_message: bool,
}

impl StreamerChannelSettings {
    pub fn new(channel_id: ChannelId, guild_id: GuildId) -> Self {
        Self {
            channel_id,
            guild_id,
            remove_message: false,
        }
    }
}

impl Entity for StreamerChannelSettings {
    type Key = ChannelId;
    type Include = NoInclude;

    const KIND: &'static str = "StreamerChannelSettings";

    fn key(&self) -> ChannelId {
        self.channel_id
    }
}
