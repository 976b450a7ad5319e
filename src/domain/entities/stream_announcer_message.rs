//! Announcement messages posted by the streamer module.
//!
//! Maps to the `stream_announcer_messages` table. `id` is assigned by the
//! store on insert; a value of `0` means "not yet persisted".

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, NoInclude};
use crate::domain::value_objects::{ChannelId, GuildId, MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAnnouncerMessage {
    pub id: i32,

    /// Member whose stream was announced.
    pub user_id: UserId,

    pub message_id: MessageId,

    pub channel_id: ChannelId,

    pub guild_id: GuildId,
}

impl StreamAnnouncerMessage {
    pub fn new(user_id: UserId, message_id: MessageId, channel_id: ChannelId, guild_id: GuildId) -> Self {
        Self {
            id: 0,
            user_id,
            message_id,
            channel_id,
            guild_id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }
}

impl Entity for StreamAnnouncerMessage {
    type Key = i32;
    type Include = NoInclude;

    const KIND: &'static str = "StreamAnnouncerMessage";

    fn key(&self) -> i32 {
        self.id
    }
}
