//! Streamer module settings.
//!
//! Maps to the `streamer_settings` table:
//! - guild_id: BIGINT PRIMARY KEY (Snowflake ID)
//! - enabled: BOOLEAN NOT NULL
//! - streamer_role_enabled: BOOLEAN NOT NULL
//! - role_id: BIGINT NOT NULL
//!
//! Channel overrides, announced messages and whitelisted roles live in their
//! own tables and are only present when requested through an include.

use serde::{Deserialize, Serialize};

use super::{StreamAnnouncerMessage, StreamerChannelSettings, WhiteListedRole};
use crate::domain::entity::{Entity, ModuleSettings, Navigation};
use crate::domain::value_objects::{ChannelId, GuildId, RoleId};

/// Stream announcement configuration for one guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamerSettings {
    pub guild_id: GuildId,

    pub enabled: bool,

    /// Per-channel announcement overrides. `None` when not loaded.
    pub channel_settings: Option<Vec<StreamerChannelSettings>>,

    /// Announcements already posted, so they can be cleaned up later.
    pub stream_messages: Option<Vec<StreamAnnouncerMessage>>,

    /// Whether members who are live get the streamer role.
    pub streamer_role_enabled: bool,

    /// Role handed to members while they stream.
    pub role_id: RoleId,

    /// Roles allowed to be announced. Empty means everyone.
    pub white_listed_role_ids: Option<Vec<WhiteListedRole>>,
}

impl StreamerSettings {
    pub fn new(guild_id: GuildId, enabled: bool) -> Self {
        Self {
            guild_id,
            enabled,
            ..Self::default()
        }
    }

    /// Channel override for `channel_id`, if loaded and present.
    pub fn channel(&self, channel_id: ChannelId) -> Option<&StreamerChannelSettings> {
        self.channel_settings
            .as_deref()?
            .iter()
            .find(|c| c.channel_id == channel_id)
    }
}

/// Eager-load selectors for [`StreamerSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamerSettingsInclude {
    ChannelSettings,
    StreamMessages,
    WhiteListedRoleIds,
}

impl Navigation for StreamerSettingsInclude {
    fn path(&self) -> &'static str {
        match self {
            StreamerSettingsInclude::ChannelSettings => "channel_settings",
            StreamerSettingsInclude::StreamMessages => "stream_messages",
            StreamerSettingsInclude::WhiteListedRoleIds => "white_listed_role_ids",
        }
    }
}

fn restrict<T>(field: &mut Option<Vec<T>>, loaded: bool) {
    if loaded {
        field.get_or_insert_with(Vec::new);
    } else {
        *field = None;
    }
}

impl Entity for StreamerSettings {
    type Key = GuildId;
    type Include = StreamerSettingsInclude;

    const KIND: &'static str = "StreamerSettings";

    fn key(&self) -> GuildId {
        self.guild_id
    }

    fn restrict_to(&mut self, includes: &[StreamerSettingsInclude]) {
        use StreamerSettingsInclude::*;

        restrict(&mut self.channel_settings, includes.contains(&ChannelSettings));
        restrict(&mut self.stream_messages, includes.contains(&StreamMessages));
        restrict(&mut self.white_listed_role_ids, includes.contains(&WhiteListedRoleIds));
    }
}

impl ModuleSettings for StreamerSettings {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn merge_from(&mut self, incoming: &Self) {
        self.enabled = incoming.enabled;
        self.streamer_role_enabled = incoming.streamer_role_enabled;
        self.role_id = incoming.role_id;

        if incoming.channel_settings.is_some() {
            self.channel_settings = incoming.channel_settings.clone();
        }
        if incoming.stream_messages.is_some() {
            self.stream_messages = incoming.stream_messages.clone();
        }
        if incoming.white_listed_role_ids.is_some() {
            self.white_listed_role_ids = incoming.white_listed_role_ids.clone();
        }
    }
}
