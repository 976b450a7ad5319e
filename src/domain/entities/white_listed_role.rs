//! Roles whose members are eligible for stream announcements.

use serde::{Deserialize, Serialize};

use crate::domain::entity::{Entity, NoInclude};
use crate::domain::value_objects::{GuildId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteListedRole {
    pub role_id: RoleId,

    pub guild_id: GuildId,
}

impl WhiteListedRole {
    pub fn new(role_id: RoleId, guild_id: GuildId) -> Self {
        Self { role_id, guild_id }
    }
}

impl Entity for WhiteListedRole {
    type Key = RoleId;
    type Include = NoInclude;

    const KIND: &'static str = "WhiteListedRole";

    fn key(&self) -> RoleId {
        self.role_id
    }
}
