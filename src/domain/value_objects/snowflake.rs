//! Discord Snowflake identifiers.
//!
//! Every guild, channel, role, user and message the bot sees is addressed by
//! an unsigned 64-bit snowflake handed out by Discord.
//!
//! ```text
//! 64                         22          17          12          0
//! +---------------------------+-----------+-----------+-----------+
//! |         timestamp         |  worker   |  process  |  sequence |
//! |          (42 bits)        |  (5 bits) |  (5 bits) |  (12 bits)|
//! +---------------------------+-----------+-----------+-----------+
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discord epoch: 2015-01-01T00:00:00Z in milliseconds
pub const DISCORD_EPOCH: u64 = 1420070400000;

/// A Discord Snowflake ID.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snowflake(pub u64);

/// Tenant identifier.
pub type GuildId = Snowflake;
pub type ChannelId = Snowflake;
pub type RoleId = Snowflake;
pub type UserId = Snowflake;
pub type MessageId = Snowflake;

impl Snowflake {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Milliseconds since the Unix epoch at which this ID was minted.
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 22) + DISCORD_EPOCH
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp() as i64)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Bit-cast into the signed BIGINT column representation.
    pub fn to_db(self) -> i64 {
        self.0 as i64
    }

    /// Inverse of [`Snowflake::to_db`].
    pub fn from_db(value: i64) -> Self {
        Self(value as u64)
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(snowflake: Snowflake) -> Self {
        snowflake.0
    }
}
