//! # Domain Value Objects
//!
//! - **Snowflake**: Discord ID with embedded timestamp, aliased per resource
//!   (`GuildId`, `ChannelId`, `RoleId`, ...)

mod snowflake;

pub use snowflake::*;
