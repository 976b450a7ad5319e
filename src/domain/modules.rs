//! Bot module metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Release channel of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseState {
    Alpha,
    Beta,
    Stable,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseState::Alpha => "alpha",
            ReleaseState::Beta => "beta",
            ReleaseState::Stable => "stable",
        };
        f.write_str(s)
    }
}

/// Descriptive metadata a module publishes about itself.
pub trait Documented {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether guild admins can configure the module.
    fn configurable(&self) -> bool;

    fn release_state(&self) -> ReleaseState;
}

/// Metadata of the stream announcer module.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamerModule;

impl Documented for StreamerModule {
    fn name(&self) -> &str {
        "Streamer"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn description(&self) -> &str {
        "Announces members who go live and hands out a streamer role while they stream."
    }

    fn configurable(&self) -> bool {
        true
    }

    fn release_state(&self) -> ReleaseState {
        ReleaseState::Stable
    }
}
