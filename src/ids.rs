//! Opaque platform identifiers.
//!
//! The platform hands out snowflake-style ids as strings; the bot never
//! interprets them, it only compares and formats them into store keys.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// A guild (community/server), the top-level tenancy unit.
    GuildId
);
string_id!(
    /// A text or voice channel inside a guild.
    ChannelId
);
string_id!(
    /// A platform user.
    UserId
);
string_id!(
    /// One of the onboarding worker processes.
    WorkerId
);
