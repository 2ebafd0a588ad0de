//! Per-room notification preference.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user's notification preference for a single room.
///
/// Stored per (user, room) pair; absence means [`Self::All`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomNotificationPreference {
    /// Email for every message while offline.
    #[default]
    All,
    /// Email only when mentioned.
    Mentions,
    /// Never notify for this room.
    None,
}

impl RoomNotificationPreference {
    /// String form used on the wire and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Mentions => "mentions",
            Self::None => "none",
        }
    }

    /// Whether any notification is allowed for this room.
    pub fn allows_any(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for RoomNotificationPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomNotificationPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "mentions" => Ok(Self::Mentions),
            "none" => Ok(Self::None),
            other => Err(format!("unknown notification preference: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all() {
        assert_eq!(
            RoomNotificationPreference::default(),
            RoomNotificationPreference::All
        );
    }

    #[test]
    fn test_str_roundtrip() {
        for pref in [
            RoomNotificationPreference::All,
            RoomNotificationPreference::Mentions,
            RoomNotificationPreference::None,
        ] {
            let parsed: RoomNotificationPreference = pref.as_str().parse().expect("parses");
            assert_eq!(parsed, pref);
        }
    }

    #[test]
    fn test_unknown_value_rejected() {
        assert!("sometimes".parse::<RoomNotificationPreference>().is_err());
    }
}
