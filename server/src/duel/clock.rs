use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeControl {
    Bullet,
    #[default]
    Blitz,
    Rapid,
}

impl TimeControl {
    pub const ALL: [TimeControl; 3] = [Self::Bullet, Self::Blitz, Self::Rapid];

    pub fn initial_ms(self) -> u64 {
        match self {
            Self::Bullet => 60_000,
            Self::Blitz => 180_000,
            Self::Rapid => 600_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Blitz => "blitz",
            Self::Rapid => "rapid",
        }
    }
}

impl FromStr for TimeControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullet" => Ok(Self::Bullet),
            "blitz" => Ok(Self::Blitz),
            "rapid" => Ok(Self::Rapid),
            other => Err(format!("unknown time control {other:?}")),
        }
    }
}

/// Milliseconds elapsed between `since` and `now`, zero if `now` is earlier.
pub fn elapsed_ms(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - since).num_milliseconds().max(0) as u64
}

/// Instant at which a clock holding `remaining_ms`, started at `since`,
/// reaches zero.
pub fn flag_instant(since: DateTime<Utc>, remaining_ms: u64) -> DateTime<Utc> {
    since + Duration::milliseconds(remaining_ms.min(i64::MAX as u64) as i64)
}
