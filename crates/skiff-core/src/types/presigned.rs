//! Expiry for query-string authenticated URLs

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{Error, Result};

/// Default lifetime of a signed URL (5 minutes)
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: i64 = 300;

/// Raw second counts below this (1980-01-01) are read as relative offsets,
/// larger ones as absolute epoch timestamps.
const EPOCH_THRESHOLD_SECS: i64 = 315_529_200;

/// When a signed URL stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Relative to the signing time
    After(Duration),
    /// Absolute point in time
    At(DateTime<Utc>),
}

impl Expiry {
    /// Interpret a raw second count the way older clients did.
    pub fn from_secs(secs: i64) -> Result<Self> {
        if secs < EPOCH_THRESHOLD_SECS {
            Duration::try_seconds(secs)
                .map(Self::After)
                .ok_or_else(|| out_of_range(secs))
        } else {
            Utc.timestamp_opt(secs, 0)
                .single()
                .map(Self::At)
                .ok_or_else(|| out_of_range(secs))
        }
    }

    /// Resolve to an absolute time given the signing time.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match *self {
            Self::After(delta) => now.checked_add_signed(delta).ok_or_else(|| {
                Error::InvalidArgument(format!("expiry {} from {} is out of range", delta, now))
            }),
            Self::At(at) => Ok(at),
        }
    }

    /// Seconds since the epoch, as carried in `Expires=`. Sub-second parts
    /// are dropped.
    pub fn timestamp(&self, now: DateTime<Utc>) -> Result<i64> {
        self.resolve(now).map(|at| at.timestamp())
    }
}

fn out_of_range(secs: i64) -> Error {
    Error::InvalidArgument(format!("expiry of {} seconds is out of range", secs))
}

impl Default for Expiry {
    fn default() -> Self {
        Self::After(Duration::seconds(DEFAULT_SIGNED_URL_EXPIRY_SECS))
    }
}

impl From<Duration> for Expiry {
    fn from(delta: Duration) -> Self {
        Self::After(delta)
    }
}

/// Durations beyond what chrono can represent saturate, and then fail in
/// [`Expiry::resolve`].
impl From<std::time::Duration> for Expiry {
    fn from(delta: std::time::Duration) -> Self {
        Self::After(Duration::from_std(delta).unwrap_or(Duration::MAX))
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}
