//! Batcher options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default flush interval (10 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Batcher configuration.
///
/// Serializes with `interval` as whole milliseconds:
///
/// ```
/// use saturated::Options;
///
/// let opts: Options = serde_json::from_str(r#"{"interval": 3000, "max": 10}"#).unwrap();
/// assert_eq!(opts.interval.as_millis(), 3000);
/// assert_eq!(opts.max, Some(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Period of the recurring flush timer, measured from the end of the
    /// previous flush.
    #[serde(with = "millis")]
    pub interval: Duration,
    /// Size threshold that triggers an immediate flush after a push.
    /// `None` means unbounded: only timer or manual flushes deliver batches.
    pub max: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max: None,
        }
    }
}

impl Options {
    /// Create options with the defaults (10s interval, unbounded).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flush interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the flush interval in milliseconds.
    pub fn with_interval_ms(self, ms: u64) -> Self {
        self.with_interval(Duration::from_millis(ms))
    }

    /// Set the size threshold.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Check that the interval and threshold are positive.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::InvalidConfig(
                "interval must be greater than 0".into(),
            ));
        }
        if self.max == Some(0) {
            return Err(Error::InvalidConfig("max must be greater than 0".into()));
        }
        Ok(())
    }

    /// Number of items a flush takes from a queue holding `queued` items.
    pub fn batch_len(&self, queued: usize) -> usize {
        match self.max {
            Some(max) => queued.min(max),
            None => queued,
        }
    }

    /// Reports whether a queue of `len` items has reached the threshold.
    pub fn is_saturated(&self, len: usize) -> bool {
        self.max.is_some_and(|max| len >= max)
    }
}

/// Serde helper for a `Duration` stored as integer milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}
