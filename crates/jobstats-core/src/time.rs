//! Conversion between `DateTime<Utc>` and the epoch milliseconds kept in storage.

use chrono::{DateTime, TimeZone, Utc};

use crate::{Error, Result};

/// Milliseconds since the Unix epoch. Sub-millisecond precision is dropped.
pub fn to_epoch_millis(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::InvalidArgument(format!("timestamp out of range: {} ms", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_roundtrip_truncates_nanos() {
        let time = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let millis = to_epoch_millis(&time);
        assert_eq!(millis, 1_700_000_000_123);

        let restored = from_epoch_millis(millis).unwrap();
        assert_eq!(restored.timestamp_subsec_millis(), 123);
        assert!(restored <= time);
    }

    #[test]
    fn test_from_epoch_millis_out_of_range() {
        let err = from_epoch_millis(i64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref message) if message.contains("out of range")));
    }
}
