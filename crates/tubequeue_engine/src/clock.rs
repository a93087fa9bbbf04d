use chrono::Utc;
use tubequeue_core::Timestamp;

/// Wall-clock time in the core's millisecond timestamps. Clocks set before
/// the epoch read as 0.
pub fn now_ms() -> Timestamp {
    Timestamp::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
