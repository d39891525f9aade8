//! `chrono` timestamps and durations, stored as epoch milliseconds.

use chrono::{DateTime, Duration, Utc};
use prf_store::{RawKind, RawValue};

use crate::error::{AdapterError, AdapterResult};
use crate::traits::{mismatch, Adapter};

/// `DateTime<Utc>` stored as milliseconds since the UNIX epoch.
///
/// Sub-millisecond precision is dropped on encode, so the round-trip law
/// holds for millisecond-aligned instants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateTimeAdapter;

impl Adapter<DateTime<Utc>> for DateTimeAdapter {
    fn encode(&self, value: &DateTime<Utc>) -> AdapterResult<RawValue> {
        Ok(RawValue::Int(value.timestamp_millis()))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<DateTime<Utc>> {
        match raw {
            RawValue::Int(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                AdapterError::InvalidValue(format!("timestamp {ms}ms is out of range"))
            }),
            other => Err(mismatch(RawKind::Int, &other)),
        }
    }
}

/// `chrono::Duration` stored as whole milliseconds.
///
/// Encoding a span with a sub-millisecond remainder fails with
/// [`AdapterError::InvalidValue`] instead of truncating it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DurationAdapter;

impl Adapter<Duration> for DurationAdapter {
    fn encode(&self, value: &Duration) -> AdapterResult<RawValue> {
        let ms = value.num_milliseconds();
        if Duration::try_milliseconds(ms) != Some(*value) {
            return Err(AdapterError::InvalidValue(format!(
                "duration {value} is not a whole number of milliseconds"
            )));
        }
        Ok(RawValue::Int(ms))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<Duration> {
        match raw {
            RawValue::Int(ms) => Duration::try_milliseconds(ms).ok_or_else(|| {
                AdapterError::InvalidValue(format!("duration {ms}ms is out of range"))
            }),
            other => Err(mismatch(RawKind::Int, &other)),
        }
    }
}
