//! Shared storage helper functions.
//!
//! Timestamp encoding shared across the SQL backend implementations.

use chrono::{DateTime, SecondsFormat, Utc};

use super::{Result, StorageError};

#[cfg(test)]
mod tests;

/// Format an order timestamp for the `date_created` column.
///
/// RFC3339 in UTC with as many fractional digits as needed, so parsing the
/// stored text yields the same instant.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a stored `date_created` value back into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}
