// ── Date-only conversion ──
//
// The server speaks `YYYY-MM-DD` with no time or zone. Locally the value is
// a `NaiveDate`, so a round trip always lands on the same calendar day.

use chrono::NaiveDate;

use crate::error::CoreError;

pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse the wire form. Absent or empty yields `None`.
pub fn local_date_from_server(raw: Option<&str>) -> Result<Option<NaiveDate>, CoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, WIRE_DATE_FORMAT)
            .map(Some)
            .map_err(|_| CoreError::InvalidDate {
                value: value.to_owned(),
            }),
    }
}

/// Format for the wire.
pub fn local_date_to_server(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(WIRE_DATE_FORMAT).to_string())
}
