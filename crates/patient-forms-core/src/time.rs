use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

/// FHIR `date` with full precision, as entered in a date input
const FHIR_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_fhir_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), FHIR_DATE)
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_fhir_date(date: Date) -> String {
    date.format(FHIR_DATE).unwrap_or_else(|_| date.to_string())
}

/// Today's date in UTC, the upper bound for a birth date
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}
