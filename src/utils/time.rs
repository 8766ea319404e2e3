use chrono::NaiveDate;

/// Format used by all-day dates on the wire
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a date in YYYY-MM-DD format
pub fn parse_date_only(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim();
    // chrono accepts unpadded fields, the wire format does not
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).ok()
}

/// Format a date as YYYY-MM-DD
pub fn format_date_only(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Format a date as YYYYMMDD
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// RFC 3339 timestamp for midnight UTC at the start of the given date
pub fn midnight_utc(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", format_date_only(date))
}
