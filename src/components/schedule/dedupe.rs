use crate::utils::time::compact_date;
use chrono::NaiveDate;

/// Compute the dedupe key for a common event.
///
/// The key is the MD5 hex digest of the summary (lower-cased, whitespace
/// removed) followed by the start and end dates as YYYYMMDD.
pub fn compute_dedupe_key(summary: &str, start: NaiveDate, end: NaiveDate) -> String {
    let title: String = summary
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let raw = format!("{}{}{}", title, compact_date(start), compact_date(end));
    let digest = md5::compute(raw.as_bytes());
    format!("{:x}", digest)
}
