//! Timestamp and date formatting utilities

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};

use crate::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SHEET_DATE_FORMAT: &str = "%Y-%m-%d";
const ITALIAN_DATE_FORMAT: &str = "%d/%m/%Y";

/// Current UTC timestamp
pub fn now() -> chrono::DateTime<Utc> {
    Utc::now()
}

/// Current process-local wall clock time, second precision is applied at formatting
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// `YYYY-MM-DD`
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(SHEET_DATE_FORMAT).to_string()
}

/// `dd/mm/yyyy`, as shown to users
pub fn format_date_italian(date: NaiveDate) -> String {
    date.format(ITALIAN_DATE_FORMAT).to_string()
}

/// Parse a date typed or picked by the user
///
/// Accepts ISO `YYYY-MM-DD` (HTML date inputs) and italian `dd/mm/yyyy`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, SHEET_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(input, ITALIAN_DATE_FORMAT))
        .map_err(|_| Error::InvalidInput(format!("unrecognised date: '{}'", input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_timestamp_second_precision() {
        let ts = date(2024, 3, 10)
            .and_hms_milli_opt(9, 5, 7, 999)
            .unwrap();
        assert_eq!(format_timestamp(ts), "2024-03-10 09:05:07");
    }

    #[test]
    fn test_format_dates() {
        assert_eq!(format_sheet_date(date(2024, 4, 1)), "2024-04-01");
        assert_eq!(format_date_italian(date(2024, 4, 1)), "01/04/2024");
    }

    #[test]
    fn test_parse_date_both_formats() {
        assert_eq!(parse_date("2024-03-10").unwrap(), date(2024, 3, 10));
        assert_eq!(parse_date(" 10/03/2024 ").unwrap(), date(2024, 3, 10));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("domenica").is_err());
    }

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800); // 2000-01-01 00:00:00 UTC
    }
}
