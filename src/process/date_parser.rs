use chrono::{Datelike, NaiveDate};

use super::utils::clean_str;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse an invoice date string into a calendar date.
///
/// Accepts ISO-ish `YYYY-MM-DD` / `YYYY-M-D` / `YYYY/MM/DD` (optionally
/// followed by a `T` or space separated time, which is ignored), the partial
/// forms `YYYY` and `YYYY-M` (first of the year or month), and US style
/// `M/D/YYYY` or `M/D/YY`. Anything else is `None`.
pub fn parse_invoice_date(raw: &str) -> Option<NaiveDate> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }
    // drop a trailing time component
    let date_part = s.split(['T', ' ']).next().unwrap_or(s);

    let (sep, parts) = if date_part.contains('-') {
        ('-', date_part.split('-').collect::<Vec<_>>())
    } else {
        ('/', date_part.split('/').collect::<Vec<_>>())
    };
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !is_digits(p)) {
        return None;
    }

    if parts[0].len() == 4 {
        // year first; a two-part date needs the dash form
        if (parts.len() == 2 && sep != '-') || parts[1..].iter().any(|p| p.len() > 2) {
            return None;
        }
        let year: i32 = parts[0].parse().ok()?;
        let month: u32 = match parts.get(1) {
            Some(p) => p.parse().ok()?,
            None => 1,
        };
        let day: u32 = match parts.get(2) {
            Some(p) => p.parse().ok()?,
            None => 1,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if sep == '/' && parts.len() == 3 && parts[0].len() <= 2 && parts[1].len() <= 2 {
        // month first
        let month: u32 = parts[0].parse().ok()?;
        let day: u32 = parts[1].parse().ok()?;
        let year: i32 = match parts[2].len() {
            4 => parts[2].parse().ok()?,
            2 => 2000 + parts[2].parse::<i32>().ok()?,
            _ => return None,
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn is_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// Days since 1970-01-01, the Arrow `Date32` representation.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of `date_to_days`.
pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Calendar year of a `Date32` value.
pub fn year_of(days: i32) -> Option<i32> {
    days_to_date(days).map(|d| d.year())
}

/// Calendar month (1-12) of a `Date32` value.
pub fn month_of(days: i32) -> Option<i32> {
    days_to_date(days).map(|d| d.month() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_dates() {
        assert_eq!(parse_invoice_date("2021-03-14"), Some(ymd(2021, 3, 14)));
        assert_eq!(parse_invoice_date("2021-3-4"), Some(ymd(2021, 3, 4)));
        assert_eq!(parse_invoice_date("2020/12/01"), Some(ymd(2020, 12, 1)));
        assert_eq!(
            parse_invoice_date("2021-03-14 10:15:00"),
            Some(ymd(2021, 3, 14))
        );
        assert_eq!(
            parse_invoice_date("2021-03-14T10:15:00Z"),
            Some(ymd(2021, 3, 14))
        );
    }

    #[test]
    fn test_partial_iso_dates_start_the_period() {
        assert_eq!(parse_invoice_date("2021"), Some(ymd(2021, 1, 1)));
        assert_eq!(parse_invoice_date("2021-03"), Some(ymd(2021, 3, 1)));
        assert_eq!(parse_invoice_date("2021-3"), Some(ymd(2021, 3, 1)));
        assert_eq!(parse_invoice_date("2021-03 00:00"), Some(ymd(2021, 3, 1)));
    }

    #[test]
    fn test_parse_us_dates() {
        assert_eq!(parse_invoice_date("1/1/2020"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_invoice_date("12/31/2021"), Some(ymd(2021, 12, 31)));
        assert_eq!(parse_invoice_date("6/15/21"), Some(ymd(2021, 6, 15)));
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_invoice_date(""), None);
        assert_eq!(parse_invoice_date("not a date"), None);
        assert_eq!(parse_invoice_date("2021-02-30"), None);
        assert_eq!(parse_invoice_date("13/01/2021"), None);
        assert_eq!(parse_invoice_date("2021-13"), None);
        assert_eq!(parse_invoice_date("2021/03"), None);
        assert_eq!(parse_invoice_date("21-03"), None);
        assert_eq!(parse_invoice_date("20210314"), None);
        assert_eq!(parse_invoice_date("1-1-2020"), None);
    }

    #[test]
    fn test_days_round_trip_and_parts() {
        let d = ymd(2021, 7, 9);
        let days = date_to_days(d);
        assert_eq!(date_to_days(ymd(1970, 1, 1)), 0);
        assert_eq!(date_to_days(ymd(1970, 1, 2)), 1);
        assert_eq!(days_to_date(days), Some(d));
        assert_eq!(year_of(days), Some(2021));
        assert_eq!(month_of(days), Some(7));
    }
}
