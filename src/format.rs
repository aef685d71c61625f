//! Display formatting for the floating panel.
//!
//! The schedule site is Swedish, so day headings follow the `sv-SE` long
//! form: weekday, day of month, month name (`onsdag 1 maj`).

use chrono::{Datelike, NaiveDate, Weekday};

const MONTHS_SV: [&str; 12] = [
    "januari", "februari", "mars", "april", "maj", "juni", "juli", "augusti", "september",
    "oktober", "november", "december",
];

fn weekday_sv(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "måndag",
        Weekday::Tue => "tisdag",
        Weekday::Wed => "onsdag",
        Weekday::Thu => "torsdag",
        Weekday::Fri => "fredag",
        Weekday::Sat => "lördag",
        Weekday::Sun => "söndag",
    }
}

/// Heading for a `YYYY-MM-DD` date; unparseable input is returned as is
pub fn date_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!(
            "{} {} {}",
            weekday_sv(d.weekday()),
            d.day(),
            MONTHS_SV[d.month0() as usize]
        ),
        Err(_) => date.to_string(),
    }
}

/// `HH:MM` part of a `YYYY-MM-DD HH:MM:SS` timestamp
pub fn clock(timestamp: &str) -> String {
    timestamp
        .split(' ')
        .nth(1)
        .map(|t| t.chars().take(5).collect())
        .unwrap_or_default()
}

/// `HH:MM - HH:MM`
pub fn time_range(start: &str, end: &str) -> String {
    format!("{} - {}", clock(start), clock(end))
}
