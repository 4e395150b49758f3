use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::America::Santiago;
use chrono_tz::Tz;

/// Server timestamps are UTC; everything the user sees is Santiago time.
pub fn to_local(timestamp: DateTime<Utc>) -> DateTime<Tz> {
    timestamp.with_timezone(&Santiago)
}

pub fn local_date(timestamp: DateTime<Utc>) -> NaiveDate {
    to_local(timestamp).date_naive()
}

pub fn local_hour(timestamp: DateTime<Utc>) -> u32 {
    to_local(timestamp).hour()
}

/// `dd-mm-yyyy HH:MM` as shown in the history table.
pub fn display_timestamp(timestamp: DateTime<Utc>) -> String {
    to_local(timestamp).format("%d-%m-%Y %H:%M").to_string()
}
