//! Terse constructors for test data.

use basecamp_cart_core::Reservation;
use chrono::{NaiveDate, NaiveTime};

/// A calendar date; panics on invalid input, which is fine in tests.
#[must_use]
#[allow(clippy::expect_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A time of day; panics on invalid input, which is fine in tests.
#[must_use]
#[allow(clippy::expect_used)]
pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid test time")
}

/// A lodging reservation.
#[must_use]
pub const fn lodging(check_in: NaiveDate, check_out: NaiveDate, guests: u32) -> Reservation {
    Reservation::Lodging {
        check_in,
        check_out,
        guests,
    }
}

/// An activity reservation.
#[must_use]
pub const fn activity(date: NaiveDate, time: NaiveTime, participants: u32) -> Reservation {
    Reservation::Activity {
        date,
        time,
        participants,
    }
}

/// An equipment rental reservation.
#[must_use]
pub const fn equipment(
    rental_start: NaiveDate,
    rental_end: NaiveDate,
    quantity: u32,
) -> Reservation {
    Reservation::Equipment {
        rental_start,
        rental_end,
        quantity,
    }
}
