use bdays::HolidayCalendar;
use bdays::calendars::WeekendsOnly;
use chrono::{Duration, NaiveDate};

/// Check if a date is a working day (Monday through Friday)
pub fn is_business_day(date: NaiveDate) -> bool {
    WeekendsOnly.is_bday(date)
}

/// Move `date` by `n` business days, forward for positive `n` and backward
/// for negative `n`. Weekend days are stepped over without being counted.
///
/// Saturates at the first or last representable date.
pub fn add_business_days(date: NaiveDate, n: i64) -> NaiveDate {
    let step = if n < 0 {
        Duration::days(-1)
    } else {
        Duration::days(1)
    };
    let target = n.abs();
    let mut current = date;
    let mut count = 0;

    while count < target {
        let Some(next) = current.checked_add_signed(step) else {
            break;
        };
        current = next;
        if is_business_day(current) {
            count += 1;
        }
    }
    current
}

/// Count business days in the half-open interval `[start, end)`.
///
/// The end date is never counted; callers wanting an inclusive count pass
/// `add_business_days(end, 1)`. Returns 0 when `end <= start`.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end <= start {
        return 0;
    }
    i64::from(WeekendsOnly.bdays(start, end)).max(0)
}

/// Every business day in the inclusive range `[start, end]`, ascending.
pub fn business_days_in(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |day| *day <= end)
        .filter(|day| is_business_day(*day))
}
