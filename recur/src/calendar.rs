//! Proleptic Gregorian calendar primitives used by the expander.
//!
//! Period arithmetic here never clamps: adding one month to January 31 gives
//! `None` rather than February 28, and the caller decides what a missing day
//! means. Zone conversion resolves a DST fold to the earlier offset and
//! reports a DST gap as an error.

use jiff::civil::{Date, DateTime, Time};
use jiff::tz::{AmbiguousOffset, TimeZone};
use jiff::{Timestamp, ToSpan, Zoned};

use crate::error::CalendarError;
use crate::rule::{Frequency, Weekday};

const SECONDS_PER_DAY: i64 = 86_400;

pub fn is_leap(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1-12) of `year`, or 0 for an invalid month.
pub fn days_in_month(year: i16, month: i8) -> i8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn days_in_year(year: i16) -> i16 {
    if is_leap(year) {
        366
    } else {
        365
    }
}

/// 1-based ordinal day within the year.
pub fn day_of_year(date: Date) -> i16 {
    date.day_of_year()
}

pub fn day_of_week(date: Date) -> Weekday {
    Weekday::from_jiff(date.weekday())
}

/// Add `n` days, or `None` past the end of the civil calendar.
pub(crate) fn add_days(date: Date, n: i64) -> Option<Date> {
    date.checked_add(n.days()).ok()
}

/// First day of the week containing `date`, where weeks begin on `wkst`.
pub fn week_start(date: Date, wkst: Weekday) -> Option<Date> {
    let back = wkst.days_until(day_of_week(date));
    add_days(date, -i64::from(back))
}

/// Week numbering per RFC 5545: week 1 is the first week (starting on `wkst`)
/// that holds at least four days of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekNumber {
    /// The year the week is counted in; differs from the calendar year for
    /// days at the very start or end of a year.
    pub year: i16,
    pub week: i8,
    /// 52 or 53.
    pub weeks_in_year: i8,
}

/// Start of week 1 of `year`: the week containing January 4.
fn first_week_start(year: i16, wkst: Weekday) -> Option<Date> {
    week_start(Date::new(year, 1, 4).ok()?, wkst)
}

pub fn iso_week_number(date: Date, wkst: Weekday) -> Option<WeekNumber> {
    let start = week_start(date, wkst)?;
    // The week belongs to the year holding its fourth day.
    let year = add_days(start, 3)?.year();
    let first = first_week_start(year, wkst)?;
    let next = first_week_start(year.checked_add(1)?, wkst)?;
    let week = first.until(start).ok()?.get_days() / 7 + 1;
    let weeks_in_year = first.until(next).ok()?.get_days() / 7;
    Some(WeekNumber {
        year,
        week: week as i8,
        weeks_in_year: weeks_in_year as i8,
    })
}

/// Truncate `dt` to the start of its `freq` period.
pub fn start_of_period(dt: DateTime, freq: Frequency, wkst: Weekday) -> Option<DateTime> {
    let date = dt.date();
    let midnight = Time::midnight();
    Some(match freq {
        Frequency::Yearly => Date::new(date.year(), 1, 1).ok()?.to_datetime(midnight),
        Frequency::Monthly => date.first_of_month().to_datetime(midnight),
        Frequency::Weekly => week_start(date, wkst)?.to_datetime(midnight),
        Frequency::Daily => date.to_datetime(midnight),
        Frequency::Hourly => date.to_datetime(Time::new(dt.hour(), 0, 0, 0).ok()?),
        Frequency::Minutely => date.to_datetime(Time::new(dt.hour(), dt.minute(), 0, 0).ok()?),
        Frequency::Secondly => {
            date.to_datetime(Time::new(dt.hour(), dt.minute(), dt.second(), 0).ok()?)
        }
    })
}

/// Move `dt` by `n` periods of `freq`.
///
/// Month and year steps keep the day of month and return `None` when that
/// day does not exist in the target month. Sub-daily steps are civil
/// (24-hour days). `None` also signals leaving the supported calendar range.
pub fn add_period(dt: DateTime, freq: Frequency, n: i64) -> Option<DateTime> {
    match freq {
        Frequency::Yearly => {
            let year = i16::try_from(i64::from(dt.year()).checked_add(n)?).ok()?;
            let date = Date::new(year, dt.month(), dt.day()).ok()?;
            Some(date.to_datetime(dt.time()))
        }
        Frequency::Monthly => {
            let total = (i64::from(dt.year()) * 12 + i64::from(dt.month()) - 1).checked_add(n)?;
            let year = i16::try_from(total.div_euclid(12)).ok()?;
            let month = (total.rem_euclid(12) + 1) as i8;
            let date = Date::new(year, month, dt.day()).ok()?;
            Some(date.to_datetime(dt.time()))
        }
        Frequency::Weekly => Some(add_days(dt.date(), n.checked_mul(7)?)?.to_datetime(dt.time())),
        Frequency::Daily => Some(add_days(dt.date(), n)?.to_datetime(dt.time())),
        Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
            let unit = freq.seconds()?;
            let secs = seconds_of_day(dt).checked_add(n.checked_mul(unit)?)?;
            let date = add_days(dt.date(), secs.div_euclid(SECONDS_PER_DAY))?;
            let sod = secs.rem_euclid(SECONDS_PER_DAY);
            let time = Time::new(
                (sod / 3600) as i8,
                (sod % 3600 / 60) as i8,
                (sod % 60) as i8,
                dt.subsec_nanosecond(),
            )
            .ok()?;
            Some(date.to_datetime(time))
        }
    }
}

/// Whole `freq` periods from `from` to `to`, both already period-aligned.
pub fn periods_between(from: DateTime, to: DateTime, freq: Frequency) -> Option<i64> {
    Some(match freq {
        Frequency::Yearly => i64::from(to.year()) - i64::from(from.year()),
        Frequency::Monthly => {
            (i64::from(to.year()) - i64::from(from.year())) * 12 + i64::from(to.month())
                - i64::from(from.month())
        }
        Frequency::Weekly => days_between(from.date(), to.date())?.div_euclid(7),
        Frequency::Daily => days_between(from.date(), to.date())?,
        Frequency::Hourly | Frequency::Minutely | Frequency::Secondly => {
            let days = days_between(from.date(), to.date())?;
            let secs = days * SECONDS_PER_DAY + seconds_of_day(to) - seconds_of_day(from);
            secs.div_euclid(freq.seconds()?)
        }
    })
}

pub(crate) fn days_between(from: Date, to: Date) -> Option<i64> {
    Some(i64::from(from.until(to).ok()?.get_days()))
}

pub(crate) fn seconds_of_day(dt: DateTime) -> i64 {
    i64::from(dt.hour()) * 3600 + i64::from(dt.minute()) * 60 + i64::from(dt.second())
}

/// Attach `tz` to a civil date-time.
///
/// A time repeated by a DST fold takes the earlier (first) offset. A time
/// skipped by a DST gap does not exist and is an error.
pub fn localize(dt: DateTime, tz: &TimeZone) -> Result<Zoned, CalendarError> {
    let offset = match tz.to_ambiguous_zoned(dt).offset() {
        AmbiguousOffset::Unambiguous { offset } => offset,
        AmbiguousOffset::Fold { before, .. } => before,
        AmbiguousOffset::Gap { .. } => {
            return Err(CalendarError::AmbiguousLocalTime {
                datetime: dt.to_string(),
                zone: zone_name(tz),
            })
        }
    };
    offset
        .to_timestamp(dt)
        .map(|ts| ts.to_zoned(tz.clone()))
        .map_err(|e| CalendarError::OutOfRange(e.to_string()))
}

/// Like [`localize`], but a time in a DST gap is pushed forward by the
/// length of the gap instead of failing.
pub(crate) fn localize_lenient(dt: DateTime, tz: &TimeZone) -> Result<Zoned, CalendarError> {
    tz.to_ambiguous_zoned(dt)
        .compatible()
        .map_err(|e| CalendarError::OutOfRange(e.to_string()))
}

pub fn to_utc(dt: DateTime, tz: &TimeZone) -> Result<Timestamp, CalendarError> {
    localize(dt, tz).map(|z| z.timestamp())
}

pub fn from_utc(ts: Timestamp, tz: &TimeZone) -> DateTime {
    ts.to_zoned(tz.clone()).datetime()
}

/// Human-readable name of a zone: its IANA id, or its fixed offset.
pub(crate) fn zone_name(tz: &TimeZone) -> String {
    match tz.iana_name() {
        Some(name) => name.to_string(),
        None => format_offset(tz.to_offset(Timestamp::UNIX_EPOCH).seconds()),
    }
}

pub(crate) fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 3600, abs % 3600 / 60)
}
