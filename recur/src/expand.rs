//! Expansion of one recurrence period into candidate date-times.
//!
//! Each period starts as a coarse slot (a year, a month or a week), or as a
//! single day for `DAILY` and finer. The BY-parts are then applied in
//! [`CHAIN`] order. Depending on [`mode`], a part either *expands* the
//! candidates (one slot becomes many days, one day becomes many hours) or
//! *limits* them (candidates that do not match are dropped).
//!
//! A limiting part that meets a coarse slot cannot be decided yet (which
//! days of the week fall in June?), so it is deferred until the slot has
//! been resolved to concrete days.

use jiff::civil::{Date, DateTime, Time};
use jiff::ToSpan;

use crate::calendar::{self, days_between};
use crate::rule::{Frequency, Rule, WeekdayNum};

/// A BY-part, named for its position in the expansion chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByPart {
    Month,
    WeekNo,
    YearDay,
    MonthDay,
    Day,
    Hour,
    Minute,
    Second,
    SetPos,
}

/// The order in which BY-parts are applied to a period.
pub const CHAIN: [ByPart; 9] = [
    ByPart::Month,
    ByPart::WeekNo,
    ByPart::YearDay,
    ByPart::MonthDay,
    ByPart::Day,
    ByPart::Hour,
    ByPart::Minute,
    ByPart::Second,
    ByPart::SetPos,
];

impl ByPart {
    pub fn name(self) -> &'static str {
        match self {
            Self::Month => "BYMONTH",
            Self::WeekNo => "BYWEEKNO",
            Self::YearDay => "BYYEARDAY",
            Self::MonthDay => "BYMONTHDAY",
            Self::Day => "BYDAY",
            Self::Hour => "BYHOUR",
            Self::Minute => "BYMINUTE",
            Self::Second => "BYSECOND",
            Self::SetPos => "BYSETPOS",
        }
    }

    pub fn is_present(self, rule: &Rule) -> bool {
        match self {
            Self::Month => !rule.by_month.is_empty(),
            Self::WeekNo => !rule.by_week_no.is_empty(),
            Self::YearDay => !rule.by_year_day.is_empty(),
            Self::MonthDay => !rule.by_month_day.is_empty(),
            Self::Day => !rule.by_day.is_empty(),
            Self::Hour => !rule.by_hour.is_empty(),
            Self::Minute => !rule.by_minute.is_empty(),
            Self::Second => !rule.by_second.is_empty(),
            Self::SetPos => !rule.by_set_pos.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Expand,
    Limit,
}

/// How `part` acts on a period of `rule`'s frequency.
///
/// This is the table from RFC 5545 section 3.3.10. Cells the RFC marks N/A
/// only occur in rules accepted in RFC 2445 compatibility mode, where the
/// part limits.
pub fn mode(part: ByPart, rule: &Rule) -> Mode {
    use Frequency::*;
    let freq = rule.freq;
    let expand = match part {
        ByPart::Month | ByPart::WeekNo => freq == Yearly,
        ByPart::YearDay => freq == Yearly,
        ByPart::MonthDay => matches!(freq, Monthly | Yearly),
        ByPart::Day => match freq {
            Weekly => true,
            Monthly => rule.by_month_day.is_empty(),
            Yearly => rule.by_year_day.is_empty() && rule.by_month_day.is_empty(),
            _ => false,
        },
        ByPart::Hour => freq >= Daily,
        ByPart::Minute => freq >= Hourly,
        ByPart::Second => freq >= Minutely,
        ByPart::SetPos => false,
    };
    if expand {
        Mode::Expand
    } else {
        Mode::Limit
    }
}

/// A coarse unit of a period, not yet resolved to days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Year(i16),
    Month(i16, i8),
    /// A week, by its first day.
    Week(Date),
}

impl Slot {
    fn first_day(self) -> Option<Date> {
        match self {
            Self::Year(y) => Date::new(y, 1, 1).ok(),
            Self::Month(y, m) => Date::new(y, m, 1).ok(),
            Self::Week(d) => Some(d),
        }
    }

    fn len(self) -> usize {
        match self {
            Self::Year(y) => calendar::days_in_year(y) as usize,
            Self::Month(y, m) => calendar::days_in_month(y, m) as usize,
            Self::Week(_) => 7,
        }
    }

    fn days(self) -> impl Iterator<Item = Date> {
        let len = self.len();
        self.first_day()
            .into_iter()
            .flat_map(move |first| first.series(1.day()).take(len))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidates {
    Slots(Vec<Slot>),
    Days(Vec<Date>),
    Times(Vec<DateTime>),
}

/// Which span a `BYDAY` ordinal counts in.
#[derive(Debug, Clone, Copy)]
enum OrdinalScope {
    Year,
    Month,
    /// Ordinals are meaningless in a week; only the weekday counts.
    Week,
}

struct Expander<'r> {
    rule: &'r Rule,
    dtstart: DateTime,
    /// Time of day given to each resolved day before the time parts run.
    time: Time,
    deferred: Vec<ByPart>,
}

/// Every civil candidate of the period beginning at `anchor`, sorted and
/// de-duplicated. `BYSETPOS` is not applied here; it runs once the
/// candidates have been placed in a zone.
///
/// `anchor` is the period start for `WEEKLY` and coarser (the week start for
/// `WEEKLY`), and the period's own instant for `DAILY` and finer.
pub(crate) fn expand_period(rule: &Rule, dtstart: DateTime, anchor: DateTime) -> Vec<DateTime> {
    let time = if rule.freq.is_sub_daily() {
        anchor.time()
    } else {
        dtstart.time()
    };
    let seed = match rule.freq {
        Frequency::Yearly => Candidates::Slots(vec![Slot::Year(anchor.year())]),
        Frequency::Monthly => Candidates::Slots(vec![Slot::Month(anchor.year(), anchor.month())]),
        Frequency::Weekly => Candidates::Slots(vec![Slot::Week(anchor.date())]),
        _ => Candidates::Days(vec![anchor.date()]),
    };
    let mut ex = Expander {
        rule,
        dtstart,
        time,
        deferred: Vec::new(),
    };

    let mut cands = seed;
    for part in CHAIN {
        if part == ByPart::Hour {
            cands = ex.resolve(cands);
        }
        if part == ByPart::SetPos || !part.is_present(rule) {
            continue;
        }
        cands = ex.apply(part, cands);
    }

    let mut times = match cands {
        Candidates::Times(t) => t,
        other => match ex.resolve(other) {
            Candidates::Times(t) => t,
            _ => Vec::new(),
        },
    };
    times.sort();
    times.dedup();
    times
}

impl Expander<'_> {
    fn apply(&mut self, part: ByPart, cands: Candidates) -> Candidates {
        let rule = self.rule;
        match cands {
            Candidates::Slots(slots) => match (part, mode(part, rule)) {
                (ByPart::Month, Mode::Expand) => Candidates::Slots(
                    slots
                        .into_iter()
                        .flat_map(|slot| match slot {
                            Slot::Year(y) => rule.by_month.iter().map(|&m| Slot::Month(y, m)).collect(),
                            other => vec![other],
                        })
                        .collect(),
                ),
                (_, Mode::Expand) => {
                    let mut days: Vec<Date> = slots
                        .into_iter()
                        .flat_map(|slot| {
                            let scope = match slot {
                                Slot::Year(_) => OrdinalScope::Year,
                                Slot::Month(..) => OrdinalScope::Month,
                                Slot::Week(_) => OrdinalScope::Week,
                            };
                            slot.days().filter(move |d| date_matches(rule, part, *d, scope))
                        })
                        .collect();
                    days.sort();
                    days.dedup();
                    Candidates::Days(days)
                }
                (_, Mode::Limit) => {
                    self.deferred.push(part);
                    Candidates::Slots(slots)
                }
            },
            Candidates::Days(mut days) => {
                let scope = limit_scope(rule);
                days.retain(|d| date_matches(rule, part, *d, scope));
                Candidates::Days(days)
            }
            Candidates::Times(times) => Candidates::Times(self.apply_time(part, times)),
        }
    }

    fn apply_time(&self, part: ByPart, times: Vec<DateTime>) -> Vec<DateTime> {
        let rule = self.rule;
        let values: &[i8] = match part {
            ByPart::Hour => &rule.by_hour,
            ByPart::Minute => &rule.by_minute,
            ByPart::Second => &rule.by_second,
            _ => {
                let scope = limit_scope(rule);
                let mut times = times;
                times.retain(|dt| date_matches(rule, part, dt.date(), scope));
                return times;
            }
        };
        let field = |dt: &DateTime| match part {
            ByPart::Hour => dt.hour(),
            ByPart::Minute => dt.minute(),
            _ => dt.second(),
        };
        match mode(part, rule) {
            Mode::Limit => times
                .into_iter()
                .filter(|dt| values.contains(&field(dt)))
                .collect(),
            Mode::Expand => times
                .iter()
                .flat_map(|dt| {
                    values.iter().filter_map(move |&v| {
                        let mut with = dt.with();
                        with = match part {
                            ByPart::Hour => with.hour(v),
                            ByPart::Minute => with.minute(v),
                            _ => with.second(v),
                        };
                        // BYSECOND=60 names a leap second, which has no civil
                        // representation; it is dropped.
                        with.build().ok()
                    })
                })
                .collect(),
        }
    }

    /// Turn the remaining coarse slots into days (taking the missing fields
    /// from DTSTART), run the deferred limits, then attach the time of day.
    fn resolve(&mut self, cands: Candidates) -> Candidates {
        let days = match cands {
            Candidates::Times(t) => return Candidates::Times(t),
            Candidates::Days(d) => d,
            Candidates::Slots(slots) => {
                let start = self.dtstart.date();
                let mut days: Vec<Date> = slots
                    .into_iter()
                    .filter_map(|slot| match slot {
                        Slot::Year(y) => Date::new(y, start.month(), start.day()).ok(),
                        Slot::Month(y, m) => Date::new(y, m, start.day()).ok(),
                        Slot::Week(first) => {
                            let offset = self
                                .rule
                                .week_start
                                .days_until(calendar::day_of_week(start));
                            calendar::add_days(first, i64::from(offset))
                        }
                    })
                    .collect();
                days.sort();
                days.dedup();
                days
            }
        };

        let rule = self.rule;
        let scope = limit_scope(rule);
        let deferred = std::mem::take(&mut self.deferred);
        let time = self.time;
        Candidates::Times(
            days.into_iter()
                .filter(|d| deferred.iter().all(|&part| date_matches(rule, part, *d, scope)))
                .map(|d| d.to_datetime(time))
                .collect(),
        )
    }
}

/// Ordinal scope for `BYDAY` entries checked against single days.
fn limit_scope(rule: &Rule) -> OrdinalScope {
    if rule.freq == Frequency::Monthly || !rule.by_month.is_empty() {
        OrdinalScope::Month
    } else {
        OrdinalScope::Year
    }
}

/// Whether `date` satisfies the date-level part `part` of `rule`.
fn date_matches(rule: &Rule, part: ByPart, date: Date, scope: OrdinalScope) -> bool {
    match part {
        ByPart::Month => rule.by_month.contains(&date.month()),
        ByPart::WeekNo => {
            let Some(wn) = calendar::iso_week_number(date, rule.week_start) else {
                return false;
            };
            rule.by_week_no.iter().any(|&n| {
                matches_index(i32::from(n), i32::from(wn.week), i32::from(wn.weeks_in_year))
            })
        }
        ByPart::YearDay => {
            let doy = i32::from(calendar::day_of_year(date));
            let len = i32::from(calendar::days_in_year(date.year()));
            rule.by_year_day
                .iter()
                .any(|&n| matches_index(i32::from(n), doy, len))
        }
        ByPart::MonthDay => {
            let dim = i32::from(calendar::days_in_month(date.year(), date.month()));
            rule.by_month_day
                .iter()
                .any(|&n| matches_index(i32::from(n), i32::from(date.day()), dim))
        }
        ByPart::Day => rule.by_day.iter().any(|wdn| weekday_matches(*wdn, date, scope)),
        ByPart::Hour | ByPart::Minute | ByPart::Second | ByPart::SetPos => true,
    }
}

/// A positive `n` counts from 1 at the front, a negative one from -1 at the
/// back of a run of `len` items.
fn matches_index(n: i32, index: i32, len: i32) -> bool {
    if n > 0 {
        n == index
    } else {
        n == index - len - 1
    }
}

fn weekday_matches(wdn: WeekdayNum, date: Date, scope: OrdinalScope) -> bool {
    if calendar::day_of_week(date) != wdn.weekday {
        return false;
    }
    let Some(n) = wdn.ordinal else {
        return true;
    };
    let (first, last) = match scope {
        OrdinalScope::Week => return true,
        OrdinalScope::Month => (date.first_of_month(), date.last_of_month()),
        OrdinalScope::Year => (date.first_of_year(), date.last_of_year()),
    };
    let (Some(before), Some(after)) = (days_between(first, date), days_between(date, last)) else {
        return false;
    };
    let from_start = (before / 7 + 1) as i32;
    let from_end = (after / 7 + 1) as i32;
    let n = i32::from(n);
    if n > 0 {
        n == from_start
    } else {
        -n == from_end
    }
}

/// True if every date-level part of `rule` accepts `date`.
///
/// For frequencies finer than a day all of these parts limit, so a day that
/// fails here holds no instances at all.
pub(crate) fn date_allowed(rule: &Rule, date: Date) -> bool {
    let scope = limit_scope(rule);
    [
        ByPart::Month,
        ByPart::WeekNo,
        ByPart::YearDay,
        ByPart::MonthDay,
        ByPart::Day,
    ]
    .into_iter()
    .filter(|p| p.is_present(rule))
    .all(|p| date_matches(rule, p, date, scope))
}

/// For sub-daily rules, the start of the next unit (day, hour or minute)
/// that could hold an instance, when the unit containing `at` cannot.
pub(crate) fn skip_excluded(rule: &Rule, at: DateTime) -> Option<DateTime> {
    let next_day = || {
        calendar::add_days(at.date(), 1)
            .map(|d| d.to_datetime(Time::midnight()))
            .unwrap_or(DateTime::MAX)
    };
    if !date_allowed(rule, at.date()) {
        return Some(next_day());
    }
    let hour_limited = rule.freq < Frequency::Hourly && !rule.by_hour.is_empty();
    if hour_limited && !rule.by_hour.contains(&at.hour()) {
        return Some(
            calendar::start_of_period(at, Frequency::Hourly, rule.week_start)
                .and_then(|h| calendar::add_period(h, Frequency::Hourly, 1))
                .unwrap_or(DateTime::MAX),
        );
    }
    let minute_limited = rule.freq == Frequency::Secondly && !rule.by_minute.is_empty();
    if minute_limited && !rule.by_minute.contains(&at.minute()) {
        return Some(
            calendar::start_of_period(at, Frequency::Minutely, rule.week_start)
                .and_then(|m| calendar::add_period(m, Frequency::Minutely, 1))
                .unwrap_or(DateTime::MAX),
        );
    }
    None
}

/// Pick `positions` (1-based, negative from the end) out of a sorted set,
/// keeping chronological order.
pub fn select_positions<T: Clone>(set: &[T], positions: &[i16]) -> Vec<T> {
    let len = set.len() as i64;
    let mut indices: Vec<usize> = positions
        .iter()
        .filter_map(|&p| {
            let p = i64::from(p);
            let idx = if p > 0 { p - 1 } else { len + p };
            (0..len).contains(&idx).then_some(idx as usize)
        })
        .collect();
    indices.sort_unstable();
    indices.dedup();
    indices.into_iter().map(|i| set[i].clone()).collect()
}
