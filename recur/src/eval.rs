//! Period-by-period evaluation of a rule against a DTSTART.
//!
//! Period `k` is anchored at `origin + k * INTERVAL` units, computed from the
//! origin every time rather than accumulated, so a skipped month (January 31
//! has no February counterpart) never shifts later periods.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use tracing::{debug, trace};

use crate::calendar;
use crate::expand;
use crate::instant::Instant;
use crate::rule::{Frequency, Rule};

/// Consecutive periods without an instance before a rule is treated as
/// exhausted. Generous enough for rules that only match on February 29 of
/// a given weekday.
const MAX_EMPTY_PERIODS: u32 = 100_000;

/// The `UNTIL` bound, resolved against the evaluation zone.
#[derive(Debug, Clone)]
enum Bound {
    Open,
    /// Inclusive absolute bound.
    Instant(Timestamp),
    /// Inclusive civil day in the evaluation zone. A date-only `UNTIL`
    /// keeps every instance on that day.
    Day(Date),
}

impl Bound {
    fn resolve(until: Option<&Instant>, zone: &TimeZone) -> Self {
        match until {
            None => Self::Open,
            Some(Instant::Date(d)) => Self::Day(*d),
            Some(Instant::Zoned(z)) => Self::Instant(z.timestamp()),
            Some(Instant::Floating(dt)) => match calendar::localize_lenient(*dt, zone) {
                Ok(z) => Self::Instant(z.timestamp()),
                Err(_) => Self::Day(dt.date()),
            },
        }
    }

    fn admits(&self, z: &Zoned) -> bool {
        match self {
            Self::Open => true,
            Self::Instant(ts) => z.timestamp() <= *ts,
            Self::Day(d) => z.date() <= *d,
        }
    }
}

/// Produces the instances of a rule one period at a time.
#[derive(Debug, Clone)]
pub(crate) struct Periods<'r> {
    rule: &'r Rule,
    zone: TimeZone,
    dtstart: DateTime,
    /// DTSTART as given, so a start inside a DST fold keeps its offset.
    start_zoned: Zoned,
    start: Timestamp,
    /// Anchor of period 0.
    origin: DateTime,
    bound: Bound,
    /// Index of the next period to expand.
    index: i64,
    empty_run: u32,
    done: bool,
}

impl<'r> Periods<'r> {
    pub(crate) fn new(rule: &'r Rule, dtstart: &Zoned) -> Self {
        let zone = dtstart.time_zone().clone();
        let civil = dtstart.datetime();
        let origin = if rule.freq >= Frequency::Weekly {
            calendar::start_of_period(civil, rule.freq, rule.week_start)
        } else {
            Some(civil)
        };
        let bound = Bound::resolve(rule.until.as_ref(), &zone);
        let mut done = origin.is_none();
        if !bound.admits(dtstart) {
            debug!("UNTIL is before DTSTART; no instances");
            done = true;
        }
        Self {
            rule,
            zone,
            dtstart: civil,
            start_zoned: dtstart.clone(),
            start: dtstart.timestamp(),
            origin: origin.unwrap_or(civil),
            bound,
            index: 0,
            empty_run: 0,
            done,
        }
    }

    pub(crate) fn zone(&self) -> &TimeZone {
        &self.zone
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done
    }

    fn anchor(&self, k: i64) -> Option<DateTime> {
        let steps = k.checked_mul(i64::from(self.rule.interval))?;
        calendar::add_period(self.origin, self.rule.freq, steps)
    }

    /// The next non-empty period's instances, ascending, already filtered
    /// against DTSTART and UNTIL. `None` once the rule has ended.
    pub(crate) fn next_period(&mut self) -> Option<Vec<Zoned>> {
        while !self.done {
            let k = self.index;
            self.index += 1;
            let Some(anchor) = self.anchor(k) else {
                debug!(period = k, "left the supported calendar range");
                self.done = true;
                break;
            };

            let floor = calendar::start_of_period(anchor, self.rule.freq, self.rule.week_start)
                .and_then(|dt| calendar::localize_lenient(dt, &self.zone).ok());
            if floor.is_some_and(|f| !self.bound.admits(&f)) {
                debug!(period = k, "period starts after UNTIL");
                self.done = true;
                break;
            }

            if self.rule.freq.is_sub_daily() {
                if let Some(next) = expand::skip_excluded(self.rule, anchor) {
                    self.skip_to(k, anchor, next);
                    self.note_empty();
                    continue;
                }
            }

            let found = self.expand(anchor);
            if found.is_empty() {
                self.note_empty();
                continue;
            }
            self.empty_run = 0;
            return Some(found);
        }
        None
    }

    fn expand(&mut self, anchor: DateTime) -> Vec<Zoned> {
        let civil = expand::expand_period(self.rule, self.dtstart, anchor);
        trace!(%anchor, candidates = civil.len(), "expanded period");
        let mut zoned: Vec<Zoned> = civil
            .into_iter()
            .filter_map(|dt| match calendar::localize(dt, &self.zone) {
                Ok(_) if dt == self.dtstart => Some(self.start_zoned.clone()),
                Ok(z) => Some(z),
                Err(e) => {
                    trace!(%e, "skipping candidate");
                    None
                }
            })
            .collect();
        zoned.sort_by_key(|z| z.timestamp());
        zoned.dedup_by_key(|z| z.timestamp());

        if !self.rule.by_set_pos.is_empty() {
            zoned = expand::select_positions(&zoned, &self.rule.by_set_pos);
        }
        zoned.retain(|z| z.timestamp() >= self.start);
        if let Some(pos) = zoned.iter().position(|z| !self.bound.admits(z)) {
            zoned.truncate(pos);
            debug!("reached UNTIL");
            self.done = true;
        }
        zoned
    }

    /// Move to the first period whose anchor is at or after `next`.
    fn skip_to(&mut self, k: i64, anchor: DateTime, next: DateTime) {
        let step = self.rule.freq.seconds().unwrap_or(1) * i64::from(self.rule.interval);
        let gap = calendar::periods_between(anchor, next, Frequency::Secondly).unwrap_or(i64::MAX);
        let periods = gap.saturating_add(step - 1) / step;
        self.index = k.saturating_add(periods.max(1));
    }

    fn note_empty(&mut self) {
        self.empty_run += 1;
        if self.empty_run >= MAX_EMPTY_PERIODS {
            debug!(
                periods = self.empty_run,
                "no instance in too many consecutive periods; giving up"
            );
            self.done = true;
        }
    }

    /// Jump forward to the period containing `target` (civil, in the
    /// evaluation zone). Never moves backwards.
    pub(crate) fn seek(&mut self, target: DateTime) {
        let freq = self.rule.freq;
        let aligned = if freq >= Frequency::Weekly {
            calendar::start_of_period(target, freq, self.rule.week_start)
        } else {
            Some(target)
        };
        let Some(periods) =
            aligned.and_then(|t| calendar::periods_between(self.origin, t, freq))
        else {
            return;
        };
        let k = periods.div_euclid(i64::from(self.rule.interval));
        if k > self.index {
            debug!(from = self.index, to = k, "seeking");
            self.index = k;
            self.empty_run = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use jiff::civil::datetime;

    fn utc(dt: DateTime) -> Zoned {
        dt.to_zoned(TimeZone::UTC).unwrap()
    }

    #[test]
    fn first_period_drops_candidates_before_dtstart() {
        let rule = parse("FREQ=MONTHLY;BYMONTHDAY=1,15").unwrap();
        let start = utc(datetime(1997, 9, 10, 9, 0, 0, 0));
        let mut periods = Periods::new(&rule, &start);
        let first = periods.next_period().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].datetime(), datetime(1997, 9, 15, 9, 0, 0, 0));
    }

    #[test]
    fn until_before_start_is_done_immediately() {
        let rule = parse("FREQ=DAILY;UNTIL=19970901T000000Z").unwrap();
        let start = utc(datetime(1997, 9, 2, 9, 0, 0, 0));
        let mut periods = Periods::new(&rule, &start);
        assert!(periods.is_done());
        assert!(periods.next_period().is_none());
    }

    #[test]
    fn impossible_rule_terminates() {
        // February 30 never exists.
        let rule = parse("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=30").unwrap();
        let start = utc(datetime(1997, 1, 1, 0, 0, 0, 0));
        let mut periods = Periods::new(&rule, &start);
        assert!(periods.next_period().is_none());
    }

    #[test]
    fn seek_jumps_forward_only() {
        let rule = parse("FREQ=DAILY;INTERVAL=10").unwrap();
        let start = utc(datetime(1997, 9, 2, 9, 0, 0, 0));
        let mut periods = Periods::new(&rule, &start);
        periods.seek(datetime(1997, 10, 5, 0, 0, 0, 0));
        let next = periods.next_period().unwrap();
        assert_eq!(next[0].datetime(), datetime(1997, 10, 2, 9, 0, 0, 0));
        periods.seek(datetime(1997, 9, 1, 0, 0, 0, 0));
        let next = periods.next_period().unwrap();
        assert_eq!(next[0].datetime(), datetime(1997, 10, 12, 9, 0, 0, 0));
    }

    #[test]
    fn sub_daily_skips_whole_days() {
        let rule = parse("FREQ=HOURLY;BYDAY=SU;BYHOUR=6").unwrap();
        let start = utc(datetime(1997, 9, 2, 9, 0, 0, 0));
        let mut periods = Periods::new(&rule, &start);
        let next = periods.next_period().unwrap();
        assert_eq!(next[0].datetime(), datetime(1997, 9, 7, 6, 0, 0, 0));
    }
}
