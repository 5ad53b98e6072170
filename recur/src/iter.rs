use std::collections::VecDeque;

use jiff::tz::TimeZone;
use jiff::Zoned;
use tracing::{debug, trace};

use crate::error::RecurError;
use crate::eval::Periods;
use crate::instant::Instant;
use crate::rule::Rule;

/// Iteration switches.
#[derive(Debug, Clone)]
pub struct IterOptions {
    /// Emit DTSTART as the first instance even when it does not match the
    /// rule. It counts toward `COUNT`.
    pub synchronize_start: bool,
    /// Stop with [`RecurError::SafetyBoundReached`] after this many
    /// instances. Mostly useful for infinite rules.
    pub limit: Option<usize>,
    /// Zone used to evaluate floating and all-day start values.
    pub zone: TimeZone,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            synchronize_start: false,
            limit: None,
            zone: TimeZone::UTC,
        }
    }
}

impl IterOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_zone(mut self, zone: TimeZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn synchronized(mut self) -> Self {
        self.synchronize_start = true;
        self
    }
}

/// The shape every instance takes, copied from DTSTART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    AllDay,
    Floating,
    Zoned,
}

/// Lazy, strictly increasing sequence of a rule's instances.
///
/// Instances have the same shape as the start value: all-day starts give
/// dates, floating starts give floating date-times, zoned starts give
/// date-times in the start's zone.
#[derive(Debug, Clone)]
pub struct RuleIter<'r> {
    rule: &'r Rule,
    periods: Periods<'r>,
    shape: Shape,
    buffer: VecDeque<Zoned>,
    /// DTSTART waiting to be emitted under `synchronize_start`.
    pending_start: Option<Zoned>,
    /// Most recent instance admitted to the buffer.
    last: Option<Zoned>,
    /// Instances consumed so far, returned or skipped, for `COUNT`.
    consumed: u64,
    /// Instances handed to the caller, for the safety limit.
    returned: usize,
    limit: Option<usize>,
}

impl<'r> RuleIter<'r> {
    pub fn new(rule: &'r Rule, start: &Instant, options: &IterOptions) -> Result<Self, RecurError> {
        let dtstart = start.to_zoned(&options.zone)?;
        let shape = match start {
            Instant::Date(_) => Shape::AllDay,
            Instant::Floating(_) => Shape::Floating,
            Instant::Zoned(_) => Shape::Zoned,
        };
        debug!(%rule, %start, ?shape, "iterating recurrence");
        let periods = Periods::new(rule, &dtstart);
        let pending_start = (options.synchronize_start && !periods.is_done()).then_some(dtstart);
        Ok(Self {
            rule,
            periods,
            shape,
            buffer: VecDeque::new(),
            pending_start,
            last: None,
            consumed: 0,
            returned: 0,
            limit: options.limit,
        })
    }

    pub fn rule(&self) -> &'r Rule {
        self.rule
    }

    /// True iff another instance can be returned without hitting COUNT,
    /// UNTIL, the end of the calendar or the safety limit.
    pub fn has_next(&mut self) -> bool {
        self.fill() && !self.limit_reached()
    }

    /// The next instance without consuming it.
    pub fn peek(&mut self) -> Option<Instant> {
        if !self.has_next() {
            return None;
        }
        self.buffer.front().map(|z| self.to_instant(z.clone()))
    }

    pub fn next_instance(&mut self) -> Result<Instant, RecurError> {
        if !self.fill() {
            return Err(RecurError::Exhausted);
        }
        if let Some(limit) = self.limit.filter(|_| self.limit_reached()) {
            debug!(limit, "safety limit reached");
            return Err(RecurError::SafetyBoundReached { limit });
        }
        let z = self.buffer.pop_front().ok_or(RecurError::Exhausted)?;
        self.consumed += 1;
        self.returned += 1;
        if self.count_reached() {
            debug!(count = self.consumed, "COUNT reached");
        }
        Ok(self.to_instant(z))
    }

    /// Skip every instance before `target`. Skipped instances still count
    /// toward `COUNT`, so the rest of the sequence is what repeated calls
    /// to [`RuleIter::next_instance`] would have produced.
    pub fn fast_forward(&mut self, target: &Instant) -> Result<(), RecurError> {
        let target = target
            .to_zoned(self.periods.zone())?
            .with_time_zone(self.periods.zone().clone());
        let ts = target.timestamp();
        let mut sought = false;
        while self.fill() {
            let Some(back) = self.buffer.back() else {
                break;
            };
            if back.timestamp() < ts {
                self.consumed += self.buffer.len() as u64;
                self.buffer.clear();
                // Without COUNT the skipped periods need not be expanded.
                if self.rule.count.is_none() && !sought {
                    self.periods.seek(target.datetime());
                    sought = true;
                }
                continue;
            }
            while self.buffer.front().is_some_and(|z| z.timestamp() < ts) {
                self.buffer.pop_front();
                self.consumed += 1;
            }
            break;
        }
        trace!(consumed = self.consumed, "fast-forwarded");
        Ok(())
    }

    fn count_reached(&self) -> bool {
        self.rule
            .count
            .is_some_and(|count| self.consumed >= u64::from(count))
    }

    fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.returned >= limit)
    }

    /// Make sure the buffer holds the next instance. False once the rule
    /// has no more instances.
    fn fill(&mut self) -> bool {
        if self.count_reached() {
            self.buffer.clear();
            return false;
        }
        if let Some(start) = self.pending_start.take() {
            self.admit(start);
        }
        while self.buffer.is_empty() {
            let Some(batch) = self.periods.next_period() else {
                return false;
            };
            for z in batch {
                self.admit(z);
            }
        }
        true
    }

    /// Queue `z` unless it would break strict ordering.
    fn admit(&mut self, z: Zoned) {
        if let Some(last) = &self.last {
            let stale = match self.shape {
                Shape::AllDay => z.date() <= last.date(),
                Shape::Floating | Shape::Zoned => z.timestamp() <= last.timestamp(),
            };
            if stale {
                trace!(instant = %z, "dropping repeated instance");
                return;
            }
        }
        self.last = Some(z.clone());
        self.buffer.push_back(z);
    }

    fn to_instant(&self, z: Zoned) -> Instant {
        match self.shape {
            Shape::AllDay => Instant::Date(z.date()),
            Shape::Floating => Instant::Floating(z.datetime()),
            Shape::Zoned => Instant::Zoned(z),
        }
    }
}

impl Iterator for RuleIter<'_> {
    type Item = Instant;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_instance().ok()
    }
}
