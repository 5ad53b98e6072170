//! "Does this rule occur on that day?"
//!
//! A thin consumer of the iterator: a query date matches when some instance
//! falls on it, as a civil date in the start value's own zone.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use tracing::trace;

use crate::error::RecurError;
use crate::instant::Instant;
use crate::iter::{IterOptions, RuleIter};
use crate::parser::{parse_with, ParseOptions};
use crate::rule::Rule;

#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Instances to examine before giving up on an infinite rule.
    pub limit: usize,
    pub parse: ParseOptions,
    /// Zone for floating and all-day start values.
    pub zone: TimeZone,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            limit: 1000,
            parse: ParseOptions::default(),
            zone: TimeZone::UTC,
        }
    }
}

/// Parse `rule_text` and check whether it occurs on `query`.
///
/// The start date itself always matches, even when the rule would not emit
/// it (for instance when UNTIL precedes the start).
pub fn matches(rule_text: &str, start: &Instant, query: Date) -> Result<bool, RecurError> {
    matches_with(rule_text, start, query, &MatchOptions::default())
}

pub fn matches_with(
    rule_text: &str,
    start: &Instant,
    query: Date,
    options: &MatchOptions,
) -> Result<bool, RecurError> {
    if start.date() == query {
        return Ok(true);
    }
    let rule = parse_with(rule_text, &options.parse)?;
    occurs_on(&rule, start, query, options)
}

/// True if an instance of `rule` falls on `query`, without the start-date
/// shortcut of [`matches`].
pub fn occurs_on(
    rule: &Rule,
    start: &Instant,
    query: Date,
    options: &MatchOptions,
) -> Result<bool, RecurError> {
    let iter_options = IterOptions {
        limit: rule.is_infinite().then_some(options.limit),
        zone: options.zone.clone(),
        ..IterOptions::default()
    };
    let mut it = RuleIter::new(rule, start, &iter_options)?;
    loop {
        match it.next_instance() {
            Ok(instance) => {
                let day = instance.date();
                if day == query {
                    return Ok(true);
                }
                if day > query {
                    return Ok(false);
                }
            }
            Err(RecurError::Exhausted) => return Ok(false),
            Err(RecurError::SafetyBoundReached { limit }) => {
                trace!(limit, "gave up looking for a match");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }
    }
}
