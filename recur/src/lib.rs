//! recur: RFC 5545 recurrence rules.
//!
//! Parses `RRULE` values such as `FREQ=WEEKLY;BYDAY=FR,SU;UNTIL=20220430T170000Z`
//! and enumerates the instances they denote from a start value.
//!
//! # Examples
//!
//! ```
//! use recur::{Instant, Rule};
//!
//! let rule: Rule = "FREQ=MONTHLY;BYDAY=-1FR;COUNT=3".parse().unwrap();
//! let start: Instant = "20240101T090000".parse().unwrap();
//! let fridays: Vec<String> = rule.iter(&start).unwrap().map(|i| i.to_string()).collect();
//! assert_eq!(fridays, ["20240126T090000", "20240223T090000", "20240329T090000"]);
//! ```

pub mod calendar;
pub mod display;
pub mod error;
pub mod eval;
pub mod expand;
pub mod instant;
pub mod iter;
pub mod lexer;
pub mod membership;
pub mod parser;
pub mod rule;

pub use error::{CalendarError, ParseError, ParseErrorKind, RecurError, Span};
pub use instant::{FixedZones, Instant, TzdbZones, ZoneResolver};
pub use iter::{IterOptions, RuleIter};
pub use membership::{matches, MatchOptions};
pub use parser::ParseOptions;
pub use rule::{Frequency, Rule, Weekday, WeekdayNum};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// --- Rule convenience methods ---

impl Rule {
    /// Parse a rule with strict RFC 5545 validation.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parser::parse(input)
    }

    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        parser::parse_with(input, options)
    }

    /// Iterate the instances starting at `start`, with floating and all-day
    /// values read in UTC.
    pub fn iter(&self, start: &Instant) -> Result<RuleIter<'_>, RecurError> {
        RuleIter::new(self, start, &IterOptions::default())
    }

    pub fn iter_with(
        &self,
        start: &Instant,
        options: &IterOptions,
    ) -> Result<RuleIter<'_>, RecurError> {
        RuleIter::new(self, start, options)
    }

    /// The first `n` instances.
    pub fn first_n(&self, start: &Instant, n: usize) -> Result<Vec<Instant>, RecurError> {
        Ok(self.iter(start)?.take(n).collect())
    }

    /// Whether an instance falls on `date` (civil, in the start's zone).
    pub fn occurs_on(&self, start: &Instant, date: jiff::civil::Date) -> Result<bool, RecurError> {
        membership::occurs_on(self, start, date, &MatchOptions::default())
    }
}

impl FromStr for Rule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl Serialize for Rule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;

        map.serialize_entry("rule", &self.to_string())?;
        map.serialize_entry("freq", &self.freq)?;
        map.serialize_entry("interval", &self.interval)?;
        map.serialize_entry("count", &self.count)?;
        map.serialize_entry("until", &self.until)?;
        map.serialize_entry("wkst", &self.week_start)?;

        // BY-parts appear only when present, under their RFC names.
        serialize_list(&mut map, "bymonth", &self.by_month)?;
        serialize_list(&mut map, "byweekno", &self.by_week_no)?;
        serialize_list(&mut map, "byyearday", &self.by_year_day)?;
        serialize_list(&mut map, "bymonthday", &self.by_month_day)?;
        serialize_list(&mut map, "byday", &self.by_day)?;
        serialize_list(&mut map, "byhour", &self.by_hour)?;
        serialize_list(&mut map, "byminute", &self.by_minute)?;
        serialize_list(&mut map, "bysecond", &self.by_second)?;
        serialize_list(&mut map, "bysetpos", &self.by_set_pos)?;

        map.end()
    }
}

#[cfg(feature = "serde")]
fn serialize_list<M, T>(map: &mut M, name: &str, values: &[T]) -> Result<(), M::Error>
where
    M: serde::ser::SerializeMap,
    T: Serialize,
{
    if values.is_empty() {
        return Ok(());
    }
    map.serialize_entry(name, values)
}

#[cfg(feature = "serde")]
impl Serialize for WeekdayNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Rule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Deserialize from the rule string
        let s = String::deserialize(deserializer)?;
        Rule::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "serde")]
macro_rules! serde_as_string {
    ($($ty:ty => $parse:expr),* $(,)?) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let parse: fn(&str) -> Option<$ty> = $parse;
                parse(&s).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid {}: '{s}'", stringify!($ty)))
                })
            }
        }
    )*};
}

#[cfg(feature = "serde")]
serde_as_string! {
    Instant => |s| Instant::parse(s).ok(),
    Frequency => Frequency::parse,
    Weekday => Weekday::parse,
}
