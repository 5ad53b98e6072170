use crate::instant::Instant;

/// A parsed, validated RFC 5545 recurrence rule.
///
/// A `Rule` is immutable once built by [`crate::parser::parse`]. BY-part lists
/// are stored sorted and de-duplicated, so two rules that differ only in part
/// or value order compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub(crate) freq: Frequency,
    pub(crate) interval: u32,
    pub(crate) week_start: Weekday,
    pub(crate) count: Option<u32>,
    pub(crate) until: Option<Instant>,
    pub(crate) by_month: Vec<i8>,
    pub(crate) by_week_no: Vec<i8>,
    pub(crate) by_year_day: Vec<i16>,
    pub(crate) by_month_day: Vec<i8>,
    pub(crate) by_day: Vec<WeekdayNum>,
    pub(crate) by_hour: Vec<i8>,
    pub(crate) by_minute: Vec<i8>,
    pub(crate) by_second: Vec<i8>,
    pub(crate) by_set_pos: Vec<i16>,
}

impl Rule {
    /// A rule with only a frequency and every other part at its default.
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            week_start: Weekday::Monday,
            count: None,
            until: None,
            by_month: Vec::new(),
            by_week_no: Vec::new(),
            by_year_day: Vec::new(),
            by_month_day: Vec::new(),
            by_day: Vec::new(),
            by_hour: Vec::new(),
            by_minute: Vec::new(),
            by_second: Vec::new(),
            by_set_pos: Vec::new(),
        }
    }

    pub fn freq(&self) -> Frequency {
        self.freq
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn count(&self) -> Option<u32> {
        self.count
    }

    pub fn until(&self) -> Option<&Instant> {
        self.until.as_ref()
    }

    pub fn by_month(&self) -> &[i8] {
        &self.by_month
    }

    pub fn by_week_no(&self) -> &[i8] {
        &self.by_week_no
    }

    pub fn by_year_day(&self) -> &[i16] {
        &self.by_year_day
    }

    pub fn by_month_day(&self) -> &[i8] {
        &self.by_month_day
    }

    pub fn by_day(&self) -> &[WeekdayNum] {
        &self.by_day
    }

    pub fn by_hour(&self) -> &[i8] {
        &self.by_hour
    }

    pub fn by_minute(&self) -> &[i8] {
        &self.by_minute
    }

    pub fn by_second(&self) -> &[i8] {
        &self.by_second
    }

    pub fn by_set_pos(&self) -> &[i16] {
        &self.by_set_pos
    }

    /// A rule without COUNT and UNTIL recurs forever.
    pub fn is_infinite(&self) -> bool {
        self.count.is_none() && self.until.is_none()
    }

    /// True if any BY-part other than BYSETPOS is present.
    pub fn has_by_parts(&self) -> bool {
        !(self.by_month.is_empty()
            && self.by_week_no.is_empty()
            && self.by_year_day.is_empty()
            && self.by_month_day.is_empty()
            && self.by_day.is_empty()
            && self.by_hour.is_empty()
            && self.by_minute.is_empty()
            && self.by_second.is_empty())
    }

    /// True if any BYDAY entry carries an ordinal (`2MO`, `-1FR`).
    pub fn has_numbered_days(&self) -> bool {
        self.by_day.iter().any(|d| d.ordinal.is_some())
    }
}

/// Recurrence frequency, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Case-insensitive lookup of a `FREQ` value.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }

    /// Frequencies finer than a day.
    pub fn is_sub_daily(self) -> bool {
        self < Self::Daily
    }

    /// Length of one step in seconds, for sub-daily frequencies.
    pub(crate) fn seconds(self) -> Option<i64> {
        match self {
            Self::Secondly => Some(1),
            Self::Minutely => Some(60),
            Self::Hourly => Some(3600),
            _ => None,
        }
    }
}

/// Day of the week, Monday first.
///
/// The numbering is fixed once here: [`Weekday::number`] is the ISO 8601 day
/// number (Monday=1 .. Sunday=7), and conversion to and from
/// `jiff::civil::Weekday` goes through the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// The RFC 5545 two-letter token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            "SU" => Self::Sunday,
            _ => return None,
        })
    }

    pub fn to_jiff(self) -> jiff::civil::Weekday {
        match self {
            Self::Monday => jiff::civil::Weekday::Monday,
            Self::Tuesday => jiff::civil::Weekday::Tuesday,
            Self::Wednesday => jiff::civil::Weekday::Wednesday,
            Self::Thursday => jiff::civil::Weekday::Thursday,
            Self::Friday => jiff::civil::Weekday::Friday,
            Self::Saturday => jiff::civil::Weekday::Saturday,
            Self::Sunday => jiff::civil::Weekday::Sunday,
        }
    }

    pub fn from_jiff(wd: jiff::civil::Weekday) -> Self {
        match wd {
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
            jiff::civil::Weekday::Sunday => Self::Sunday,
        }
    }

    /// ISO 8601 day number: Monday=1, Sunday=7.
    pub fn number(self) -> u8 {
        match self {
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Monday),
            2 => Some(Self::Tuesday),
            3 => Some(Self::Wednesday),
            4 => Some(Self::Thursday),
            5 => Some(Self::Friday),
            6 => Some(Self::Saturday),
            7 => Some(Self::Sunday),
            _ => None,
        }
    }

    /// Days from `self` forward to `other`, in `0..7`.
    pub fn days_until(self, other: Weekday) -> i8 {
        (other.number() as i8 - self.number() as i8).rem_euclid(7)
    }

    pub fn all() -> [Self; 7] {
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

/// A `BYDAY` entry: a weekday with an optional ordinal.
///
/// `MO` is every Monday of the period, `2MO` the second Monday and `-1FR`
/// the last Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// Returns `None` for ordinal 0 or anything outside `-53..=53`.
    pub fn nth(ordinal: i8, weekday: Weekday) -> Option<Self> {
        (ordinal != 0 && (-53..=53).contains(&ordinal)).then_some(Self {
            ordinal: Some(ordinal),
            weekday,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_numbering_matches_jiff() {
        for wd in Weekday::all() {
            assert_eq!(Weekday::from_jiff(wd.to_jiff()), wd);
            assert_eq!(wd.to_jiff().to_monday_one_offset() as u8, wd.number());
            assert_eq!(Weekday::from_number(wd.number()), Some(wd));
        }
        assert_eq!(Weekday::from_number(0), None);
        assert_eq!(Weekday::from_number(8), None);
    }

    #[test]
    fn days_until_wraps() {
        assert_eq!(Weekday::Monday.days_until(Weekday::Monday), 0);
        assert_eq!(Weekday::Monday.days_until(Weekday::Sunday), 6);
        assert_eq!(Weekday::Sunday.days_until(Weekday::Monday), 1);
        assert_eq!(Weekday::Friday.days_until(Weekday::Tuesday), 4);
    }

    #[test]
    fn frequency_tokens_are_case_insensitive() {
        assert_eq!(Frequency::parse("weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse("YeArLy"), Some(Frequency::Yearly));
        assert_eq!(Frequency::parse("fortnightly"), None);
        assert!(Frequency::Hourly.is_sub_daily());
        assert!(!Frequency::Daily.is_sub_daily());
    }

    #[test]
    fn nth_rejects_zero_and_out_of_range() {
        assert!(WeekdayNum::nth(0, Weekday::Monday).is_none());
        assert!(WeekdayNum::nth(54, Weekday::Monday).is_none());
        assert!(WeekdayNum::nth(-53, Weekday::Monday).is_some());
    }

    #[test]
    fn new_rule_is_infinite_with_defaults() {
        let rule = Rule::new(Frequency::Daily);
        assert_eq!(rule.interval(), 1);
        assert_eq!(rule.week_start(), Weekday::Monday);
        assert!(rule.is_infinite());
        assert!(!rule.has_by_parts());
    }
}
