use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use jiff::civil::{Date, DateTime, Time};
use jiff::tz::{self, TimeZone};
use jiff::Zoned;

use crate::calendar;
use crate::error::{CalendarError, ParseError, ParseErrorKind, RecurError, Span};

/// A point on the calendar as it appears in iCalendar data.
///
/// Rules and their instances use three shapes of value: an all-day date
/// (`19970902`), a floating civil date-time with no zone (`19970902T090000`),
/// and a date-time pinned to a zone (`19970902T090000Z`, or a civil value
/// paired with a zone id).
///
/// Two zoned values are equal when they denote the same absolute instant,
/// whatever their zones. Values of different shapes are never equal, and
/// only comparable when both are civil (date or floating).
#[derive(Debug, Clone)]
pub enum Instant {
    Date(Date),
    Floating(DateTime),
    Zoned(Zoned),
}

impl Instant {
    /// Parse `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`.
    ///
    /// A zoned value printed by [`Instant`]'s `Display` impl
    /// (`20211216T000000[+08:00]`) parses back to the same instant.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_literal(input).map_err(|message| {
            ParseError::new(
                ParseErrorKind::MalformedValue,
                message,
                Span::new(0, input.len()),
                input,
            )
        })
    }

    /// Parse a literal that carries a zone id (an iCalendar `TZID`).
    ///
    /// Dates stay all-day. A floating value is interpreted as civil time in
    /// the zone and a UTC value is converted into it.
    pub fn parse_in(
        input: &str,
        tzid: &str,
        zones: &dyn ZoneResolver,
    ) -> Result<Self, RecurError> {
        let zone = zones.resolve(tzid)?;
        Ok(Self::parse(input)?.with_zone(&zone)?)
    }

    /// Re-interpret this value in `zone`, following the same rules as
    /// [`Instant::parse_in`].
    pub fn with_zone(&self, zone: &TimeZone) -> Result<Self, CalendarError> {
        Ok(match self {
            Self::Date(d) => Self::Date(*d),
            Self::Floating(dt) => Self::Zoned(calendar::localize_lenient(*dt, zone)?),
            Self::Zoned(z) => Self::Zoned(z.with_time_zone(zone.clone())),
        })
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Self::Floating(_))
    }

    /// The civil date-time as seen in the value's own zone. Dates read as
    /// midnight.
    pub fn datetime(&self) -> DateTime {
        match self {
            Self::Date(d) => d.to_datetime(Time::midnight()),
            Self::Floating(dt) => *dt,
            Self::Zoned(z) => z.datetime(),
        }
    }

    /// The civil date in the value's own zone.
    pub fn date(&self) -> Date {
        self.datetime().date()
    }

    pub fn time_zone(&self) -> Option<&TimeZone> {
        match self {
            Self::Zoned(z) => Some(z.time_zone()),
            _ => None,
        }
    }

    /// Pin the value to an absolute instant. Zoned values keep their own
    /// zone; civil values are read in `fallback`.
    pub fn to_zoned(&self, fallback: &TimeZone) -> Result<Zoned, CalendarError> {
        match self {
            Self::Zoned(z) => Ok(z.clone()),
            other => calendar::localize_lenient(other.datetime(), fallback),
        }
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Floating(a), Self::Floating(b)) => a == b,
            (Self::Zoned(a), Self::Zoned(b)) => a.timestamp() == b.timestamp(),
            _ => false,
        }
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Zoned(a), Self::Zoned(b)) => Some(a.timestamp().cmp(&b.timestamp())),
            (Self::Zoned(_), _) | (_, Self::Zoned(_)) => None,
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (a, b) => Some(a.datetime().cmp(&b.datetime())),
        }
    }
}

impl From<Date> for Instant {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime> for Instant {
    fn from(dt: DateTime) -> Self {
        Self::Floating(dt)
    }
}

impl From<Zoned> for Instant {
    fn from(z: Zoned) -> Self {
        Self::Zoned(z)
    }
}

impl FromStr for Instant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write_date(f, *d),
            Self::Floating(dt) => write_datetime(f, *dt),
            Self::Zoned(z) => {
                let name = calendar::zone_name(z.time_zone());
                if name == "UTC" {
                    write_datetime(f, z.datetime())?;
                    f.write_str("Z")
                } else {
                    write_datetime(f, z.datetime())?;
                    write!(f, "[{name}]")
                }
            }
        }
    }
}

fn write_date(f: &mut fmt::Formatter<'_>, d: Date) -> fmt::Result {
    write!(f, "{:04}{:02}{:02}", d.year(), d.month(), d.day())
}

fn write_datetime(f: &mut fmt::Formatter<'_>, dt: DateTime) -> fmt::Result {
    write_date(f, dt.date())?;
    write!(f, "T{:02}{:02}{:02}", dt.hour(), dt.minute(), dt.second())
}

/// Parse an iCalendar DATE or DATE-TIME literal, returning a message on
/// failure so callers can attach their own span.
pub(crate) fn parse_literal(text: &str) -> Result<Instant, String> {
    if let Some(body) = text.strip_suffix(']') {
        let (value, zone) = body
            .split_once('[')
            .ok_or_else(|| format!("unbalanced zone brackets in '{text}'"))?;
        let zone = TzdbZones.resolve(zone).map_err(|e| e.to_string())?;
        return match parse_literal(value)? {
            Instant::Floating(dt) => calendar::localize_lenient(dt, &zone)
                .map(Instant::Zoned)
                .map_err(|e| e.to_string()),
            _ => Err(format!("a zone suffix needs a local date-time, got '{value}'")),
        };
    }

    let bytes = text.as_bytes();
    let digits = |range: std::ops::Range<usize>| -> Result<i64, String> {
        let part = &text[range];
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse::<i64>().map_err(|e| e.to_string())
        } else {
            Err(format!("expected digits in '{text}'"))
        }
    };
    if !text.is_ascii() || !(bytes.len() == 8 || bytes.len() == 15 || bytes.len() == 16) {
        return Err(format!(
            "expected YYYYMMDD or YYYYMMDDTHHMMSS[Z], got '{text}'"
        ));
    }

    let date = Date::new(digits(0..4)? as i16, digits(4..6)? as i8, digits(6..8)? as i8)
        .map_err(|e| format!("invalid date '{text}': {e}"))?;
    if bytes.len() == 8 {
        return Ok(Instant::Date(date));
    }
    if !bytes[8].eq_ignore_ascii_case(&b'T') {
        return Err(format!("expected 'T' between date and time in '{text}'"));
    }
    let time = Time::new(
        digits(9..11)? as i8,
        digits(11..13)? as i8,
        digits(13..15)? as i8,
        0,
    )
    .map_err(|e| format!("invalid time '{text}': {e}"))?;
    let dt = date.to_datetime(time);
    match bytes.get(15) {
        None => Ok(Instant::Floating(dt)),
        Some(b) if b.eq_ignore_ascii_case(&b'Z') => calendar::localize(dt, &TimeZone::UTC)
            .map(Instant::Zoned)
            .map_err(|e| e.to_string()),
        Some(_) => Err(format!("unexpected trailing character in '{text}'")),
    }
}

/// Maps zone identifiers to time zones.
pub trait ZoneResolver {
    fn resolve(&self, id: &str) -> Result<TimeZone, CalendarError>;
}

/// Resolves UTC and fixed-offset zone ids without a time zone database.
///
/// Accepts `UTC`, `Z`, `GMT`, and offsets written as `GMT+8`, `UTC-05:30`,
/// `+0800` or `+08:00`. `GMT+8` means eight hours *ahead* of UTC, the way
/// most calendar software reads it, not the inverted POSIX `Etc/GMT+8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedZones;

impl ZoneResolver for FixedZones {
    fn resolve(&self, id: &str) -> Result<TimeZone, CalendarError> {
        parse_fixed(id).ok_or_else(|| CalendarError::UnknownTimeZone(id.to_string()))
    }
}

fn parse_fixed(id: &str) -> Option<TimeZone> {
    if !id.is_ascii() {
        return None;
    }
    let upper = id.trim().to_ascii_uppercase();
    let rest = match upper.as_str() {
        "UTC" | "Z" | "GMT" | "ETC/UTC" => return Some(TimeZone::UTC),
        s => s
            .strip_prefix("GMT")
            .or_else(|| s.strip_prefix("UTC"))
            .unwrap_or(s),
    };
    let (sign, rest) = match rest.as_bytes().first()? {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() > 2 => rest.split_at(rest.len() - 2),
        None => (rest, "0"),
    };
    if hours.is_empty() || hours.len() > 2 || minutes.is_empty() || minutes.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    let offset = tz::Offset::from_seconds(sign * (hours * 3600 + minutes * 60)).ok()?;
    Some(TimeZone::fixed(offset))
}

/// Resolves fixed-offset ids first, then IANA names from the system (or
/// bundled) time zone database.
#[derive(Debug, Clone, Copy, Default)]
pub struct TzdbZones;

impl ZoneResolver for TzdbZones {
    fn resolve(&self, id: &str) -> Result<TimeZone, CalendarError> {
        if let Some(zone) = parse_fixed(id) {
            return Ok(zone);
        }
        TimeZone::get(id).map_err(|_| CalendarError::UnknownTimeZone(id.to_string()))
    }
}
