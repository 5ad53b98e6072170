// Parser for RFC 5545 RECUR values (`FREQ=...;BYDAY=...`).
// Two passes: the token stream is grouped into raw `NAME=VALUE,...` parts,
// then each part is checked and folded into a `Rule`.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::error::{ParseError, ParseErrorKind, Span};
use crate::instant;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::rule::{Frequency, Rule, Weekday, WeekdayNum};

/// Parser switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject anything invalid. When false, invalid items, unknown parts and
    /// parts that do not fit the frequency are dropped with a warning.
    pub strict: bool,
    /// Accept RFC 2445 rules: skip the frequency compatibility table and
    /// ignore `X-` extension parts.
    pub rfc2445_compat: bool,
    /// Allow `BYSETPOS` without any other BY-part.
    pub allow_by_set_pos_alone: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict: true,
            rfc2445_compat: false,
            allow_by_set_pos_alone: false,
        }
    }
}

impl ParseOptions {
    pub fn lax() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    pub fn rfc2445() -> Self {
        Self {
            rfc2445_compat: true,
            ..Self::default()
        }
    }
}

/// Parse a rule with the default (strict RFC 5545) options.
pub fn parse(input: &str) -> Result<Rule, ParseError> {
    parse_with(input, &ParseOptions::default())
}

#[tracing::instrument(level = "debug", skip(input, options), fields(input_len = input.len()))]
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Rule, ParseError> {
    let tokens = Lexer::new(input).tokenize()?;
    trace!(tokens = tokens.len(), "tokenized");
    let mut parser = Parser::new(&tokens, input, options);
    let parts = parser.parse_parts()?;
    let rule = parser.build(&parts)?;
    debug!(freq = rule.freq.as_str(), parts = parts.len(), "parsed recurrence rule");
    Ok(rule)
}

/// The rule part names RFC 5545 defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PartName {
    Freq,
    Until,
    Count,
    Interval,
    BySecond,
    ByMinute,
    ByHour,
    ByDay,
    ByMonthDay,
    ByYearDay,
    ByWeekNo,
    ByMonth,
    BySetPos,
    Wkst,
}

impl PartName {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "FREQ" => Self::Freq,
            "UNTIL" => Self::Until,
            "COUNT" => Self::Count,
            "INTERVAL" => Self::Interval,
            "BYSECOND" => Self::BySecond,
            "BYMINUTE" => Self::ByMinute,
            "BYHOUR" => Self::ByHour,
            "BYDAY" => Self::ByDay,
            "BYMONTHDAY" => Self::ByMonthDay,
            "BYYEARDAY" => Self::ByYearDay,
            "BYWEEKNO" => Self::ByWeekNo,
            "BYMONTH" => Self::ByMonth,
            "BYSETPOS" => Self::BySetPos,
            "WKST" => Self::Wkst,
            _ => return None,
        })
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Freq => "FREQ",
            Self::Until => "UNTIL",
            Self::Count => "COUNT",
            Self::Interval => "INTERVAL",
            Self::BySecond => "BYSECOND",
            Self::ByMinute => "BYMINUTE",
            Self::ByHour => "BYHOUR",
            Self::ByDay => "BYDAY",
            Self::ByMonthDay => "BYMONTHDAY",
            Self::ByYearDay => "BYYEARDAY",
            Self::ByWeekNo => "BYWEEKNO",
            Self::ByMonth => "BYMONTH",
            Self::BySetPos => "BYSETPOS",
            Self::Wkst => "WKST",
        }
    }
}

/// Allowed magnitudes for a numeric list part. Signed parts accept
/// `-max..=-min` as well.
#[derive(Clone, Copy)]
struct Bounds {
    min: i64,
    max: i64,
    signed: bool,
}

const fn unsigned(min: i64, max: i64) -> Bounds {
    Bounds {
        min,
        max,
        signed: false,
    }
}

const fn signed(max: i64) -> Bounds {
    Bounds {
        min: 1,
        max,
        signed: true,
    }
}

struct Value {
    text: String,
    span: Span,
}

struct RawPart {
    name: String,
    span: Span,
    values: Vec<Value>,
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input: &'a str,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], input: &'a str, options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            input,
            options,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn current_span(&self) -> Span {
        match self.peek() {
            Some(tok) => tok.span,
            None => Span::new(self.input.len(), self.input.len()),
        }
    }

    fn error(&self, kind: ParseErrorKind, message: String, span: Span) -> ParseError {
        ParseError::new(kind, message, span, self.input)
    }

    /// In strict mode, fail. Otherwise log and let the caller drop the item.
    fn reject(&self, kind: ParseErrorKind, message: String, span: Span) -> Result<(), ParseError> {
        if self.options.strict {
            return Err(self.error(kind, message, span));
        }
        warn!(%kind, %span, "{message}; ignoring");
        Ok(())
    }

    // --- Pass 1: token stream to raw parts ---

    // rule = part *(";" part) [";"]
    fn parse_parts(&mut self) -> Result<Vec<RawPart>, ParseError> {
        let mut parts = Vec::new();
        while let Some(tok) = self.peek() {
            match &tok.kind {
                TokenKind::Semicolon => {
                    return Err(self.error(
                        ParseErrorKind::MalformedValue,
                        "empty rule part".into(),
                        tok.span,
                    ))
                }
                TokenKind::Word(_) => parts.push(self.parse_part()?),
                _ => {
                    return Err(self.error(
                        ParseErrorKind::MalformedValue,
                        "expected a rule part name".into(),
                        tok.span,
                    ))
                }
            }
            match self.peek() {
                None => break,
                Some(Token {
                    kind: TokenKind::Semicolon,
                    ..
                }) => self.advance(),
                Some(tok) => {
                    return Err(self.error(
                        ParseErrorKind::MalformedValue,
                        "expected ';' between rule parts".into(),
                        tok.span,
                    ))
                }
            }
        }
        Ok(parts)
    }

    // part = name "=" value *("," value)
    fn parse_part(&mut self) -> Result<RawPart, ParseError> {
        let (name, name_span) = match self.peek() {
            Some(Token {
                kind: TokenKind::Word(w),
                span,
            }) => (w.to_ascii_uppercase(), *span),
            _ => {
                return Err(self.error(
                    ParseErrorKind::MalformedValue,
                    "expected a rule part name".into(),
                    self.current_span(),
                ))
            }
        };
        self.advance();

        match self.peek() {
            Some(Token {
                kind: TokenKind::Equals,
                ..
            }) => self.advance(),
            _ => {
                return Err(self.error(
                    ParseErrorKind::MalformedValue,
                    format!("expected '=' after '{name}'"),
                    self.current_span(),
                ))
            }
        }

        let mut values = Vec::new();
        let mut end = self.current_span().start;
        loop {
            match self.peek() {
                Some(Token {
                    kind: TokenKind::Word(text),
                    span,
                }) => {
                    values.push(Value {
                        text: text.clone(),
                        span: *span,
                    });
                    end = span.end;
                    self.advance();
                }
                Some(Token {
                    kind: TokenKind::Equals,
                    span,
                }) => {
                    return Err(self.error(
                        ParseErrorKind::MalformedValue,
                        "unexpected '='".into(),
                        *span,
                    ))
                }
                _ => {
                    let span = self.current_span();
                    self.reject(
                        ParseErrorKind::EmptyList,
                        format!("empty value in {name}"),
                        Span::new(span.start, span.start),
                    )?;
                }
            }
            match self.peek() {
                Some(Token {
                    kind: TokenKind::Comma,
                    span,
                }) => {
                    end = span.end;
                    self.advance();
                }
                _ => break,
            }
        }

        Ok(RawPart {
            name,
            span: Span::new(name_span.start, end),
            values,
        })
    }

    // --- Pass 2: raw parts to a validated rule ---

    fn build(&self, parts: &[RawPart]) -> Result<Rule, ParseError> {
        let mut rule = Rule::new(Frequency::Daily);
        let mut freq = None;
        let mut seen: HashMap<PartName, Span> = HashMap::new();

        for part in parts {
            let Some(key) = PartName::parse(&part.name) else {
                if self.options.rfc2445_compat && part.name.starts_with("X-") {
                    debug!(name = %part.name, "skipping extension part");
                    continue;
                }
                self.reject(
                    ParseErrorKind::UnknownPart,
                    format!("unknown rule part '{}'", part.name),
                    part.span,
                )?;
                continue;
            };
            if seen.contains_key(&key) {
                return Err(self.error(
                    ParseErrorKind::DuplicatePart,
                    format!("{} appears more than once", key.as_str()),
                    part.span,
                ));
            }
            seen.insert(key, part.span);

            match key {
                PartName::Freq => {
                    if let Some(v) = self.single(part)? {
                        match Frequency::parse(&v.text) {
                            Some(f) => freq = Some(f),
                            None => self.reject(
                                ParseErrorKind::MalformedValue,
                                format!("unknown frequency '{}'", v.text),
                                v.span,
                            )?,
                        }
                    }
                }
                PartName::Until => {
                    if let Some(v) = self.single(part)? {
                        match instant::parse_literal(&v.text) {
                            Ok(until) => rule.until = Some(until),
                            Err(message) => {
                                self.reject(ParseErrorKind::MalformedValue, message, v.span)?
                            }
                        }
                    }
                }
                PartName::Count => {
                    if let Some(v) = self.single(part)? {
                        rule.count = self.positive(key.as_str(), v)?;
                    }
                }
                PartName::Interval => {
                    if let Some(v) = self.single(part)? {
                        rule.interval = self.positive(key.as_str(), v)?.unwrap_or(1);
                    }
                }
                PartName::Wkst => {
                    if let Some(v) = self.single(part)? {
                        match Weekday::parse(&v.text) {
                            Some(wd) => rule.week_start = wd,
                            None => self.reject(
                                ParseErrorKind::MalformedValue,
                                format!("unknown weekday '{}'", v.text),
                                v.span,
                            )?,
                        }
                    }
                }
                PartName::BySecond => rule.by_second = self.ints(part, unsigned(0, 60))?,
                PartName::ByMinute => rule.by_minute = self.ints(part, unsigned(0, 59))?,
                PartName::ByHour => rule.by_hour = self.ints(part, unsigned(0, 23))?,
                PartName::ByMonth => rule.by_month = self.ints(part, unsigned(1, 12))?,
                PartName::ByMonthDay => rule.by_month_day = self.ints(part, signed(31))?,
                PartName::ByYearDay => rule.by_year_day = self.ints(part, signed(366))?,
                PartName::ByWeekNo => rule.by_week_no = self.ints(part, signed(53))?,
                PartName::BySetPos => rule.by_set_pos = self.ints(part, signed(366))?,
                PartName::ByDay => {
                    let mut days = Vec::new();
                    for v in &part.values {
                        if let Some(d) = self.weekday_num(v)? {
                            days.push(d);
                        }
                    }
                    days.sort();
                    days.dedup();
                    rule.by_day = days;
                }
            }
        }

        rule.freq = match freq {
            Some(f) => f,
            None => {
                let end = self.input.len();
                return Err(self.error(
                    ParseErrorKind::MissingFreq,
                    "a recurrence rule needs a FREQ part".into(),
                    Span::new(end, end),
                ));
            }
        };
        self.validate(&mut rule, &seen)?;
        Ok(rule)
    }

    /// Cross-part checks, run once every part has been read.
    fn validate(&self, rule: &mut Rule, seen: &HashMap<PartName, Span>) -> Result<(), ParseError> {
        let span_of = |key: PartName| seen.get(&key).copied().unwrap_or(Span::new(0, 0));

        if rule.count.is_some() && rule.until.is_some() {
            let later = span_of(PartName::Count).max_by_start(span_of(PartName::Until));
            self.reject(
                ParseErrorKind::CountAndUntil,
                "COUNT and UNTIL cannot both be set".into(),
                later,
            )?;
            rule.count = None;
        }

        if !self.options.rfc2445_compat {
            let freq = rule.freq;
            if !rule.by_week_no.is_empty() && freq != Frequency::Yearly {
                self.incompatible("BYWEEKNO", freq, span_of(PartName::ByWeekNo))?;
                rule.by_week_no.clear();
            }
            if !rule.by_year_day.is_empty()
                && matches!(freq, Frequency::Daily | Frequency::Weekly | Frequency::Monthly)
            {
                self.incompatible("BYYEARDAY", freq, span_of(PartName::ByYearDay))?;
                rule.by_year_day.clear();
            }
            if !rule.by_month_day.is_empty() && freq == Frequency::Weekly {
                self.incompatible("BYMONTHDAY", freq, span_of(PartName::ByMonthDay))?;
                rule.by_month_day.clear();
            }
        }

        let ordinals_allowed = rule.freq == Frequency::Monthly
            || (rule.freq == Frequency::Yearly && rule.by_week_no.is_empty());
        if rule.has_numbered_days() && !ordinals_allowed {
            let message = if rule.freq == Frequency::Yearly {
                "numbered BYDAY entries cannot be combined with BYWEEKNO".to_string()
            } else {
                format!(
                    "numbered BYDAY entries need FREQ=MONTHLY or FREQ=YEARLY, not {}",
                    rule.freq.as_str()
                )
            };
            self.reject(ParseErrorKind::OrdinalNotAllowed, message, span_of(PartName::ByDay))?;
            rule.by_day.retain(|d| d.ordinal.is_none());
        }

        if !rule.by_set_pos.is_empty() && !rule.has_by_parts() && !self.options.allow_by_set_pos_alone
        {
            self.reject(
                ParseErrorKind::IncompatibleParts,
                "BYSETPOS needs at least one other BY-part".into(),
                span_of(PartName::BySetPos),
            )?;
            rule.by_set_pos.clear();
        }
        Ok(())
    }

    fn incompatible(&self, part: &str, freq: Frequency, span: Span) -> Result<(), ParseError> {
        self.reject(
            ParseErrorKind::IncompatibleParts,
            format!("{part} cannot be used with FREQ={}", freq.as_str()),
            span,
        )
    }

    /// The value of a part that takes exactly one.
    fn single<'p>(&self, part: &'p RawPart) -> Result<Option<&'p Value>, ParseError> {
        if let Some(extra) = part.values.get(1) {
            self.reject(
                ParseErrorKind::MalformedValue,
                format!("{} takes a single value", part.name),
                extra.span,
            )?;
        }
        Ok(part.values.first())
    }

    fn positive(&self, name: &str, v: &Value) -> Result<Option<u32>, ParseError> {
        let Some(n) = self.int(name, v, unsigned(1, i64::from(u32::MAX)))? else {
            return Ok(None);
        };
        Ok(u32::try_from(n).ok())
    }

    /// A sorted, de-duplicated numeric list.
    fn ints<T>(&self, part: &RawPart, bounds: Bounds) -> Result<Vec<T>, ParseError>
    where
        T: TryFrom<i64> + Ord,
    {
        let mut out = Vec::with_capacity(part.values.len());
        for v in &part.values {
            if let Some(n) = self.int(&part.name, v, bounds)? {
                if let Ok(n) = T::try_from(n) {
                    out.push(n);
                }
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    fn int(&self, name: &str, v: &Value, bounds: Bounds) -> Result<Option<i64>, ParseError> {
        let text = v.text.as_str();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'+') if bounds.signed => (false, &text[1..]),
            Some(b'-') if bounds.signed => (true, &text[1..]),
            _ => (false, text),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            self.reject(
                ParseErrorKind::MalformedValue,
                format!("'{text}' is not a valid {name} value"),
                v.span,
            )?;
            return Ok(None);
        }
        // Digits only, so the parse fails on overflow alone.
        let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
        if !(bounds.min..=bounds.max).contains(&magnitude) {
            let range = if bounds.signed {
                format!("±{}..{}", bounds.min, bounds.max)
            } else {
                format!("{}..{}", bounds.min, bounds.max)
            };
            self.reject(
                ParseErrorKind::OutOfRange,
                format!("{name} value {text} is outside {range}"),
                v.span,
            )?;
            return Ok(None);
        }
        Ok(Some(if negative { -magnitude } else { magnitude }))
    }

    // weekdaynum = [[plus / minus] ordwk] weekday
    fn weekday_num(&self, v: &Value) -> Result<Option<WeekdayNum>, ParseError> {
        let text = v.text.as_str();
        let split = text.len().saturating_sub(2);
        let (prefix, day) = text.split_at(split);
        let Some(weekday) = Weekday::parse(day) else {
            self.reject(
                ParseErrorKind::MalformedValue,
                format!("'{text}' is not a weekday"),
                v.span,
            )?;
            return Ok(None);
        };
        if prefix.is_empty() {
            return Ok(Some(WeekdayNum::every(weekday)));
        }
        let ordinal = Value {
            text: prefix.to_string(),
            span: Span::new(v.span.start, v.span.start + prefix.len()),
        };
        Ok(self
            .int("BYDAY", &ordinal, signed(53))?
            .and_then(|n| WeekdayNum::nth(n as i8, weekday)))
    }
}

trait SpanExt {
    fn max_by_start(self, other: Span) -> Span;
}

impl SpanExt for Span {
    fn max_by_start(self, other: Span) -> Span {
        if other.start > self.start {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::Instant;
    use jiff::civil::date;

    fn kind_of(input: &str) -> ParseErrorKind {
        parse(input).unwrap_err().kind
    }

    #[test]
    fn test_minimal_rule() {
        let r = parse("FREQ=DAILY").unwrap();
        assert_eq!(r.freq(), Frequency::Daily);
        assert_eq!(r.interval(), 1);
        assert!(r.is_infinite());
    }

    #[test]
    fn test_all_parts() {
        let r = parse(
            "FREQ=YEARLY;INTERVAL=2;COUNT=10;BYMONTH=1,2;BYWEEKNO=20;BYYEARDAY=-1;\
             BYMONTHDAY=1;BYDAY=MO;BYHOUR=9;BYMINUTE=30;BYSECOND=0;BYSETPOS=1;WKST=SU",
        )
        .unwrap();
        assert_eq!(r.interval(), 2);
        assert_eq!(r.count(), Some(10));
        assert_eq!(r.by_month(), &[1, 2]);
        assert_eq!(r.by_week_no(), &[20]);
        assert_eq!(r.by_year_day(), &[-1]);
        assert_eq!(r.by_day(), &[WeekdayNum::every(Weekday::Monday)]);
        assert_eq!(r.by_hour(), &[9]);
        assert_eq!(r.by_set_pos(), &[1]);
        assert_eq!(r.week_start(), Weekday::Sunday);
    }

    #[test]
    fn test_names_and_values_are_case_insensitive() {
        let r = parse("freq=weekly;byday=mo,tu;wkst=su").unwrap();
        assert_eq!(r.freq(), Frequency::Weekly);
        assert_eq!(r.by_day().len(), 2);
    }

    #[test]
    fn test_lists_are_sorted_and_deduplicated() {
        let r = parse("FREQ=MONTHLY;BYMONTHDAY=15,1,15,-1").unwrap();
        assert_eq!(r.by_month_day(), &[-1, 1, 15]);
        assert_eq!(r, parse("FREQ=MONTHLY;BYMONTHDAY=-1,1,15").unwrap());
    }

    #[test]
    fn test_numbered_days() {
        let r = parse("FREQ=MONTHLY;BYDAY=1SU,-1SU,+2MO").unwrap();
        assert!(r.by_day().contains(&WeekdayNum::nth(1, Weekday::Sunday).unwrap()));
        assert!(r.by_day().contains(&WeekdayNum::nth(-1, Weekday::Sunday).unwrap()));
        assert!(r.by_day().contains(&WeekdayNum::nth(2, Weekday::Monday).unwrap()));
    }

    #[test]
    fn test_until_shapes() {
        let r = parse("FREQ=DAILY;UNTIL=19971224T000000Z").unwrap();
        assert_eq!(r.until(), Some(&Instant::parse("19971224T000000Z").unwrap()));
        let r = parse("FREQ=DAILY;UNTIL=19971224").unwrap();
        assert_eq!(r.until(), Some(&Instant::Date(date(1997, 12, 24))));
    }

    #[test]
    fn test_trailing_semicolon_is_accepted() {
        assert!(parse("FREQ=DAILY;COUNT=2;").is_ok());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(kind_of(""), ParseErrorKind::MissingFreq);
        assert_eq!(kind_of("COUNT=3"), ParseErrorKind::MissingFreq);
        assert_eq!(kind_of("FREQ=DAILY;BYFOO=1"), ParseErrorKind::UnknownPart);
        assert_eq!(kind_of("FREQ=DAILY;FREQ=WEEKLY"), ParseErrorKind::DuplicatePart);
        assert_eq!(kind_of("FREQ=FORTNIGHTLY"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;COUNT=x"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;UNTIL=1997"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;BYDAY=XX"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;BYHOUR=-1"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;BYHOUR=24"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=MONTHLY;BYMONTHDAY=0"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=MONTHLY;BYMONTHDAY=32"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=YEARLY;BYYEARDAY=367"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=DAILY;INTERVAL=0"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=MONTHLY;BYDAY=0MO"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=MONTHLY;BYDAY=54MO"), ParseErrorKind::OutOfRange);
        assert_eq!(kind_of("FREQ=MONTHLY;BYWEEKNO=1"), ParseErrorKind::IncompatibleParts);
        assert_eq!(kind_of("FREQ=WEEKLY;BYMONTHDAY=1"), ParseErrorKind::IncompatibleParts);
        assert_eq!(kind_of("FREQ=DAILY;BYYEARDAY=1"), ParseErrorKind::IncompatibleParts);
        assert_eq!(kind_of("FREQ=DAILY;BYSETPOS=1"), ParseErrorKind::IncompatibleParts);
        assert_eq!(
            kind_of("FREQ=DAILY;COUNT=3;UNTIL=20200101"),
            ParseErrorKind::CountAndUntil
        );
        assert_eq!(kind_of("FREQ=WEEKLY;BYDAY=1MO"), ParseErrorKind::OrdinalNotAllowed);
        assert_eq!(
            kind_of("FREQ=YEARLY;BYWEEKNO=1;BYDAY=1MO"),
            ParseErrorKind::OrdinalNotAllowed
        );
        assert_eq!(kind_of("FREQ=DAILY;BYDAY="), ParseErrorKind::EmptyList);
        assert_eq!(kind_of("FREQ=DAILY;BYMONTH=1,,2"), ParseErrorKind::EmptyList);
        assert_eq!(kind_of("FREQ=DAILY; COUNT=1"), ParseErrorKind::MalformedValue);
    }

    #[test]
    fn test_error_spans_point_at_the_problem() {
        let input = "FREQ=DAILY;BYFOO=1";
        let err = parse(input).unwrap_err();
        assert_eq!(&input[err.span.start..err.span.end], "BYFOO=1");

        let input = "FREQ=DAILY;BYHOUR=9,24";
        let err = parse(input).unwrap_err();
        assert_eq!(&input[err.span.start..err.span.end], "24");

        let input = "FREQ=DAILY;BYMONTH=1,,2";
        let err = parse(input).unwrap_err();
        assert_eq!(err.span, Span::new(21, 21));
    }

    #[test]
    fn test_lax_drops_bad_items() {
        let opts = ParseOptions::lax();
        let r = parse_with("FREQ=DAILY;BYHOUR=9,24,x;BYFOO=1;BYMONTH=1,,2", &opts).unwrap();
        assert_eq!(r.by_hour(), &[9]);
        assert_eq!(r.by_month(), &[1, 2]);
    }

    #[test]
    fn test_lax_keeps_until_over_count() {
        let r = parse_with("FREQ=DAILY;COUNT=3;UNTIL=20200101", &ParseOptions::lax()).unwrap();
        assert_eq!(r.count(), None);
        assert!(r.until().is_some());
    }

    #[test]
    fn test_lax_drops_incompatible_parts() {
        let r = parse_with("FREQ=WEEKLY;BYMONTHDAY=1;BYDAY=2MO,TU", &ParseOptions::lax()).unwrap();
        assert!(r.by_month_day().is_empty());
        assert_eq!(r.by_day(), &[WeekdayNum::every(Weekday::Tuesday)]);
    }

    #[test]
    fn test_lax_still_needs_freq() {
        let err = parse_with("FREQ=NEVER;COUNT=1", &ParseOptions::lax()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingFreq);
    }

    #[test]
    fn test_lax_keeps_structural_errors() {
        let lax = ParseOptions::lax();
        let err = parse_with("FREQ=DAILY;COUNT=2;COUNT=5", &lax).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicatePart);
        assert_eq!(err.span, Span::new(19, 26));
        let err = parse_with("FREQ=DAILY;;COUNT=2", &lax).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedValue);
        assert!(parse_with("FREQ=DAILY;COUNT=2;", &lax).is_ok());
    }

    #[test]
    fn test_rfc2445_compat() {
        let opts = ParseOptions::rfc2445();
        let r = parse_with("FREQ=MONTHLY;BYWEEKNO=1;X-NAME=foo", &opts).unwrap();
        assert_eq!(r.by_week_no(), &[1]);
        // Everything else stays strict.
        assert_eq!(
            parse_with("FREQ=MONTHLY;BYFOO=1", &opts).unwrap_err().kind,
            ParseErrorKind::UnknownPart
        );
    }

    #[test]
    fn test_by_set_pos_alone_when_allowed() {
        let opts = ParseOptions {
            allow_by_set_pos_alone: true,
            ..ParseOptions::default()
        };
        let r = parse_with("FREQ=MONTHLY;BYSETPOS=1", &opts).unwrap();
        assert_eq!(r.by_set_pos(), &[1]);
    }

    #[test]
    fn test_single_value_parts() {
        assert_eq!(kind_of("FREQ=DAILY,WEEKLY"), ParseErrorKind::MalformedValue);
        assert_eq!(kind_of("FREQ=DAILY;COUNT=1,2"), ParseErrorKind::MalformedValue);
    }
}
