use std::fmt;

/// Byte range within the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Machine-readable reason a rule (or a date-time literal) was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// No `FREQ` part.
    MissingFreq,
    /// A part name that is not part of the RECUR grammar.
    UnknownPart,
    /// The same part appears twice.
    DuplicatePart,
    /// Malformed integer, weekday, date or date-time, or broken structure.
    MalformedValue,
    /// A well-formed number outside the range allowed for its part.
    OutOfRange,
    /// A BY-part that cannot be combined with the frequency or other parts.
    IncompatibleParts,
    /// Both `COUNT` and `UNTIL`.
    CountAndUntil,
    /// A numbered `BYDAY` entry where only plain weekdays are allowed.
    OrdinalNotAllowed,
    /// A value list with an empty element (`BYDAY=` or `BYMONTH=1,,2`).
    EmptyList,
}

impl ParseErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFreq => "missing-freq",
            Self::UnknownPart => "unknown-part",
            Self::DuplicatePart => "duplicate-part",
            Self::MalformedValue => "malformed-value",
            Self::OutOfRange => "out-of-range",
            Self::IncompatibleParts => "incompatible-parts",
            Self::CountAndUntil => "count-and-until",
            Self::OrdinalNotAllowed => "ordinal-not-allowed",
            Self::EmptyList => "empty-list",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected rule or literal, with the offending byte range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
    pub input: String,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        span: Span,
        input: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            input: input.into(),
        }
    }

    /// Format a rich error with the offending span underlined.
    pub fn display_rich(&self) -> String {
        let mut out = format!("error[{}]: {}\n", self.kind, self.message);
        out.push_str(&format!("  {}\n", self.input));
        let start = self.span.start.min(self.input.len());
        let end = self.span.end.clamp(start, self.input.len());
        out.push_str(&" ".repeat(start + 2));
        out.push_str(&"^".repeat((end - start).max(1)));
        out
    }
}

/// Failures of the calendar primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The civil time does not exist in the zone (it falls into a DST gap).
    #[error("local time {datetime} does not exist in time zone {zone}")]
    AmbiguousLocalTime { datetime: String, zone: String },

    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),

    #[error("date arithmetic out of range: {0}")]
    OutOfRange(String),
}

/// All errors produced by recur.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum RecurError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The recurrence has no further instances. This is the normal end of a
    /// finite rule, not a failure.
    #[error("recurrence exhausted")]
    Exhausted,

    /// The caller-supplied instance limit was hit before the rule ended.
    #[error("safety bound of {limit} instances reached")]
    SafetyBoundReached { limit: usize },
}

impl RecurError {
    /// The parse error kind, if this is a parse error.
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match self {
            Self::Parse(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Rich, multi-line rendering for terminals.
    pub fn display_rich(&self) -> String {
        match self {
            Self::Parse(e) => e.display_rich(),
            other => format!("error: {other}"),
        }
    }
}
