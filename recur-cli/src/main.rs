use clap::Parser;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use recur::{Instant, IterOptions, MatchOptions, ParseOptions, RecurError, Rule, TzdbZones};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recur", about = "Expand RFC 5545 recurrence rules", version)]
struct Cli {
    /// Recurrence rule (e.g., "FREQ=WEEKLY;BYDAY=MO,WE,FR;COUNT=10")
    rule: Option<String>,

    /// Start value: YYYYMMDD, YYYYMMDDTHHMMSS or YYYYMMDDTHHMMSSZ. Defaults
    /// to the current time in UTC.
    #[arg(short, long)]
    start: Option<String>,

    /// Time zone of the start value (IANA name or offset such as GMT+8)
    #[arg(long)]
    tz: Option<String>,

    /// Number of instances to show
    #[arg(short, long, default_value = "10")]
    n: usize,

    /// Skip instances before this value
    #[arg(long)]
    after: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate the rule without expanding it
    #[arg(long)]
    check: bool,

    /// Show the parsed rule as JSON
    #[arg(long)]
    parse: bool,

    /// Check whether the rule occurs on a date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    matches: Option<String>,

    /// Drop invalid parts with a warning instead of failing
    #[arg(long)]
    lax: bool,

    /// Accept RFC 2445 rules
    #[arg(long)]
    rfc2445: bool,

    /// Emit the start value first even when it does not match the rule
    #[arg(long)]
    sync_start: bool,
}

/// Compact stderr-only tracing; `RUST_LOG` overrides the `warn` default.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn fail(e: impl Into<RecurError>) -> ! {
    eprintln!("{}", e.into().display_rich());
    process::exit(1);
}

fn parse_value(text: &str, tz: Option<&str>) -> Result<Instant, RecurError> {
    match tz {
        Some(tz) => Instant::parse_in(text, tz, &TzdbZones),
        None => Ok(Instant::parse(text)?),
    }
}

fn now() -> Result<Instant, RecurError> {
    jiff::Zoned::now()
        .with_time_zone(TimeZone::UTC)
        .round(jiff::Unit::Second)
        .map(Instant::Zoned)
        .map_err(|e| RecurError::Calendar(recur::CalendarError::OutOfRange(e.to_string())))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let text = match cli.rule {
        Some(ref rule) => rule.as_str(),
        None => {
            eprintln!("error: no rule provided");
            process::exit(2);
        }
    };

    let options = ParseOptions {
        strict: !cli.lax,
        rfc2445_compat: cli.rfc2445,
        ..ParseOptions::default()
    };
    let rule = Rule::parse_with(text, &options).unwrap_or_else(|e| fail(e));
    debug!(%rule, strict = options.strict, rfc2445 = options.rfc2445_compat, "parsed rule");

    if cli.check {
        println!("\u{2713} valid: {rule}");
        process::exit(0);
    }

    if cli.parse {
        match serde_json::to_string_pretty(&rule) {
            Ok(json) => {
                println!("{json}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    }

    let start = match cli.start {
        Some(ref s) => parse_value(s, cli.tz.as_deref()),
        None => now(),
    }
    .unwrap_or_else(|e| fail(e));

    if let Some(ref day) = cli.matches {
        let day: Date = match day.parse() {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: invalid --matches date: {e}");
                process::exit(1);
            }
        };
        let options = MatchOptions {
            parse: options,
            ..MatchOptions::default()
        };
        let hit = recur::membership::matches_with(text, &start, day, &options)
            .unwrap_or_else(|e| fail(e));
        println!("{hit}");
        process::exit(0);
    }

    let mut n = cli.n;
    if n > 1000 {
        eprintln!("warning: capped at 1000 instances");
        n = 1000;
    }

    let iter_options = IterOptions {
        synchronize_start: cli.sync_start,
        ..IterOptions::default()
    };
    debug!(%start, n, sync_start = cli.sync_start, "expanding");
    let mut it = rule.iter_with(&start, &iter_options).unwrap_or_else(|e| fail(e));
    if let Some(ref after) = cli.after {
        let after = parse_value(after, cli.tz.as_deref()).unwrap_or_else(|e| fail(e));
        it.fast_forward(&after).unwrap_or_else(|e| fail(e));
    }
    let results: Vec<Instant> = it.take(n).collect();

    if results.is_empty() {
        eprintln!("no instances");
        process::exit(0);
    }

    if cli.json {
        match serde_json::to_string(&results) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    } else {
        for instance in &results {
            println!("{instance}");
        }
    }
}
